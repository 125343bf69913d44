// tests/helpers/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lynxdf-{}-{}.raw", name, std::process::id()));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// One 424-byte `_FUNCTNS.INF` record.
pub fn function_record(function_id: u8, num_scans: u32, q1: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(function_id as u16 & 0x1F).to_le_bytes());
    bytes.extend_from_slice(&[0u8; 16]);
    bytes.extend_from_slice(&num_scans.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 10 + 128]);
    for i in 0..32 {
        bytes.extend_from_slice(&q1.get(i).copied().unwrap_or(0.0).to_le_bytes());
    }
    bytes.extend_from_slice(&[0u8; 136]);
    bytes
}

/// One 22-byte scan index record.
pub fn scan_record(offset: u32, count: u32, time: f32) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&offset.to_le_bytes());
    bytes.extend_from_slice(&count.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&time.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 6]);
    bytes
}

/// 6-byte record with an integer key (power field 23) and a plain value.
pub fn packed6(key: u64, value: i16) -> Vec<u8> {
    let raw = (key << 25) | (23 << 20) | (value as u16 as u64);
    raw.to_le_bytes()[..6].to_vec()
}

/// 8-byte record with key `int + frac / 2^frac_bits` and an integer value.
pub fn packed8(key_int: u64, key_frac: u64, int_bits: u64, value: u64) -> Vec<u8> {
    let frac_bits = 31 - int_bits;
    let key_bits = (int_bits << 31) | (key_int << frac_bits) | key_frac;
    let value_bits = (21u64 << 22) | value;
    ((key_bits << 28) | value_bits).to_le_bytes().to_vec()
}

/// Writes a function's payload and index, one `Vec` of records per scan.
pub fn write_function(dir: &Path, number: u32, width: usize, scans: &[(f32, Vec<Vec<u8>>)]) {
    let mut payload = Vec::new();
    let mut index = Vec::new();
    for (time, records) in scans {
        index.extend(scan_record(payload.len() as u32, records.len() as u32, *time));
        for record in records {
            assert_eq!(record.len(), width);
            payload.extend_from_slice(record);
        }
    }
    fs::write(dir.join(format!("_FUNC{:03}.DAT", number)), payload).unwrap();
    fs::write(dir.join(format!("_FUNC{:03}.IDX", number)), index).unwrap();
}
