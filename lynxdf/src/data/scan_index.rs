use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::data::error::{RawDataError, Result};

/// Size of one scan record in a `_FUNCnnn.IDX` file.
pub const SCAN_RECORD_LEN: usize = 22;

/// Largest record count a scan can carry (22 bits).
pub const MAX_RECORDS_PER_SCAN: u32 = 0x3F_FFFF;

const PRE_CALIBRATED_FLAG: u32 = 0x4000_0000;

/// Position and size of one scan inside the payload file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanIndexEntry {
    pub offset: u32,
    pub num_records: u32,
    pub time: f32,
}

/// All scan records of one function, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanIndex {
    pub entries: Vec<ScanIndexEntry>,
}

impl ScanIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Acquisition time of every scan.
    pub fn times(&self) -> Vec<f32> {
        self.entries.iter().map(|e| e.time).collect()
    }

    /// Number of key/value records of every scan.
    pub fn counts(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.num_records).collect()
    }

    /// Number of records over all scans.
    pub fn total_records(&self) -> u64 {
        self.entries.iter().map(|e| e.num_records as u64).sum()
    }

    /// Infers the byte width of one payload record.
    ///
    /// The width is taken from the last scan that carries records: the bytes
    /// between its offset and the end of the payload divided by its count.
    ///
    /// # Arguments
    ///
    /// * `payload_len` - size of the matching `_FUNCnnn.DAT` file
    /// * `path` - payload path used for error reporting
    ///
    /// # Returns
    ///
    /// * `None` if no scan carries any record
    ///
    pub fn record_width(&self, payload_len: u64, path: &Path) -> Result<Option<u64>> {
        let last = match self.entries.iter().rev().find(|e| e.num_records != 0) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let offset = last.offset as u64;
        if payload_len < offset {
            return Err(RawDataError::corrupt(
                path,
                format!(
                    "payload of {} bytes ends before the last scan offset {}",
                    payload_len, offset
                ),
            ));
        }
        Ok(Some((payload_len - offset) / last.num_records as u64))
    }
}

/// Parses the scan index of one function.
///
/// # Record layout (little endian, 22 bytes)
///
/// * `u32` byte offset into the payload file
/// * `u32` info word, low 22 bits = record count, bit 30 = pre-calibrated flag
/// * 4 bytes total ion current (unused)
/// * `f32` scan time
/// * 6 reserved bytes
///
pub fn parse_scan_index(bytes: &[u8], path: &Path) -> Result<ScanIndex> {
    if bytes.len() % SCAN_RECORD_LEN != 0 {
        return Err(RawDataError::corrupt(
            path,
            format!(
                "size {} is not a multiple of the {}-byte scan record",
                bytes.len(),
                SCAN_RECORD_LEN
            ),
        ));
    }

    let num_scans = bytes.len() / SCAN_RECORD_LEN;
    let mut cursor = Cursor::new(bytes);
    let mut entries = Vec::with_capacity(num_scans);
    let io_err = |e| RawDataError::io(path, e);

    for scan in 0..num_scans {
        let offset = cursor.read_u32::<LittleEndian>().map_err(io_err)?;
        let info = cursor.read_u32::<LittleEndian>().map_err(io_err)?;
        if info & PRE_CALIBRATED_FLAG != 0 {
            return Err(RawDataError::UnsupportedEncoding {
                path: path.to_path_buf(),
                scan,
            });
        }
        cursor.seek(SeekFrom::Current(4)).map_err(io_err)?;
        let time = cursor.read_f32::<LittleEndian>().map_err(io_err)?;
        cursor.seek(SeekFrom::Current(6)).map_err(io_err)?;

        entries.push(ScanIndexEntry {
            offset,
            num_records: info & MAX_RECORDS_PER_SCAN,
            time,
        });
    }

    if cursor.position() as usize != bytes.len() {
        return Err(RawDataError::corrupt(path, "read cursor did not land on end of file"));
    }

    Ok(ScanIndex { entries })
}
