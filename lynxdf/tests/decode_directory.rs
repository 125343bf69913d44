mod helpers;

use std::fs;

use helpers::{function_record, packed6, packed8, scratch_dir, write_function};
use lynxcore::data::metadata::{keys, MetadataValue};
use lynxcore::data::spectrum::DetectorKind;
use lynxdf::data::config::DecodeConfig;
use lynxdf::data::dataset::WatersDataset;
use lynxdf::data::error::RawDataError;
use lynxdf::data::handle::{MassLynxData, WatersRawDataHandle};

const HEADER: &str = "$$ Acquired Date: 01-Feb-2022\n\
$$ Acquired Time: 09:30:00\n\
$$ Bottle Number: 2:B,1\n\
$$ Cal Function 1: 0.25,1.0,T1\n\
$$ Cal Function 2: 0.25,1.0,T1\n";

const EXTERN: &[u8] = b"Instrument Parameters - Function 1:\r\nPolarity\t\t\tES+\r\n";

fn write_common(dir: &std::path::Path, num_functions: u8) {
    let mut directory = Vec::new();
    for id in 1..=num_functions {
        directory.extend(function_record(id, 2, &[]));
    }
    fs::write(dir.join("_FUNCTNS.INF"), directory).unwrap();
    fs::write(dir.join("_HEADER.TXT"), HEADER).unwrap();
    fs::write(dir.join("_extern.inf"), EXTERN).unwrap();
}

#[test]
fn test_decode_full_directory() {
    let dir = scratch_dir("full");
    write_common(&dir, 2);
    write_function(
        &dir,
        1,
        8,
        &[
            (0.1, vec![packed8(100, 0, 12, 10), packed8(200, 0, 12, 20)]),
            (0.2, vec![packed8(100, 0, 12, 5), packed8(150, 0, 12, 7)]),
        ],
    );
    write_function(
        &dir,
        2,
        6,
        &[(0.1, vec![packed6(300, 1), packed6(301, 2)]), (0.2, vec![])],
    );

    let mut analog_info = vec![0u8; 0x84];
    let mut entry = b"$CC$Pressure(1),a,b,c,d,psi".to_vec();
    entry.resize(0x55, 0);
    analog_info.extend(entry);
    fs::write(dir.join("_CHROMS.INF"), analog_info).unwrap();
    let mut analog = vec![0u8; 0x80];
    for (time, value) in [(0.0f32, 10.0f32), (0.5, 12.0)] {
        analog.extend_from_slice(&time.to_le_bytes());
        analog.extend_from_slice(&value.to_le_bytes());
    }
    fs::write(dir.join("_CHRO001.DAT"), analog).unwrap();

    let dataset = WatersDataset::new(&dir).unwrap();
    assert_eq!(dataset.get_function_count(), 2);
    let content = dataset.read_all(&DecodeConfig::default()).unwrap();

    assert_eq!(content.metadata.get(keys::VENDOR), Some(&MetadataValue::from("Waters")));
    assert_eq!(
        content.metadata.get(keys::DATE),
        Some(&MetadataValue::from("01-Feb-2022 09:30:00"))
    );

    assert_eq!(content.spectra.len(), 2);
    let first = &content.spectra[0];
    assert_eq!(first.name, "_FUNC001.DAT");
    assert_eq!(first.detector, DetectorKind::MS);
    assert_eq!(first.polarity(), Some('+'));
    assert_eq!(first.times, vec![0.1, 0.2]);
    assert_eq!(first.keys, vec![100.0, 150.0, 200.0]);
    assert_eq!(first.scan(0), vec![(100.0, 10.0), (200.0, 20.0)]);
    assert_eq!(first.scan(1), vec![(100.0, 5.0), (150.0, 7.0)]);

    // no polarity, so the header calibration is not applied
    let second = &content.spectra[1];
    assert_eq!(second.detector, DetectorKind::UV);
    assert_eq!(second.polarity(), None);
    assert_eq!(second.keys, vec![300.0, 301.0]);
    assert_eq!(second.total_ion_chromatogram(), vec![3.0, 0.0]);

    assert_eq!(content.analog.len(), 1);
    assert_eq!(content.analog[0].signal(), Some("Pressure"));
    assert_eq!(content.analog[0].unit(), Some("psi"));
    assert_eq!(content.analog[0].values, vec![10.0, 12.0]);

    assert_eq!(content.summary().len(), 3);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_precision_keeps_decimals() {
    let dir = scratch_dir("precision");
    write_common(&dir, 1);
    // 12 integer bits leave 19 fraction bits: 100 + 2^17 / 2^19 = 100.25, calibrated to 100.5
    write_function(&dir, 1, 8, &[(0.1, vec![packed8(100, 1 << 17, 12, 3)])]);

    let handle = WatersRawDataHandle::new(&dir).unwrap();
    let rounded = handle.read_function(1, &DecodeConfig::new(0, 1)).unwrap();
    assert_eq!(rounded.keys, vec![100.0]);
    let precise = handle.read_function(1, &DecodeConfig::new(2, 1)).unwrap();
    assert_eq!(precise.keys, vec![100.5]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_two_byte_function_uses_q1_keys() {
    let dir = scratch_dir("packed2");
    let q1: Vec<f32> = vec![210.5, 180.25, 300.0];
    fs::write(dir.join("_FUNCTNS.INF"), function_record(1, 2, &q1)).unwrap();
    let word = |base: u16, power: u16| ((base << 3) | power).to_le_bytes().to_vec();
    write_function(
        &dir,
        1,
        2,
        &[
            (1.0, vec![word(1, 0), word(2, 1), word(3, 2)]),
            (2.0, vec![word(4, 0), word(5, 0), word(6, 0)]),
        ],
    );

    let handle = WatersRawDataHandle::new(&dir).unwrap();
    let spectra = handle.read_spectra(&DecodeConfig::default()).unwrap();
    assert_eq!(spectra.len(), 1);
    assert_eq!(spectra[0].detector, DetectorKind::UV);
    assert_eq!(spectra[0].keys, vec![210.5, 180.25, 300.0]);
    assert_eq!(spectra[0].scan(0), vec![(210.5, 1.0), (180.25, 8.0), (300.0, 48.0)]);
    assert_eq!(spectra[0].total_intensity(), 1.0 + 8.0 + 48.0 + 15.0);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unsupported_width_aborts() {
    let dir = scratch_dir("width");
    write_common(&dir, 1);
    write_function(&dir, 1, 5, &[(0.1, vec![vec![0u8; 5], vec![0u8; 5]])]);

    let handle = WatersRawDataHandle::new(&dir).unwrap();
    let result = handle.read_spectra(&DecodeConfig::default());
    assert!(matches!(result, Err(RawDataError::UnsupportedFormat { width: 5, .. })));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_function_directory() {
    let dir = scratch_dir("nodirectory");
    write_function(&dir, 1, 6, &[(0.1, vec![packed6(100, 1)])]);
    let result = WatersRawDataHandle::new(&dir);
    assert!(matches!(result, Err(RawDataError::MissingFile { .. })));
    fs::remove_dir_all(&dir).unwrap();
}
