use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use lynxcore::algorithm::calibration::CalibrationPolynomial;
use lynxcore::data::chromatogram::AnalogTrace;
use lynxcore::data::matrix::{Matrix, ValueMatrix};
use lynxcore::data::metadata::{keys, Metadata, MetadataValue};
use lynxcore::data::spectrum::{DetectorKind, SpectrumMatrix};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use regex::Regex;

use crate::data::analog::read_analog;
use crate::data::config::DecodeConfig;
use crate::data::error::{read_file, RawDataError, Result};
use crate::data::function_info::{read_function_directory, FunctionInfo};
use crate::data::meta::{function_meta, read_header, read_polarities, FunctionMeta, HeaderInfo};
use crate::data::record::{decode_records, DecodeContext, DecodedRecords, RecordLayout};
use crate::data::scan_index::parse_scan_index;

pub const FUNCTION_DIRECTORY: &str = "_FUNCTNS.INF";
pub const HEADER_FILE: &str = "_HEADER.TXT";
pub const EXTERN_FILE: &str = "_extern.inf";

/// Payload file name of function `number` (1-based).
pub fn function_data_name(number: u32) -> String {
    format!("_FUNC{:03}.DAT", number)
}

/// Index file name of function `number` (1-based).
pub fn function_index_name(number: u32) -> String {
    format!("_FUNC{:03}.IDX", number)
}

/// Function numbers of all `_FUNCnnn.DAT` files in `dir`, ascending.
pub fn list_function_numbers(dir: &Path) -> Result<Vec<u32>> {
    let pattern = Regex::new(r"^_FUNC([0-9]{3})\.DAT$").expect("static pattern is valid");
    let entries = std::fs::read_dir(dir).map_err(|e| RawDataError::io(dir, e))?;

    let mut numbers = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RawDataError::io(dir, e))?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if let Some(number) = pattern
            .captures(&file_name)
            .and_then(|c| c[1].parse::<u32>().ok())
        {
            numbers.push(number);
        }
    }
    numbers.sort_unstable();
    Ok(numbers)
}

/// Assembles the spectrum of one function from its in-memory files.
///
/// # Arguments
///
/// * `name` - name given to the result, usually the payload file name
/// * `payload` - content of `_FUNCnnn.DAT`
/// * `index` - content of `_FUNCnnn.IDX`
/// * `function` - the function's record from `_FUNCTNS.INF`, if any
/// * `meta` - external polarity and calibration
/// * `precision` - decimal digits kept when rounding keys
/// * `payload_path` - payload path used for error reporting
/// * `index_path` - index path used for error reporting
///
#[allow(clippy::too_many_arguments)]
pub fn assemble_function(
    name: &str,
    payload: &[u8],
    index: &[u8],
    function: Option<&FunctionInfo>,
    meta: &FunctionMeta,
    precision: i32,
    payload_path: &Path,
    index_path: &Path,
) -> Result<SpectrumMatrix> {
    let scan_index = parse_scan_index(index, index_path)?;
    let times = scan_index.times();
    let counts = scan_index.counts();

    let decoded = match scan_index.record_width(payload.len() as u64, payload_path)? {
        Some(width) => {
            let layout = RecordLayout::from_width(width, payload_path)?;
            debug!("{}: {} scans of {}", name, counts.len(), layout);
            let context = DecodeContext {
                function,
                calibration: meta.calibration.as_ref(),
                precision,
            };
            decode_records(layout, payload, &counts, &context, payload_path)?
        }
        None => {
            debug!("{}: no scan carries records", name);
            DecodedRecords {
                keys: Vec::new(),
                values: ValueMatrix::Integer(Matrix::zeros(counts.len(), 0)),
            }
        }
    };

    let calibrated = meta.calibration.as_ref().is_some_and(|c| !c.is_empty());
    let mut metadata = Metadata::new();
    if let Some(polarity) = meta.polarity {
        metadata.insert(keys::POLARITY.to_string(), MetadataValue::Char(polarity));
    }

    Ok(SpectrumMatrix::new(
        name.to_string(),
        DetectorKind::for_function(calibrated),
        times,
        decoded.keys,
        decoded.values,
        metadata,
    ))
}

/// Everything known about a raw directory before any payload is decoded.
#[derive(Debug, Clone)]
pub struct WatersRawLayout {
    pub raw_data_path: PathBuf,
    pub function_numbers: Vec<u32>,
    pub functions: Vec<FunctionInfo>,
    pub header: HeaderInfo,
    pub polarities: BTreeMap<u32, char>,
    pub has_extern_info: bool,
}

impl WatersRawLayout {
    pub fn new(data_path: &Path) -> Result<Self> {
        if !data_path.is_dir() {
            return Err(RawDataError::MissingFile {
                path: data_path.to_path_buf(),
            });
        }

        let function_numbers = list_function_numbers(data_path)?;

        let functions = if function_numbers.is_empty() {
            Vec::new()
        } else {
            read_function_directory(&data_path.join(FUNCTION_DIRECTORY))?
        };

        let header_path = data_path.join(HEADER_FILE);
        let header = if header_path.exists() {
            read_header(&header_path)?
        } else {
            HeaderInfo::default()
        };

        let extern_path = data_path.join(EXTERN_FILE);
        let has_extern_info = extern_path.exists();
        let polarities = if has_extern_info {
            read_polarities(&extern_path)?
        } else {
            BTreeMap::new()
        };

        info!(
            "{}: {} functions, {} directory records, {} polarities",
            data_path.display(),
            function_numbers.len(),
            functions.len(),
            polarities.len()
        );

        Ok(WatersRawLayout {
            raw_data_path: data_path.to_path_buf(),
            function_numbers,
            functions,
            header,
            polarities,
            has_extern_info,
        })
    }

    /// External polarity and calibration of function `number`.
    ///
    /// Header calibrations are only trusted when `_extern.inf` is present.
    pub fn function_meta(&self, number: u32) -> FunctionMeta {
        let calibrations: &[CalibrationPolynomial] = if self.has_extern_info {
            &self.header.calibrations
        } else {
            &[]
        };
        function_meta(number, &self.polarities, calibrations)
    }

    /// Directory record of function `number`, record `n - 1` belongs to `_FUNCnnn`.
    pub fn function_info(&self, number: u32) -> Option<&FunctionInfo> {
        number
            .checked_sub(1)
            .and_then(|i| self.functions.get(i as usize))
    }
}

/// Access to the decoded content of a raw directory.
pub trait MassLynxData {
    fn read_function(&self, number: u32, config: &DecodeConfig) -> Result<SpectrumMatrix>;
    fn read_spectra(&self, config: &DecodeConfig) -> Result<Vec<SpectrumMatrix>>;
    fn read_analog(&self) -> Result<Vec<AnalogTrace>>;
    fn get_metadata(&self) -> Metadata;
    fn get_function_count(&self) -> usize;
    fn get_data_path(&self) -> &Path;
}

/// Reads the files of a MassLynx `.raw` directory.
pub struct WatersRawDataHandle {
    pub raw_data_layout: WatersRawLayout,
}

impl WatersRawDataHandle {
    pub fn new(data_path: &Path) -> Result<Self> {
        Ok(WatersRawDataHandle {
            raw_data_layout: WatersRawLayout::new(data_path)?,
        })
    }
}

impl MassLynxData for WatersRawDataHandle {
    fn read_function(&self, number: u32, config: &DecodeConfig) -> Result<SpectrumMatrix> {
        let layout = &self.raw_data_layout;
        let name = function_data_name(number);
        let payload_path = layout.raw_data_path.join(&name);
        let index_path = layout.raw_data_path.join(function_index_name(number));

        let payload = read_file(&payload_path)?;
        let index = read_file(&index_path)?;

        assemble_function(
            &name,
            &payload,
            &index,
            layout.function_info(number),
            &layout.function_meta(number),
            config.precision,
            &payload_path,
            &index_path,
        )
    }

    /// Decodes every function in parallel; the first failure aborts the call.
    fn read_spectra(&self, config: &DecodeConfig) -> Result<Vec<SpectrumMatrix>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()?;

        pool.install(|| {
            self.raw_data_layout
                .function_numbers
                .par_iter()
                .map(|&number| self.read_function(number, config))
                .collect()
        })
    }

    fn read_analog(&self) -> Result<Vec<AnalogTrace>> {
        read_analog(&self.raw_data_layout.raw_data_path)
    }

    fn get_metadata(&self) -> Metadata {
        self.raw_data_layout.header.metadata.clone()
    }

    fn get_function_count(&self) -> usize {
        self.raw_data_layout.function_numbers.len()
    }

    fn get_data_path(&self) -> &Path {
        &self.raw_data_layout.raw_data_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::function_info::TABLE_LEN;
    use crate::data::record::tests::{encode_packed6, encode_packed8};
    use crate::data::scan_index::tests::encode_scan_record;

    fn packed6_function() -> (Vec<u8>, Vec<u8>) {
        let mut payload = Vec::new();
        payload.extend(encode_packed6(100, 23, 5, 0));
        payload.extend(encode_packed6(200, 23, 3, 0));
        payload.extend(encode_packed6(100, 23, 1, 1));
        let mut index = encode_scan_record(0, 2, 0.25);
        index.extend(encode_scan_record(12, 1, 0.5));
        (payload, index)
    }

    fn assemble(payload: &[u8], index: &[u8], meta: &FunctionMeta) -> Result<SpectrumMatrix> {
        assemble_function(
            "_FUNC001.DAT",
            payload,
            index,
            None,
            meta,
            0,
            Path::new("_FUNC001.DAT"),
            Path::new("_FUNC001.IDX"),
        )
    }

    #[test]
    fn test_file_names() {
        assert_eq!(function_data_name(1), "_FUNC001.DAT");
        assert_eq!(function_index_name(12), "_FUNC012.IDX");
    }

    #[test]
    fn test_assemble_uncalibrated_is_uv() {
        let (payload, index) = packed6_function();
        let spectrum = assemble(&payload, &index, &FunctionMeta::default()).unwrap();
        assert_eq!(spectrum.detector, DetectorKind::UV);
        assert_eq!(spectrum.times, vec![0.25, 0.5]);
        assert_eq!(spectrum.keys, vec![100.0, 200.0]);
        assert_eq!(spectrum.values.get_f64(0, 0), 5.0);
        assert_eq!(spectrum.values.get_f64(0, 1), 3.0);
        assert_eq!(spectrum.values.get_f64(1, 0), 4.0);
        assert!(spectrum.metadata.is_empty());
    }

    #[test]
    fn test_assemble_calibrated_is_ms_with_polarity() {
        let (payload, index) = packed6_function();
        let meta = FunctionMeta {
            polarity: Some('+'),
            calibration: Some(CalibrationPolynomial::new(vec![1.0, 1.0])),
        };
        let spectrum = assemble(&payload, &index, &meta).unwrap();
        assert_eq!(spectrum.detector, DetectorKind::MS);
        assert_eq!(spectrum.keys, vec![101.0, 201.0]);
        assert_eq!(spectrum.polarity(), Some('+'));
    }

    #[test]
    fn test_assemble_conserves_intensity() {
        let mut payload = Vec::new();
        let mut index = Vec::new();
        let mut raw_total = 0.0;
        let mut offset = 0u32;
        for scan in 0..5u64 {
            for peak in 0..4u64 {
                let value = scan * 10 + peak + 1;
                raw_total += value as f64;
                payload.extend(encode_packed8(100 + 7 * peak + scan, 12, value));
            }
            index.extend(encode_scan_record(offset, 4, scan as f32));
            offset += 32;
        }
        let spectrum = assemble(&payload, &index, &FunctionMeta::default()).unwrap();
        assert!(spectrum.has_strictly_ascending_keys());
        assert_eq!(spectrum.total_intensity(), raw_total);
    }

    #[test]
    fn test_assemble_unsupported_width() {
        let mut index = encode_scan_record(0, 2, 0.25);
        index.extend(encode_scan_record(10, 2, 0.5));
        let payload = vec![0u8; 20];
        let result = assemble(&payload, &index, &FunctionMeta::default());
        assert!(matches!(result, Err(RawDataError::UnsupportedFormat { width: 5, .. })));
    }

    #[test]
    fn test_assemble_without_records() {
        let index = encode_scan_record(0, 0, 0.25);
        let spectrum = assemble(&[], &index, &FunctionMeta::default()).unwrap();
        assert_eq!(spectrum.num_scans(), 1);
        assert_eq!(spectrum.num_keys(), 0);
    }

    #[test]
    fn test_layout_function_info_by_number() {
        let info = FunctionInfo {
            function_id: 1,
            form: 0,
            num_scans: 0,
            q1: [0.0; TABLE_LEN],
            q3: [0.0; TABLE_LEN],
        };
        let layout = WatersRawLayout {
            raw_data_path: PathBuf::from("x.raw"),
            function_numbers: vec![1],
            functions: vec![info.clone()],
            header: HeaderInfo::default(),
            polarities: BTreeMap::new(),
            has_extern_info: false,
        };
        assert_eq!(layout.function_info(1), Some(&info));
        assert_eq!(layout.function_info(0), None);
        assert_eq!(layout.function_info(2), None);
    }
}
