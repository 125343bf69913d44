use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, warn};
use lynxcore::algorithm::calibration::CalibrationPolynomial;
use lynxcore::data::metadata::{keys, Metadata, MetadataValue};

use crate::data::error::{read_file, Result};

pub const VENDOR: &str = "Waters";

const ACQUIRED_DATE: &str = "$$ Acquired Date";
const ACQUIRED_TIME: &str = "$$ Acquired Time";
const BOTTLE_NUMBER: &str = "$$ Bottle Number";
const CAL_FUNCTION: &str = "$$ Cal Function";
const INSTRUMENT_PARAMETERS: &str = "Instrument Parameters";
const POLARITY: &str = "Polarity";

/// Content of `_HEADER.TXT` that the decoder cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderInfo {
    pub metadata: Metadata,
    pub calibrations: Vec<CalibrationPolynomial>,
}

/// Value part of a `$$ Key: value` header line.
fn header_value(line: &str) -> Option<&str> {
    line.split(": ").nth(1)
}

/// Parses the text of `_HEADER.TXT`.
///
/// Unknown or malformed lines are skipped.
pub fn parse_header(text: &str) -> HeaderInfo {
    let mut metadata = Metadata::new();
    metadata.insert(keys::VENDOR.to_string(), MetadataValue::from(VENDOR));

    let mut date: Option<String> = None;
    let mut time: Option<String> = None;
    let mut vial_position: Option<String> = None;
    let mut calibrations = Vec::new();

    for line in text.lines() {
        let value = match header_value(line) {
            Some(value) => value,
            None => continue,
        };
        let present = !value.trim().is_empty();

        if line.starts_with(ACQUIRED_DATE) && present {
            date = Some(value.to_string());
        } else if line.starts_with(ACQUIRED_TIME) && present {
            time = Some(value.to_string());
        } else if line.starts_with(BOTTLE_NUMBER) && present {
            vial_position = Some(value.to_string());
        } else if line.starts_with(CAL_FUNCTION) {
            match parse_calibration(value) {
                Some(calibration) => calibrations.push(calibration),
                None => warn!("skipping malformed calibration line: {}", line),
            }
        }
    }

    let date = match (date, time) {
        (Some(date), Some(time)) => Some(format!("{} {}", date, time)),
        (Some(date), None) => Some(date),
        (None, Some(time)) => Some(time),
        (None, None) => None,
    };
    if let Some(date) = date {
        metadata.insert(keys::DATE.to_string(), MetadataValue::from(date));
    }
    if let Some(vial_position) = vial_position {
        metadata.insert(keys::VIAL_POSITION.to_string(), MetadataValue::from(vial_position));
    }

    HeaderInfo {
        metadata,
        calibrations,
    }
}

/// Parses `c0,c1,...,cn,tag`; the trailing field is not a coefficient.
fn parse_calibration(value: &str) -> Option<CalibrationPolynomial> {
    let fields: Vec<&str> = value.split(',').collect();
    let (_, coefficients) = fields.split_last()?;
    coefficients
        .iter()
        .map(|field| field.trim().parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()
        .map(CalibrationPolynomial::new)
}

/// Polarity of a `Polarity` line: the last character of its value field.
fn polarity_of(line: &str, separator: &str) -> Option<char> {
    let parts: Vec<&str> = line.split(separator).collect();
    if parts.len() != 2 {
        return None;
    }
    parts[1].trim_end_matches('\r').chars().last()
}

/// Parses the per-function polarities of `_extern.inf`.
///
/// Each `Instrument Parameters - Function N:` block is expected to carry a
/// `Polarity` line on one of the next two lines.
///
/// # Returns
///
/// * function number → polarity character
///
pub fn parse_polarities(bytes: &[u8]) -> BTreeMap<u32, char> {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().collect();
    let mut polarities = BTreeMap::new();

    for (i, line) in lines.iter().enumerate() {
        if !line.starts_with(INSTRUMENT_PARAMETERS) {
            continue;
        }
        let words: Vec<&str> = line.split(' ').collect();
        let number = match words.as_slice() {
            [_, _, _, _, number] => number
                .trim_end()
                .strip_suffix(':')
                .and_then(|n| n.parse::<u32>().ok()),
            _ => None,
        };
        let number = match number {
            Some(number) => number,
            None => {
                warn!("skipping malformed instrument parameter line: {}", line);
                continue;
            }
        };

        let polarity = match (lines.get(i + 1), lines.get(i + 2)) {
            (Some(next), _) if next.starts_with(POLARITY) => polarity_of(next, "\t\t\t"),
            (_, Some(after)) if after.starts_with(POLARITY) => polarity_of(after, "\t"),
            _ => None,
        };
        match polarity {
            Some(polarity) => {
                polarities.insert(number, polarity);
            }
            None => warn!("no polarity found for function {}", number),
        }
    }

    debug!("found polarities for {} functions", polarities.len());
    polarities
}

/// External metadata resolved for one function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionMeta {
    pub polarity: Option<char>,
    pub calibration: Option<CalibrationPolynomial>,
}

/// Pairs polarities and calibrations with function `number` (1-based).
///
/// A calibration is only used for functions with a known polarity, and only
/// when its list position matches the function.
pub fn function_meta(
    number: u32,
    polarities: &BTreeMap<u32, char>,
    calibrations: &[CalibrationPolynomial],
) -> FunctionMeta {
    let polarity = polarities.get(&number).copied();
    let calibration = match polarity {
        Some(_) => calibrations
            .get(number.saturating_sub(1) as usize)
            .filter(|c| !c.is_empty())
            .cloned(),
        None => None,
    };
    FunctionMeta {
        polarity,
        calibration,
    }
}

/// Reads `_HEADER.TXT`, lossy on non UTF-8 bytes.
pub fn read_header(path: &Path) -> Result<HeaderInfo> {
    let bytes = read_file(path)?;
    Ok(parse_header(&String::from_utf8_lossy(&bytes)))
}

/// Reads `_extern.inf`.
pub fn read_polarities(path: &Path) -> Result<BTreeMap<u32, char>> {
    let bytes = read_file(path)?;
    Ok(parse_polarities(&bytes))
}
