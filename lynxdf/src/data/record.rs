use std::fmt::Display;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use lynxcore::algorithm::aggregate::{aggregate_scans, round_keys};
use lynxcore::algorithm::bits::{low_mask, reconstruct_fraction};
use lynxcore::algorithm::calibration::CalibrationPolynomial;
use lynxcore::data::matrix::{Matrix, ValueMatrix};

use crate::data::error::{RawDataError, Result};
use crate::data::function_info::{FunctionInfo, TABLE_LEN};

/// Payload record encodings, selected by the inferred record width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// 2 bytes, value only; keys come from the function's q1 table.
    Packed2,
    /// 6 bytes, 23-bit key mantissa with a power of two, 16-bit signed value with a power of four.
    Packed6,
    /// 8 bytes, keys and values split into variable width integer and fraction fields.
    Packed8,
}

impl RecordLayout {
    pub fn from_width(width: u64, path: &Path) -> Result<RecordLayout> {
        match width {
            2 => Ok(RecordLayout::Packed2),
            6 => Ok(RecordLayout::Packed6),
            8 => Ok(RecordLayout::Packed8),
            _ => Err(RawDataError::UnsupportedFormat {
                path: path.to_path_buf(),
                width,
            }),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            RecordLayout::Packed2 => 2,
            RecordLayout::Packed6 => 6,
            RecordLayout::Packed8 => 8,
        }
    }
}

impl Display for RecordLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-byte records", self.width())
    }
}

/// Everything a decoder needs besides the payload bytes.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub function: Option<&'a FunctionInfo>,
    pub calibration: Option<&'a CalibrationPolynomial>,
    pub precision: i32,
}

/// Key axis and value matrix of one function, before metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecords {
    pub keys: Vec<f64>,
    pub values: ValueMatrix,
}

/// Decodes a whole payload buffer with the given layout.
///
/// # Arguments
///
/// * `layout` - record layout inferred from the scan index
/// * `payload` - content of the `_FUNCnnn.DAT` file
/// * `counts` - number of records of every scan
/// * `context` - function record, calibration and key precision
/// * `path` - payload path used for error reporting
///
pub fn decode_records(
    layout: RecordLayout,
    payload: &[u8],
    counts: &[u32],
    context: &DecodeContext,
    path: &Path,
) -> Result<DecodedRecords> {
    match layout {
        RecordLayout::Packed2 => decode_packed2(payload, counts, context.function, path),
        RecordLayout::Packed6 => decode_packed6(payload, counts, context, path),
        RecordLayout::Packed8 => decode_packed8(payload, counts, context, path),
    }
}

fn check_payload_len(payload: &[u8], counts: &[u32], layout: RecordLayout, path: &Path) -> Result<usize> {
    let total: u64 = counts.iter().map(|&c| c as u64).sum();
    let expected = total * layout.width() as u64;
    if payload.len() as u64 != expected {
        return Err(RawDataError::corrupt(
            path,
            format!(
                "payload holds {} bytes but the scan index announces {} {}",
                payload.len(),
                total,
                layout
            ),
        ));
    }
    Ok(total as usize)
}

/// Calibrates (if a non-empty polynomial is given) and rounds raw keys.
fn finish_keys(keys: &mut [f64], context: &DecodeContext) {
    if let Some(calibration) = context.calibration.filter(|c| !c.is_empty()) {
        calibration.apply_in_place(keys);
    }
    round_keys(keys, context.precision);
}

// ---------------------------------------------------------------------------
// 2-byte layout
// ---------------------------------------------------------------------------

/// Value of one 2-byte record: 13-bit base times 4 to the 3-bit power.
#[inline]
pub fn packed2_value(word: u16) -> u32 {
    let base = (word >> 3) as u32;
    let power = (word & 0x7) as u32;
    base * 4u32.pow(power)
}

/// Decodes the 2-byte layout.
///
/// Every scan must carry the same number of records `n`; the key axis is
/// the first `n` entries of the q1 table and the matrix is filled by position.
pub fn decode_packed2(
    payload: &[u8],
    counts: &[u32],
    function: Option<&FunctionInfo>,
    path: &Path,
) -> Result<DecodedRecords> {
    let per_scan = counts.first().copied().unwrap_or(0);
    if counts.iter().any(|&c| c != per_scan) {
        return Err(RawDataError::assumption(
            path,
            "2-byte records require the same record count in every scan",
        ));
    }
    let total = check_payload_len(payload, counts, RecordLayout::Packed2, path)?;

    let function = function.ok_or_else(|| {
        RawDataError::assumption(path, "2-byte records need a function directory record")
    })?;
    if function.function_id != 1 {
        return Err(RawDataError::assumption(
            path,
            format!(
                "2-byte records are only known for function id 1, found {}",
                function.function_id
            ),
        ));
    }
    let per_scan = per_scan as usize;
    if per_scan > TABLE_LEN {
        return Err(RawDataError::assumption(
            path,
            format!("{} records per scan exceed the {}-entry q1 table", per_scan, TABLE_LEN),
        ));
    }

    let values: Vec<i64> = payload
        .chunks_exact(2)
        .take(total)
        .map(|chunk| packed2_value(LittleEndian::read_u16(chunk)) as i64)
        .collect();
    let keys: Vec<f64> = function.q1[..per_scan].iter().map(|&k| k as f64).collect();

    Ok(DecodedRecords {
        keys,
        values: ValueMatrix::Integer(Matrix::from_row_major(counts.len(), per_scan, values)),
    })
}

// ---------------------------------------------------------------------------
// 6-byte layout
// ---------------------------------------------------------------------------

/// Assembles a 48-bit record from its 4-byte low and 2-byte high parts.
#[inline]
pub fn read_packed6(chunk: &[u8]) -> u64 {
    let low = LittleEndian::read_u32(&chunk[0..4]) as u64;
    let high = LittleEndian::read_u16(&chunk[4..6]) as u64;
    low | (high << 32)
}

/// Splits a 48-bit record into its raw key and value.
///
/// # Bit layout (from the least significant bit)
///
/// * 0..16 signed value base
/// * 16..20 value power, value = base * 4^power
/// * 20..25 key power, biased by 23
/// * 25..48 key base, key = base * 2^(power - 23)
///
#[inline]
pub fn unpack_packed6(raw: u64) -> (f64, i64) {
    let key_base = (raw & 0xFFFF_FE00_0000) >> 25;
    let key_power = ((raw & 0x1F0_0000) >> 20) as i32 - 23;
    let key = key_base as f64 * 2f64.powi(key_power);

    let value_base = (raw & 0xFFFF) as u16 as i16 as i64;
    let value_power = ((raw & 0xF_0000) >> 16) as u32;
    let value = value_base * 4i64.pow(value_power);

    (key, value)
}

/// Decodes the 6-byte layout and aggregates it onto a rounded key axis.
pub fn decode_packed6(
    payload: &[u8],
    counts: &[u32],
    context: &DecodeContext,
    path: &Path,
) -> Result<DecodedRecords> {
    let total = check_payload_len(payload, counts, RecordLayout::Packed6, path)?;

    let mut keys = Vec::with_capacity(total);
    let mut values = Vec::with_capacity(total);
    for chunk in payload.chunks_exact(6) {
        let (key, value) = unpack_packed6(read_packed6(chunk));
        keys.push(key);
        values.push(value);
    }
    finish_keys(&mut keys, context);

    let (axis, matrix) = aggregate_scans(&keys, &values, counts);
    Ok(DecodedRecords {
        keys: axis,
        values: ValueMatrix::Integer(matrix),
    })
}

// ---------------------------------------------------------------------------
// 8-byte layout
// ---------------------------------------------------------------------------

const KEY_FIELD_BITS: u32 = 31;
const VALUE_FIELD_BITS: u32 = 21;

/// Rebuilds the key from the upper 36 bits of an 8-byte record.
///
/// The top 5 bits give the number of integer bits, the remaining low bits
/// of the 31-bit field are the fraction.
#[inline]
pub fn unpack_packed8_key(raw: u64) -> f64 {
    let key_bits = raw >> 28;
    let int_bits = (key_bits >> KEY_FIELD_BITS) as u32;
    let frac_bits = KEY_FIELD_BITS - int_bits;
    let integer = (key_bits >> frac_bits) & low_mask(int_bits);
    let fraction = reconstruct_fraction(key_bits & low_mask(frac_bits), frac_bits);
    integer as f64 + fraction
}

/// Rebuilds the value from the lower 28 bits of an 8-byte record.
///
/// The top 6 bits give the number of integer bits; counts above 21 are
/// clamped and the excess becomes a left shift of the integer part.
#[inline]
pub fn unpack_packed8_value(raw: u64) -> f64 {
    let value_bits = raw & 0xFFF_FFFF;
    let mut int_bits = (value_bits >> 22) as u32;
    let mut shift = 0;
    if int_bits > VALUE_FIELD_BITS {
        shift = int_bits - VALUE_FIELD_BITS;
        int_bits = VALUE_FIELD_BITS;
    }
    let frac_bits = VALUE_FIELD_BITS - int_bits;
    let integer = ((value_bits >> frac_bits) & low_mask(int_bits)) << shift;
    let fraction = reconstruct_fraction(value_bits & low_mask(frac_bits), frac_bits);
    integer as f64 + fraction
}

/// Decodes the 8-byte layout and aggregates it onto a rounded key axis.
pub fn decode_packed8(
    payload: &[u8],
    counts: &[u32],
    context: &DecodeContext,
    path: &Path,
) -> Result<DecodedRecords> {
    let total = check_payload_len(payload, counts, RecordLayout::Packed8, path)?;

    let mut keys = Vec::with_capacity(total);
    let mut values = Vec::with_capacity(total);
    for chunk in payload.chunks_exact(8) {
        let raw = LittleEndian::read_u64(chunk);
        keys.push(unpack_packed8_key(raw));
        values.push(unpack_packed8_value(raw));
    }
    finish_keys(&mut keys, context);

    let (axis, matrix) = aggregate_scans(&keys, &values, counts);
    Ok(DecodedRecords {
        keys: axis,
        values: ValueMatrix::Float(matrix),
    })
}
