use std::collections::BTreeSet;
use std::ops::AddAssign;

use ordered_float::OrderedFloat;

use crate::data::matrix::Matrix;

/// Largest number of decimal digits an `f64` key can meaningfully keep.
pub const MAX_PRECISION: i32 = 15;

/// Rounds `value` to `precision` decimal digits, ties to even.
///
/// Negative precisions round to tens, hundreds, ... The precision is clamped
/// to `±MAX_PRECISION`; beyond that the scale factor overflows to infinity.
///
/// # Example
///
/// ```rust
/// use lynxcore::algorithm::aggregate::round_to_precision;
/// assert_eq!(round_to_precision(100.5, 0), 100.0);
/// assert_eq!(round_to_precision(101.5, 0), 102.0);
/// assert_eq!(round_to_precision(523.4567, 2), 523.46);
/// assert_eq!(round_to_precision(1234.0, -2), 1200.0);
/// ```
pub fn round_to_precision(value: f64, precision: i32) -> f64 {
    let precision = precision.clamp(-MAX_PRECISION, MAX_PRECISION);
    if precision >= 0 {
        let scale = 10f64.powi(precision);
        (value * scale).round_ties_even() / scale
    } else {
        let scale = 10f64.powi(-precision);
        (value / scale).round_ties_even() * scale
    }
}

/// Rounds every key in place.
pub fn round_keys(keys: &mut [f64], precision: i32) {
    for key in keys.iter_mut() {
        *key = round_to_precision(*key, precision);
    }
}

/// Sorted, duplicate-free axis of all observed keys.
pub fn build_key_axis(keys: &[f64]) -> Vec<f64> {
    keys.iter()
        .map(|&key| OrderedFloat(key))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|key| key.into_inner())
        .collect()
}

/// Position of `key` on `axis`, exact match.
#[inline]
pub fn axis_position(axis: &[f64], key: f64) -> Option<usize> {
    axis.binary_search_by_key(&OrderedFloat(key), |&probe| OrderedFloat(probe))
        .ok()
}

/// Sums the values of every scan onto a shared key axis.
///
/// `keys` and `values` hold the pairs of all scans back to back, `counts[s]`
/// is the number of pairs that belong to scan `s`. Pairs of one scan that land
/// on the same axis key are summed.
///
/// # Arguments
///
/// * `keys` - rounded keys of all pairs
/// * `values` - values of all pairs
/// * `counts` - number of pairs per scan
///
/// # Returns
///
/// * `axis` - the sorted key axis
/// * `matrix` - a `(counts.len(), axis.len())` matrix of summed values
///
pub fn aggregate_scans<T: Copy + Default + AddAssign>(
    keys: &[f64],
    values: &[T],
    counts: &[u32],
) -> (Vec<f64>, Matrix<T>) {
    assert_eq!(keys.len(), values.len(), "keys and values must pair up");
    assert_eq!(
        counts.iter().map(|&c| c as usize).sum::<usize>(),
        keys.len(),
        "per-scan counts must cover all pairs"
    );

    let axis = build_key_axis(keys);
    let mut matrix: Matrix<T> = Matrix::zeros(counts.len(), axis.len());

    let mut start = 0;
    for (scan, &count) in counts.iter().enumerate() {
        let stop = start + count as usize;
        for (&key, &value) in keys[start..stop].iter().zip(&values[start..stop]) {
            let col = axis_position(&axis, key).expect("key axis is built from the same keys");
            matrix.accumulate(scan, col, value);
        }
        start = stop;
    }

    (axis, matrix)
}
