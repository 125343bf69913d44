use log::warn;
use lynxcore::algorithm::aggregate::MAX_PRECISION;

/// Tunables of the spectral decode pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Decimal digits kept when rounding keys before aggregation.
    pub precision: i32,
    /// Worker threads used to decode functions in parallel.
    pub num_threads: usize,
}

impl DecodeConfig {
    /// Precision is clamped to `±MAX_PRECISION` decimal digits.
    pub fn new(precision: i32, num_threads: usize) -> Self {
        let clamped = precision.clamp(-MAX_PRECISION, MAX_PRECISION);
        if clamped != precision {
            warn!("precision {} clamped to {}", precision, clamped);
        }
        DecodeConfig {
            precision: clamped,
            num_threads: num_threads.max(1),
        }
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            precision: 0,
            num_threads: 4,
        }
    }
}
