/// Bit pattern of `1.0f64`: biased exponent 0x3FF, zero mantissa.
const ONE_EXPONENT_BITS: u64 = 0x3FF << 52;

/// Width of the IEEE-754 double mantissa.
pub const MANTISSA_BITS: u32 = 52;

/// Returns a mask with the lowest `width` bits set.
///
/// # Arguments
///
/// * `width` - number of low bits to set, 0..=64
///
/// # Example
///
/// ```rust
/// use lynxcore::algorithm::bits::low_mask;
/// assert_eq!(low_mask(0), 0);
/// assert_eq!(low_mask(5), 0b11111);
/// ```
#[inline]
pub fn low_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reconstructs `bits / 2^width` as an `f64` without a division.
///
/// The field is left-aligned into the mantissa of `1.0`, the pattern is
/// reinterpreted as a double in `[1, 2)` and `1.0` is subtracted again, which
/// leaves exactly the fractional value of the field.
///
/// # Arguments
///
/// * `bits` - the fractional bit field, `bits < 2^width`
/// * `width` - number of significant bits in `bits`, 0..=52
///
/// # Returns
///
/// * a value in `[0, 1)`
///
/// # Example
///
/// ```rust
/// use lynxcore::algorithm::bits::reconstruct_fraction;
/// assert_eq!(reconstruct_fraction(0, 17), 0.0);
/// assert_eq!(reconstruct_fraction(1, 1), 0.5);
/// assert_eq!(reconstruct_fraction(0b11, 3), 0.375);
/// ```
#[inline]
pub fn reconstruct_fraction(bits: u64, width: u32) -> f64 {
    debug_assert!(width <= MANTISSA_BITS);
    debug_assert!(bits <= low_mask(width));
    let mantissa = bits << (MANTISSA_BITS - width);
    f64::from_bits(ONE_EXPONENT_BITS | mantissa) - 1.0
}
