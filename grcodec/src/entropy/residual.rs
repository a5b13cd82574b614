//! Mapping between signed residuals and the non-negative domain the Golomb
//! code works on.

/// How a signed value is turned into a Golomb code word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignMode {
    /// Zigzag interleaving: 0, -1, 1, -2, 2, ... map to 0, 1, 2, 3, 4, ...
    #[default]
    Interleaved,
    /// One sign bit (1 = negative) followed by the code of the magnitude.
    SignMagnitude,
}

/// Zigzag-maps a signed value.
#[inline(always)]
pub const fn zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag`].
#[inline(always)]
pub const fn unzigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Splits a value into its sign bit and magnitude.
#[inline(always)]
pub const fn sign_magnitude(value: i32) -> (bool, u32) {
    (value < 0, value.unsigned_abs())
}

/// Rebuilds a value from a sign bit and magnitude.
#[inline(always)]
pub const fn from_sign_magnitude(negative: bool, magnitude: u32) -> i32 {
    let value = magnitude as i32;
    if negative { value.wrapping_neg() } else { value }
}
