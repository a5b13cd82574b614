//! Adaptive Golomb parameter selection.

/// Largest `m` the geometric estimate yields; fits a 16-bit header field.
pub const MAX_GEOMETRIC_M: u32 = 1 << 15;

/// Estimate for a geometric source with the given mean.
///
/// `m = round(-1 / log2(mean / (mean + 1)))`, at least 1, rounded up to the
/// next power of two and capped at [`MAX_GEOMETRIC_M`].
pub fn geometric_m(mean: f64) -> u32 {
    if mean.is_nan() || mean <= 0.0 {
        return 1;
    }

    let estimate = (-1.0 / (mean / (mean + 1.0)).log2()).round();
    let m = if estimate.is_finite() {
        estimate.clamp(1.0, MAX_GEOMETRIC_M as f64) as u32
    } else {
        MAX_GEOMETRIC_M
    };

    m.next_power_of_two().min(MAX_GEOMETRIC_M)
}

/// [`geometric_m`] over already-mapped (non-negative) residuals.
pub fn estimate_from_mapped(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 1;
    }
    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    geometric_m(sum as f64 / values.len() as f64)
}

/// Coarse four-level estimate used per audio block.
pub fn bucket_m(mean_abs: f64) -> u32 {
    match mean_abs {
        x if x < 4.0 => 4,
        x if x < 8.0 => 8,
        x if x < 16.0 => 16,
        _ => 32,
    }
}

pub fn mean_abs(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: u64 = values.iter().map(|v| v.unsigned_abs() as u64).sum();
    sum as f64 / values.len() as f64
}
