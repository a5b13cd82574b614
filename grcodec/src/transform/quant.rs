//! Quantization matrices and step sizes.

use crate::utils::errors::{CodecError, Result};

#[rustfmt::skip]
const JPEG_LUMA: [u16; 64] = [
    16, 11, 10, 16,  24,  40,  51,  61,
    12, 12, 14, 19,  26,  58,  60,  55,
    14, 13, 16, 24,  40,  57,  69,  56,
    14, 17, 22, 29,  51,  87,  80,  62,
    18, 22, 37, 56,  68, 109, 103,  77,
    24, 35, 55, 64,  81, 104, 113,  92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103,  99,
];

#[rustfmt::skip]
const JPEG_CHROMA: [u16; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
];

/// Row-major `size x size` divisor matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantMatrix {
    size: usize,
    values: Vec<u16>,
}

impl QuantMatrix {
    pub fn new(size: usize, values: Vec<u16>) -> Result<Self> {
        if size == 0 || values.len() != size * size {
            return Err(CodecError::DimensionMismatch {
                what: "quantization matrix",
                expected: size * size,
                actual: values.len(),
            });
        }
        if values.contains(&0) {
            return Err(CodecError::invalid_argument(
                "quantization matrix entries must be non-zero",
            ));
        }
        Ok(Self { size, values })
    }

    /// The 8x8 JPEG luminance table.
    pub fn jpeg_luma() -> Self {
        Self {
            size: 8,
            values: JPEG_LUMA.to_vec(),
        }
    }

    /// The 8x8 JPEG chrominance table.
    pub fn jpeg_chroma() -> Self {
        Self {
            size: 8,
            values: JPEG_CHROMA.to_vec(),
        }
    }

    pub fn flat(size: usize, value: u16) -> Result<Self> {
        Self::new(size, vec![value; size * size])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn values(&self) -> &[u16] {
        &self.values
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.values.len() {
            return Err(CodecError::DimensionMismatch {
                what: "quantized block size",
                expected: self.values.len(),
                actual,
            });
        }
        Ok(())
    }

    /// `round(coeff / (q * level))` for every coefficient.
    pub fn quantize(&self, coeffs: &[f64], level: u8) -> Result<Vec<i32>> {
        self.check_len(coeffs.len())?;
        let level = level.max(1) as f64;
        Ok(coeffs
            .iter()
            .zip(&self.values)
            .map(|(&c, &q)| (c / (q as f64 * level)).round() as i32)
            .collect())
    }

    pub fn dequantize(&self, levels: &[i32], level: u8) -> Result<Vec<f64>> {
        self.check_len(levels.len())?;
        let level = level.max(1) as f64;
        Ok(levels
            .iter()
            .zip(&self.values)
            .map(|(&l, &q)| l as f64 * q as f64 * level)
            .collect())
    }
}

/// Audio step size of coefficient `j` out of `n`: `(1 / level) * (1 + j^2 / n^2)`.
///
/// High frequencies get proportionally coarser steps.
#[inline]
pub fn audio_step(j: usize, n: usize, level: u8) -> f64 {
    let ratio = j as f64 / n.max(1) as f64;
    (1.0 + ratio * ratio) / level.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_tables() {
        let luma = QuantMatrix::jpeg_luma();
        assert_eq!(luma.size(), 8);
        assert_eq!(luma.values()[0], 16);
        assert_eq!(luma.values()[63], 99);
        assert_eq!(luma.values()[6 * 8 + 5], 121);

        let chroma = QuantMatrix::jpeg_chroma();
        assert_eq!(&chroma.values()[..4], &[17, 18, 24, 47]);
        assert!(chroma.values()[32..].iter().all(|&v| v == 99));
    }

    #[test]
    fn quantize_rounds_to_nearest() -> Result<()> {
        let m = QuantMatrix::flat(2, 10)?;
        let levels = m.quantize(&[14.9, 15.0, -15.0, 3.0], 1)?;
        assert_eq!(levels, vec![1, 2, -2, 0]);
        assert_eq!(m.quantize(&[40.0, 0.0, 0.0, 0.0], 2)?, vec![2, 0, 0, 0]);
        assert_eq!(m.dequantize(&[2, 0, -1, 0], 2)?, vec![40.0, 0.0, -20.0, 0.0]);
        Ok(())
    }

    #[test]
    fn bad_matrices() {
        assert!(QuantMatrix::new(2, vec![1, 2, 3]).is_err());
        assert!(QuantMatrix::new(0, vec![]).is_err());
        assert!(QuantMatrix::flat(4, 0).is_err());
        assert!(QuantMatrix::jpeg_luma().quantize(&[0.0; 16], 1).is_err());
    }

    #[test]
    fn audio_steps_grow_with_frequency() {
        assert_eq!(audio_step(0, 1024, 1), 1.0);
        assert_eq!(audio_step(512, 1024, 1), 1.25);
        assert_eq!(audio_step(512, 1024, 5), 0.25);
        assert!(audio_step(1023, 1024, 1) < 2.0);
    }
}
