use std::f64::consts::PI;

use crate::utils::errors::{CodecError, Result};

/// Orthonormal DCT-II / DCT-III of a fixed length, evaluated directly.
///
/// Every basis value `cos(pi * (2i + 1) * k / 2n)` is one of the `4n`
/// distinct angles `pi * m / 2n`, so only those are tabled and the plan
/// stays linear in `n`.
#[derive(Debug, Clone)]
pub struct DctPlan {
    n: usize,
    // cosines[m] = cos(pi * m / 2n), m < 4n
    cosines: Vec<f64>,
    norm0: f64,
    norm: f64,
}

impl DctPlan {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(CodecError::invalid_argument("DCT length must be non-zero"));
        }

        let period = 4 * n;
        let cosines = (0..period)
            .map(|m| (PI * m as f64 / (2 * n) as f64).cos())
            .collect();

        Ok(Self {
            n,
            cosines,
            norm0: (1.0 / n as f64).sqrt(),
            norm: (2.0 / n as f64).sqrt(),
        })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.n {
            return Err(CodecError::DimensionMismatch {
                what: "DCT input length",
                expected: self.n,
                actual,
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn alpha(&self, k: usize) -> f64 {
        if k == 0 { self.norm0 } else { self.norm }
    }

    /// Walks `cos(pi * (2i + 1) * k / 2n)` for `i = 0, 1, ...`; the table
    /// index advances by `2k` modulo `4n`.
    #[inline(always)]
    fn basis_row(&self, k: usize) -> impl Iterator<Item = f64> + '_ {
        let period = self.cosines.len();
        let step = 2 * k % period;
        let mut m = k % period;
        (0..self.n).map(move |_| {
            let c = self.cosines[m];
            m += step;
            if m >= period {
                m -= period;
            }
            c
        })
    }

    /// DCT-II.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_len(input.len())?;
        Ok((0..self.n)
            .map(|k| {
                let sum: f64 = self.basis_row(k).zip(input).map(|(b, x)| b * x).sum();
                self.alpha(k) * sum
            })
            .collect())
    }

    /// DCT-III, the inverse of [`DctPlan::forward`].
    pub fn inverse(&self, coeffs: &[f64]) -> Result<Vec<f64>> {
        self.check_len(coeffs.len())?;
        let mut output = vec![0.0; self.n];
        for (k, &c) in coeffs.iter().enumerate() {
            if c == 0.0 {
                continue;
            }
            let weight = self.alpha(k) * c;
            for (y, b) in output.iter_mut().zip(self.basis_row(k)) {
                *y += weight * b;
            }
        }
        Ok(output)
    }

    /// Separable 2-D DCT-II of a row-major `n x n` block, in place.
    pub fn forward_2d(&self, block: &mut [f64]) -> Result<()> {
        self.apply_2d(block, Self::forward)
    }

    /// Separable 2-D DCT-III of a row-major `n x n` block, in place.
    pub fn inverse_2d(&self, block: &mut [f64]) -> Result<()> {
        self.apply_2d(block, Self::inverse)
    }

    fn apply_2d(
        &self,
        block: &mut [f64],
        pass: fn(&Self, &[f64]) -> Result<Vec<f64>>,
    ) -> Result<()> {
        let n = self.n;
        if block.len() != n * n {
            return Err(CodecError::DimensionMismatch {
                what: "DCT block size",
                expected: n * n,
                actual: block.len(),
            });
        }

        for row in block.chunks_exact_mut(n) {
            let out = pass(self, row)?;
            row.copy_from_slice(&out);
        }

        let mut column = vec![0.0; n];
        for c in 0..n {
            for r in 0..n {
                column[r] = block[r * n + c];
            }
            let out = pass(self, &column)?;
            for r in 0..n {
                block[r * n + c] = out[r];
            }
        }

        Ok(())
    }
}
