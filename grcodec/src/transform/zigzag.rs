use crate::utils::errors::{CodecError, Result};

/// Zig-zag scan order of an `n x n` block, as row-major indices.
///
/// Anti-diagonals are walked alternately bottom-left to top-right (even
/// diagonals) and top-right to bottom-left (odd diagonals), starting at the
/// top-left corner; for `n = 8` this is the JPEG coefficient order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZigzagScan {
    n: usize,
    order: Vec<usize>,
}

impl ZigzagScan {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(CodecError::invalid_argument("scan size must be non-zero"));
        }

        let mut order = Vec::with_capacity(n * n);
        for diag in 0..(2 * n - 1) {
            let lo = diag.saturating_sub(n - 1);
            let hi = diag.min(n - 1);
            if diag % 2 == 0 {
                for row in (lo..=hi).rev() {
                    order.push(row * n + (diag - row));
                }
            } else {
                for row in lo..=hi {
                    order.push(row * n + (diag - row));
                }
            }
        }

        Ok(Self { n, order })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Reorders a row-major block into scan order.
    pub fn scan<T: Copy>(&self, block: &[T]) -> Result<Vec<T>> {
        self.check_len(block.len())?;
        Ok(self.order.iter().map(|&i| block[i]).collect())
    }

    /// Places scan-ordered values back at their row-major positions.
    pub fn unscan<T: Copy + Default>(&self, scanned: &[T]) -> Result<Vec<T>> {
        self.check_len(scanned.len())?;
        let mut block = vec![T::default(); scanned.len()];
        for (&pos, &v) in self.order.iter().zip(scanned) {
            block[pos] = v;
        }
        Ok(block)
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.order.len() {
            return Err(CodecError::DimensionMismatch {
                what: "zig-zag block size",
                expected: self.order.len(),
                actual,
            });
        }
        Ok(())
    }
}
