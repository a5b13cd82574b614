//! Causal spatial predictors.
//!
//! Every predictor estimates a sample from its already-coded neighbours:
//!
//! ```text
//!   c  b
//!   a  x
//! ```
//!
//! with `a` the left, `b` the above and `c` the above-left neighbour.
//! Neighbours outside the raster read as 0.

use std::fmt;
use std::str::FromStr;

use crate::utils::errors::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Predictor {
    /// `a`
    Left,
    /// `b`
    Above,
    /// `c`
    AboveLeft,
    /// `a + b - c`
    Abc,
    /// `a + (b - c) / 2`
    Mbc,
    /// JPEG-LS median edge detector.
    #[default]
    JpegLs,
}

impl Predictor {
    pub const ALL: [Predictor; 6] = [
        Predictor::Left,
        Predictor::Above,
        Predictor::AboveLeft,
        Predictor::Abc,
        Predictor::Mbc,
        Predictor::JpegLs,
    ];

    #[inline(always)]
    pub fn predict(self, left: i32, above: i32, above_left: i32) -> i32 {
        match self {
            Predictor::Left => left,
            Predictor::Above => above,
            Predictor::AboveLeft => above_left,
            Predictor::Abc => left + above - above_left,
            Predictor::Mbc => left + (above - above_left) / 2,
            Predictor::JpegLs => {
                let lo = left.min(above);
                let hi = left.max(above);
                if above_left >= hi {
                    lo
                } else if above_left <= lo {
                    hi
                } else {
                    left + above - above_left
                }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Predictor::Left => "left",
            Predictor::Above => "above",
            Predictor::AboveLeft => "above-left",
            Predictor::Abc => "abc",
            Predictor::Mbc => "mbc",
            Predictor::JpegLs => "jpeg-ls",
        }
    }
}

/// Left, above and above-left neighbours of `(row, col)` in a row-major
/// plane with `cols` columns, 0 where the neighbour does not exist.
#[inline(always)]
pub fn causal_neighbors(plane: &[u8], cols: usize, row: usize, col: usize) -> (i32, i32, i32) {
    let at = |r: usize, c: usize| plane[r * cols + c] as i32;

    let left = if col > 0 { at(row, col - 1) } else { 0 };
    let above = if row > 0 { at(row - 1, col) } else { 0 };
    let above_left = if row > 0 && col > 0 {
        at(row - 1, col - 1)
    } else {
        0
    };

    (left, above, above_left)
}

impl fmt::Display for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Predictor {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "pl" => Ok(Predictor::Left),
            "above" | "pa" => Ok(Predictor::Above),
            "above-left" | "pal" => Ok(Predictor::AboveLeft),
            "abc" => Ok(Predictor::Abc),
            "mbc" => Ok(Predictor::Mbc),
            "jpeg-ls" | "ls" => Ok(Predictor::JpegLs),
            other => Err(CodecError::invalid_argument(format!(
                "unknown predictor '{other}'"
            ))),
        }
    }
}
