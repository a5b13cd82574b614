//! Golomb-Rice coding with a truncated-binary remainder.
//!
//! A value `v` is split into `q = v / m` and `r = v % m`. The quotient is sent
//! in unary (`q` ones and a terminating zero), the remainder in truncated
//! binary, so `m` does not have to be a power of two:
//!
//! | condition      | remainder field            |
//! |----------------|----------------------------|
//! | `r < cutoff`   | `r` in `b` bits            |
//! | `r >= cutoff`  | `r + cutoff` in `b+1` bits |
//!
//! with `b = floor(log2 m)` and `cutoff = 2^(b+1) - m`.

use std::io;

use crate::entropy::residual::{SignMode, from_sign_magnitude, sign_magnitude, unzigzag, zigzag};
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::{CodecError, Result};

/// Golomb parameter with its derived remainder layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GolombParam {
    m: u32,
    b: u32,
    cutoff: u32,
}

impl GolombParam {
    pub fn new(m: u32) -> Result<Self> {
        if m == 0 {
            return Err(CodecError::invalid_argument(
                "Golomb parameter m must be at least 1",
            ));
        }

        let b = m.ilog2();
        let cutoff = ((1u64 << (b + 1)) - m as u64) as u32;

        Ok(Self { m, b, cutoff })
    }

    pub fn m(&self) -> u32 {
        self.m
    }

    pub fn b(&self) -> u32 {
        self.b
    }

    pub fn cutoff(&self) -> u32 {
        self.cutoff
    }
}

/// Entropy coder for signed or already-mapped integers.
#[derive(Debug, Clone)]
pub struct GolombCoder {
    param: GolombParam,
    mode: SignMode,
    run_limit: Option<u32>,
}

impl GolombCoder {
    pub fn new(m: u32, mode: SignMode) -> Result<Self> {
        Ok(Self {
            param: GolombParam::new(m)?,
            mode,
            run_limit: None,
        })
    }

    /// Caps every run of unary ones at `limit`.
    ///
    /// The quotient is sent as segments of at most `limit` ones, each closed by
    /// a zero; a segment of exactly `limit` ones announces another segment.
    pub fn with_run_limit(mut self, limit: u32) -> Result<Self> {
        if limit == 0 || limit > 63 {
            return Err(CodecError::invalid_argument(format!(
                "unary run limit must be between 1 and 63, got {limit}"
            )));
        }
        self.run_limit = Some(limit);
        Ok(self)
    }

    pub fn set_m(&mut self, m: u32) -> Result<()> {
        self.param = GolombParam::new(m)?;
        Ok(())
    }

    pub fn m(&self) -> u32 {
        self.param.m
    }

    pub fn param(&self) -> GolombParam {
        self.param
    }

    pub fn mode(&self) -> SignMode {
        self.mode
    }

    pub fn encode<W: io::Write>(&self, value: i32, bs: &mut BitStreamWriter<W>) -> Result<()> {
        match self.mode {
            SignMode::Interleaved => self.encode_unsigned(zigzag(value), bs),
            SignMode::SignMagnitude => {
                let (negative, magnitude) = sign_magnitude(value);
                bs.write_bit(negative)?;
                self.encode_unsigned(magnitude, bs)
            }
        }
    }

    pub fn decode<R: io::Read>(&self, bs: &mut BitStreamReader<R>) -> Result<i32> {
        match self.mode {
            SignMode::Interleaved => Ok(unzigzag(self.decode_unsigned(bs)?)),
            SignMode::SignMagnitude => {
                let negative = bs.read_bit()?;
                let magnitude = self.decode_unsigned(bs)?;
                Ok(from_sign_magnitude(negative, magnitude))
            }
        }
    }

    /// Codes a non-negative value as-is, without sign mapping.
    pub fn encode_unsigned<W: io::Write>(
        &self,
        value: u32,
        bs: &mut BitStreamWriter<W>,
    ) -> Result<()> {
        let GolombParam { m, b, cutoff } = self.param;
        let quotient = value / m;
        let remainder = value % m;

        match self.run_limit {
            None => write_unary(bs, quotient)?,
            Some(limit) => {
                let mut left = quotient;
                loop {
                    let run = left.min(limit);
                    write_unary(bs, run)?;
                    if run < limit {
                        break;
                    }
                    left -= limit;
                }
            }
        }

        if remainder < cutoff {
            if b > 0 {
                bs.write_bits(remainder as u64, b)?;
            }
        } else {
            bs.write_bits(remainder as u64 + cutoff as u64, b + 1)?;
        }

        Ok(())
    }

    pub fn decode_unsigned<R: io::Read>(&self, bs: &mut BitStreamReader<R>) -> Result<u32> {
        let GolombParam { m, b, cutoff } = self.param;

        let quotient = match self.run_limit {
            None => read_unary(bs, u64::MAX)?,
            Some(limit) => {
                let mut total = 0u64;
                loop {
                    let run = read_unary(bs, limit as u64)?;
                    total += run;
                    if run < limit as u64 {
                        break total;
                    }
                    // a full segment is closed by its own zero
                }
            }
        };

        let remainder = if b == 0 {
            0
        } else {
            let head = bs.read_bits(b)?;
            if head < cutoff as u64 {
                head
            } else {
                ((head << 1) | bs.read_bit()? as u64) - cutoff as u64
            }
        };

        let value = quotient
            .checked_mul(m as u64)
            .and_then(|v| v.checked_add(remainder))
            .filter(|&v| v <= u32::MAX as u64)
            .ok_or_else(|| {
                CodecError::invalid_stream(format!(
                    "Golomb code word exceeds 32 bits (q = {quotient}, m = {m})"
                ))
            })?;

        Ok(value as u32)
    }
}

/// Writes `count` ones followed by a zero.
fn write_unary<W: io::Write>(bs: &mut BitStreamWriter<W>, count: u32) -> Result<()> {
    let mut left = count;
    while left >= 64 {
        bs.write_bits(u64::MAX, 64)?;
        left -= 64;
    }
    // `left` ones and the terminating zero fit in one field
    bs.write_bits(((1u64 << left) - 1) << 1, left + 1)
}

/// Counts ones up to the terminating zero. Fails if more than `max` ones are
/// seen before it.
fn read_unary<R: io::Read>(bs: &mut BitStreamReader<R>, max: u64) -> Result<u64> {
    let mut count = 0u64;
    while bs.read_bit()? {
        count += 1;
        if count > max {
            return Err(CodecError::invalid_stream(format!(
                "unary run longer than {max} ones"
            )));
        }
    }
    Ok(count)
}
