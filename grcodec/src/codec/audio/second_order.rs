use std::io;

use super::dpcm::{read_first_sample, write_first_sample};
use super::{BlockCoder, STRICT_RUN_LIMIT, read_m_field, write_m_field};
use crate::entropy::estimate::{bucket_m, mean_abs};
use crate::entropy::golomb::GolombCoder;
use crate::entropy::residual::SignMode;
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::{CodecError, Result};

/// Lossless coder predicting each sample as `prev + prevDelta`.
///
/// The first sample of a block is sent verbatim and the second is predicted
/// from the first alone. Residuals are zigzag mapped and Golomb coded with
/// unary runs capped at [`STRICT_RUN_LIMIT`] ones.
#[derive(Debug, Clone)]
pub struct SecondOrder {
    coder: GolombCoder,
    initial_m: u32,
    adaptive: bool,
}

impl SecondOrder {
    pub fn new(initial_m: u32, adaptive: bool) -> Result<Self> {
        let coder =
            GolombCoder::new(initial_m, SignMode::Interleaved)?.with_run_limit(STRICT_RUN_LIMIT)?;
        Ok(Self {
            coder,
            initial_m,
            adaptive,
        })
    }
}

#[inline(always)]
fn predict(prev: i32, prev_delta: i32) -> i32 {
    prev + prev_delta
}

fn residuals(block: &[i16]) -> Vec<i32> {
    let mut out = Vec::with_capacity(block.len().saturating_sub(1));
    let mut prev_delta = 0;
    for w in block.windows(2) {
        let (prev, actual) = (w[0] as i32, w[1] as i32);
        out.push(actual - predict(prev, prev_delta));
        prev_delta = actual - prev;
    }
    out
}

impl BlockCoder for SecondOrder {
    fn encode_block<W: io::Write>(
        &mut self,
        block: &[i16],
        bs: &mut BitStreamWriter<W>,
    ) -> Result<()> {
        let Some(&first) = block.first() else {
            return Ok(());
        };
        let residuals = residuals(block);

        if self.adaptive && !residuals.is_empty() {
            write_m_field(&mut self.coder, bucket_m(mean_abs(&residuals)), bs)?;
        } else {
            self.coder.set_m(self.initial_m)?;
        }

        write_first_sample(first, bs)?;
        for &r in &residuals {
            self.coder.encode(r, bs)?;
        }
        Ok(())
    }

    fn decode_block<R: io::Read>(
        &mut self,
        len: usize,
        bs: &mut BitStreamReader<R>,
    ) -> Result<Vec<i16>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        if self.adaptive && len > 1 {
            read_m_field(&mut self.coder, bs)?;
        } else {
            self.coder.set_m(self.initial_m)?;
        }

        let mut out = Vec::with_capacity(len);
        let mut prev = read_first_sample(bs)? as i32;
        let mut prev_delta = 0;
        out.push(prev as i16);

        for _ in 1..len {
            let residual = self.coder.decode(bs)?;
            let actual = predict(prev, prev_delta)
                .checked_add(residual)
                .and_then(|v| i16::try_from(v).ok())
                .ok_or_else(|| {
                    CodecError::invalid_stream(format!(
                        "residual {residual} leaves the 16-bit sample range"
                    ))
                })? as i32;
            out.push(actual as i16);
            prev_delta = actual - prev;
            prev = actual;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::{BsSliceReader, BsVecWriter};

    #[test]
    fn linear_ramp_has_zero_residuals() {
        assert_eq!(residuals(&[10, 20, 30, 40]), vec![10, 0, 0]);
        assert_eq!(residuals(&[5, 5, 6, 9]), vec![0, 1, 2]);
        assert!(residuals(&[7]).is_empty());
    }

    #[test]
    fn round_trip_with_long_runs() -> Result<()> {
        // the jumps need far more than 31 unary ones at m = 4
        let block = [0, 1000, -1000, 32767, -32768, 0, 0, 1];
        let mut coder = SecondOrder::new(4, false)?;
        let mut writer = BsVecWriter::in_memory();
        coder.encode_block(&block, &mut writer)?;
        let bytes = writer.finish()?;

        let mut reader = BsSliceReader::from_slice(&bytes);
        assert_eq!(coder.decode_block(block.len(), &mut reader)?, block.to_vec());
        Ok(())
    }

    #[test]
    fn no_unary_run_exceeds_limit() -> Result<()> {
        let block = [0, 30000, -30000, 30000];
        let mut coder = SecondOrder::new(1, false)?;
        let mut writer = BsVecWriter::in_memory();
        coder.encode_block(&block, &mut writer)?;
        let bytes = writer.finish()?;

        let bits: String = bytes[2..].iter().map(|b| format!("{b:08b}")).collect();
        let longest = bits.split('0').map(str::len).max().unwrap_or(0);
        assert!(longest <= STRICT_RUN_LIMIT as usize, "run of {longest}");
        Ok(())
    }

    #[test]
    fn adaptive_parameter() -> Result<()> {
        let block: Vec<i16> = (0..64).map(|i| (i * i) as i16).collect();
        let mut coder = SecondOrder::new(8, true)?;
        let mut writer = BsVecWriter::in_memory();
        coder.encode_block(&block, &mut writer)?;
        let bytes = writer.finish()?;

        let mut reader = BsSliceReader::from_slice(&bytes);
        // constant second difference of 2
        assert_eq!(reader.read_bits(6)?, 4);

        let mut reader = BsSliceReader::from_slice(&bytes);
        assert_eq!(coder.decode_block(block.len(), &mut reader)?, block);
        Ok(())
    }
}
