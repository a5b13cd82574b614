use std::io;

use super::{BlockCoder, read_m_field, write_m_field};
use crate::entropy::estimate::{bucket_m, mean_abs};
use crate::entropy::golomb::GolombCoder;
use crate::entropy::residual::SignMode;
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::{CodecError, Result};

const SAMPLE_OFFSET: i32 = 32768;

/// Lossless first-order delta coder.
///
/// Block payload: `[m]`, the first sample as `sample + 32768` in 16 bits, then
/// one Golomb code per sample-to-sample delta. Deltas wrap in 16 bits so each
/// stays within the sample range.
#[derive(Debug, Clone)]
pub struct Dpcm {
    coder: GolombCoder,
    initial_m: u32,
    adaptive: bool,
}

impl Dpcm {
    pub fn new(initial_m: u32, sign_mode: SignMode, adaptive: bool) -> Result<Self> {
        Ok(Self {
            coder: GolombCoder::new(initial_m, sign_mode)?,
            initial_m,
            adaptive,
        })
    }
}

pub(crate) fn write_first_sample<W: io::Write>(
    sample: i16,
    bs: &mut BitStreamWriter<W>,
) -> Result<()> {
    bs.write_bits((sample as i32 + SAMPLE_OFFSET) as u64, 16)
}

pub(crate) fn read_first_sample<R: io::Read>(bs: &mut BitStreamReader<R>) -> Result<i16> {
    Ok((bs.read_bits(16)? as i32 - SAMPLE_OFFSET) as i16)
}

impl BlockCoder for Dpcm {
    fn encode_block<W: io::Write>(
        &mut self,
        block: &[i16],
        bs: &mut BitStreamWriter<W>,
    ) -> Result<()> {
        let Some(&first) = block.first() else {
            return Ok(());
        };

        let deltas: Vec<i32> = block
            .windows(2)
            .map(|w| w[1].wrapping_sub(w[0]) as i32)
            .collect();

        if self.adaptive && !deltas.is_empty() {
            write_m_field(&mut self.coder, bucket_m(mean_abs(&deltas)), bs)?;
        } else {
            self.coder.set_m(self.initial_m)?;
        }

        write_first_sample(first, bs)?;
        for &delta in &deltas {
            self.coder.encode(delta, bs)?;
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
        let mut prev = read_first_sample(bs)?;
        out.push(prev);

        for _ in 1..len {
            let delta = self.coder.decode(bs)?;
            let delta = i16::try_from(delta).map_err(|_| {
                CodecError::invalid_stream(format!("delta {delta} outside the 16-bit range"))
            })?;
            prev = prev.wrapping_add(delta);
            out.push(prev);
        }

        Ok(out)
    }
}
