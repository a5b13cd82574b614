use std::io;

use super::{AudioHeader, BlockCoder, read_m_field, write_m_field};
use crate::entropy::estimate::{bucket_m, mean_abs};
use crate::entropy::golomb::GolombCoder;
use crate::entropy::residual::SignMode;
use crate::transform::dct::DctPlan;
use crate::transform::quant::audio_step;
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::{CodecError, Result};

const FULL_SCALE: f64 = 32767.0;

/// Lossy DCT coder.
///
/// Samples are scaled to `[-1, 1]`, transformed with an orthonormal DCT-II
/// of the block's length, and coefficient `j` is quantized with
/// [`audio_step`]. The levels are Golomb coded.
#[derive(Debug, Clone)]
pub struct TransformCoder {
    coder: GolombCoder,
    initial_m: u32,
    adaptive: bool,
    quantization_level: u8,
    plan: Option<DctPlan>,
}

impl TransformCoder {
    pub fn new(initial_m: u32, sign_mode: SignMode, header: &AudioHeader) -> Result<Self> {
        if header.quantization_level == 0 {
            return Err(CodecError::invalid_stream("quantization level is zero"));
        }
        Ok(Self {
            coder: GolombCoder::new(initial_m, sign_mode)?,
            initial_m,
            adaptive: header.adaptive,
            quantization_level: header.quantization_level,
            plan: None,
        })
    }

    fn plan(&mut self, n: usize) -> Result<&DctPlan> {
        let plan = match self.plan.take() {
            Some(plan) if plan.len() == n => plan,
            _ => DctPlan::new(n)?,
        };
        Ok(self.plan.insert(plan))
    }
}

impl BlockCoder for TransformCoder {
    fn encode_block<W: io::Write>(
        &mut self,
        block: &[i16],
        bs: &mut BitStreamWriter<W>,
    ) -> Result<()> {
        let n = block.len();
        if n == 0 {
            return Ok(());
        }

        let level = self.quantization_level;
        let input: Vec<f64> = block.iter().map(|&s| s as f64 / FULL_SCALE).collect();
        let coeffs = self.plan(n)?.forward(&input)?;
        let levels: Vec<i32> = coeffs
            .iter()
            .enumerate()
            .map(|(j, &c)| (c / audio_step(j, n, level)).round() as i32)
            .collect();

        if self.adaptive && n > 1 {
            write_m_field(&mut self.coder, bucket_m(mean_abs(&levels)), bs)?;
        } else {
            self.coder.set_m(self.initial_m)?;
        }

        for &l in &levels {
            self.coder.encode(l, bs)?;
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

        let level = self.quantization_level;
        let mut coeffs = Vec::with_capacity(len);
        for j in 0..len {
            let l = self.coder.decode(bs)?;
            coeffs.push(l as f64 * audio_step(j, len, level));
        }

        let output = self.plan(len)?.inverse(&coeffs)?;
        Ok(output
            .iter()
            .map(|&y| (y * FULL_SCALE).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16)
            .collect())
    }
}
