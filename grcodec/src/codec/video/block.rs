use std::io;

use crate::transform::{DctPlan, QuantMatrix, ZigzagScan};
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::{CodecError, Result};

/// Offset that turns a clamped coefficient level into an 8-bit code.
const LEVEL_OFFSET: i32 = 128;

/// Size and quantization matrices of the lossy block transform.
///
/// Not part of the stream: encoder and decoder must agree on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    pub size: usize,
    pub luma: QuantMatrix,
    pub chroma: QuantMatrix,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            size: 8,
            luma: QuantMatrix::jpeg_luma(),
            chroma: QuantMatrix::jpeg_chroma(),
        }
    }
}

impl TransformConfig {
    pub fn validate(&self) -> Result<()> {
        for (what, m) in [("luma matrix size", &self.luma), ("chroma matrix size", &self.chroma)] {
            if m.size() != self.size {
                return Err(CodecError::DimensionMismatch {
                    what,
                    expected: self.size,
                    actual: m.size(),
                });
            }
        }
        Ok(())
    }
}

/// DCT, quantization and zig-zag serialization of one square block.
#[derive(Debug, Clone)]
pub(crate) struct BlockTransform {
    size: usize,
    plan: DctPlan,
    scan: ZigzagScan,
    luma: QuantMatrix,
    chroma: QuantMatrix,
}

impl BlockTransform {
    pub fn new(config: &TransformConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            size: config.size,
            plan: DctPlan::new(config.size)?,
            scan: ZigzagScan::new(config.size)?,
            luma: config.luma.clone(),
            chroma: config.chroma.clone(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn matrix(&self, channel: usize) -> &QuantMatrix {
        if channel == 0 { &self.luma } else { &self.chroma }
    }

    /// Codes a row-major `size x size` block and returns what the decoder will
    /// reconstruct from it.
    pub fn encode<W: io::Write>(
        &self,
        mut block: Vec<f64>,
        channel: usize,
        level: u8,
        bs: &mut BitStreamWriter<W>,
    ) -> Result<Vec<f64>> {
        self.plan.forward_2d(&mut block)?;
        let levels: Vec<i32> = self
            .matrix(channel)
            .quantize(&block, level)?
            .into_iter()
            .map(|l| l.clamp(-LEVEL_OFFSET, LEVEL_OFFSET - 1))
            .collect();

        for l in self.scan.scan(&levels)? {
            bs.write_bits((l + LEVEL_OFFSET) as u64, 8)?;
        }

        self.reconstruct(&levels, channel, level)
    }

    pub fn decode<R: io::Read>(
        &self,
        channel: usize,
        level: u8,
        bs: &mut BitStreamReader<R>,
    ) -> Result<Vec<f64>> {
        let scanned = (0..self.size * self.size)
            .map(|_| Ok(bs.read_bits(8)? as i32 - LEVEL_OFFSET))
            .collect::<Result<Vec<_>>>()?;
        let levels = self.scan.unscan(&scanned)?;
        self.reconstruct(&levels, channel, level)
    }

    fn reconstruct(&self, levels: &[i32], channel: usize, level: u8) -> Result<Vec<f64>> {
        let mut block = self.matrix(channel).dequantize(levels, level)?;
        self.plan.inverse_2d(&mut block)?;
        Ok(block)
    }
}

#[inline(always)]
pub(crate) fn to_pixel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::{BsSliceReader, BsVecWriter};

    #[test]
    fn encoder_and_decoder_agree() -> Result<()> {
        let bt = BlockTransform::new(&TransformConfig::default())?;
        let block: Vec<f64> = (0..64).map(|i| ((i * 29) % 200) as f64 - 100.0).collect();

        let mut writer = BsVecWriter::in_memory();
        let encoded = bt.encode(block.clone(), 0, 1, &mut writer)?;
        let chroma = bt.encode(block, 1, 3, &mut writer)?;
        assert_eq!(writer.bits_written(), 2 * 64 * 8);
        let bytes = writer.finish()?;

        let mut reader = BsSliceReader::from_slice(&bytes);
        assert_eq!(bt.decode(0, 1, &mut reader)?, encoded);
        assert_eq!(bt.decode(1, 3, &mut reader)?, chroma);
        Ok(())
    }

    #[test]
    fn flat_block_is_exact() -> Result<()> {
        let bt = BlockTransform::new(&TransformConfig::default())?;
        // DC = 8 * 32 = 256 = 16 * 16
        let mut writer = BsVecWriter::in_memory();
        let out = bt.encode(vec![32.0; 64], 0, 1, &mut writer)?;
        assert!(out.iter().all(|v| (v - 32.0).abs() < 1e-9));
        let bytes = writer.finish()?;
        assert_eq!(bytes[0], 128 + 16);
        assert!(bytes[1..].iter().all(|&b| b == 128));
        Ok(())
    }

    #[test]
    fn levels_are_clamped() -> Result<()> {
        let config = TransformConfig {
            size: 2,
            luma: QuantMatrix::flat(2, 1)?,
            chroma: QuantMatrix::flat(2, 1)?,
        };
        let bt = BlockTransform::new(&config)?;
        let mut writer = BsVecWriter::in_memory();
        bt.encode(vec![1000.0, 1000.0, -1000.0, -1000.0], 0, 1, &mut writer)?;
        let bytes = writer.finish()?;
        // DC = 0, vertical coefficient = 2000 -> clamped to 127
        let mut reader = BsSliceReader::from_slice(&bytes);
        let codes: Vec<u64> = (0..4).map(|_| reader.read_bits(8)).collect::<Result<_>>()?;
        assert_eq!(codes, vec![128, 128, 255, 128]);
        Ok(())
    }

    #[test]
    fn mismatched_matrices() -> Result<()> {
        let config = TransformConfig {
            size: 4,
            ..TransformConfig::default()
        };
        assert!(BlockTransform::new(&config).is_err());
        Ok(())
    }

    #[test]
    fn pixel_rounding() {
        assert_eq!(to_pixel(-3.2), 0);
        assert_eq!(to_pixel(127.5), 128);
        assert_eq!(to_pixel(300.0), 255);
    }
}
