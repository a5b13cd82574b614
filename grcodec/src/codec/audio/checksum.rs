use std::io;

use super::BlockCoder;
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::checksum::block_checksum;
use crate::utils::errors::{CodecError, Result};

/// Appends a 32-bit XOR-shift checksum of the block's samples after the
/// payload of the wrapped coder, and verifies it on decode.
#[derive(Debug, Clone)]
pub struct Checksummed<C> {
    inner: C,
    block_index: u64,
}

impl<C: BlockCoder> Checksummed<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            block_index: 0,
        }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: BlockCoder> BlockCoder for Checksummed<C> {
    fn encode_block<W: io::Write>(
        &mut self,
        block: &[i16],
        bs: &mut BitStreamWriter<W>,
    ) -> Result<()> {
        self.inner.encode_block(block, bs)?;
        bs.write_bits(block_checksum(block) as u64, 32)?;
        self.block_index += 1;
        Ok(())
    }

    fn decode_block<R: io::Read>(
        &mut self,
        len: usize,
        bs: &mut BitStreamReader<R>,
    ) -> Result<Vec<i16>> {
        let samples = self.inner.decode_block(len, bs)?;
        let read = bs.read_bits(32)? as u32;
        let calculated = block_checksum(&samples);

        if read != calculated {
            return Err(CodecError::ChecksumMismatch {
                block: self.block_index,
                calculated,
                read,
            });
        }

        self.block_index += 1;
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::audio::{Dpcm, SecondOrder};
    use crate::entropy::residual::SignMode;
    use crate::utils::bitstream_io::{BsSliceReader, BsVecWriter};

    #[test]
    fn checksum_trails_the_payload() -> Result<()> {
        let block = [3, -7, 12, 12, 0];
        let mut plain = Dpcm::new(8, SignMode::Interleaved, false)?;
        let mut writer = BsVecWriter::in_memory();
        plain.encode_block(&block, &mut writer)?;
        let plain_bits = writer.bits_written();

        let mut coder = Checksummed::new(Dpcm::new(8, SignMode::Interleaved, false)?);
        let mut writer = BsVecWriter::in_memory();
        coder.encode_block(&block, &mut writer)?;
        assert_eq!(writer.bits_written(), plain_bits + 32);
        Ok(())
    }

    #[test]
    fn second_block_mismatch_reports_index() -> Result<()> {
        let blocks: [&[i16]; 2] = [&[1, 2, 3], &[4, 5, 6]];
        let mut coder = Checksummed::new(SecondOrder::new(8, true)?);
        let mut writer = BsVecWriter::in_memory();
        for block in blocks {
            coder.encode_block(block, &mut writer)?;
        }
        // a valid block followed by a forged checksum
        Dpcm::new(8, SignMode::Interleaved, false)?.encode_block(&[9], &mut writer)?;
        writer.write_bits(0xDEAD_BEEF, 32)?;
        let bytes = writer.finish()?;

        let mut decoder = Checksummed::new(SecondOrder::new(8, true)?);
        let mut reader = BsSliceReader::from_slice(&bytes);
        assert_eq!(decoder.decode_block(3, &mut reader)?, vec![1, 2, 3]);
        assert_eq!(decoder.decode_block(3, &mut reader)?, vec![4, 5, 6]);
        match decoder.decode_block(1, &mut reader) {
            Err(CodecError::ChecksumMismatch { block, read, .. }) => {
                assert_eq!(block, 2);
                assert_eq!(read, 0xDEAD_BEEF);
            }
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
        Ok(())
    }
}
