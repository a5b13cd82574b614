use std::io;

use super::rate::{MAX_QUANTIZATION_LEVEL, MIN_QUANTIZATION_LEVEL};
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::{CodecError, Result};

/// Parameters of the lossy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LossyParams {
    /// Initial quantization multiplier.
    pub quantization_level: u8,
    /// Average bits per frame to steer towards; 0 turns rate control off.
    pub target_bitrate: u32,
}

impl Default for LossyParams {
    fn default() -> Self {
        Self {
            quantization_level: 1,
            target_bitrate: 0,
        }
    }
}

/// Stream header, written once before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u16,
    pub height: u16,
    pub block_size: u8,
    pub i_frame_interval: u8,
    pub search_range: u8,
    pub fps: u16,
    pub total_frames: u32,
    pub lossy: Option<LossyParams>,
}

impl FrameHeader {
    pub fn write<W: io::Write>(&self, bs: &mut BitStreamWriter<W>) -> Result<()> {
        bs.write_bits(self.width as u64, 16)?;
        bs.write_bits(self.height as u64, 16)?;
        bs.write_bits(self.block_size as u64, 8)?;
        bs.write_bits(self.i_frame_interval as u64, 8)?;
        bs.write_bits(self.search_range as u64, 8)?;
        bs.write_bits(self.fps as u64, 16)?;
        bs.write_bits(self.total_frames as u64, 32)?;
        bs.write_bit(self.lossy.is_some())?;
        if let Some(lossy) = self.lossy {
            bs.write_bits(lossy.quantization_level as u64, 8)?;
            bs.write_bits(lossy.target_bitrate as u64, 32)?;
        }
        Ok(())
    }

    pub fn read<R: io::Read>(bs: &mut BitStreamReader<R>) -> Result<Self> {
        let width = bs.read_bits(16)? as u16;
        let height = bs.read_bits(16)? as u16;
        let block_size = bs.read_bits(8)? as u8;
        let i_frame_interval = bs.read_bits(8)? as u8;
        let search_range = bs.read_bits(8)? as u8;
        let fps = bs.read_bits(16)? as u16;
        let total_frames = bs.read_bits(32)? as u32;
        let lossy = if bs.read_bit()? {
            Some(LossyParams {
                quantization_level: bs.read_bits(8)? as u8,
                target_bitrate: bs.read_bits(32)? as u32,
            })
        } else {
            None
        };

        let header = Self {
            width,
            height,
            block_size,
            i_frame_interval,
            search_range,
            fps,
            total_frames,
            lossy,
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(CodecError::invalid_stream("block size is zero"));
        }
        if self.i_frame_interval == 0 {
            return Err(CodecError::invalid_stream("I-frame interval is zero"));
        }
        if let Some(l) = self.lossy {
            if !(MIN_QUANTIZATION_LEVEL..=MAX_QUANTIZATION_LEVEL).contains(&l.quantization_level) {
                return Err(CodecError::invalid_stream(format!(
                    "quantization level {} is outside {MIN_QUANTIZATION_LEVEL}..={MAX_QUANTIZATION_LEVEL}",
                    l.quantization_level
                )));
            }
        }
        Ok(())
    }

    pub fn is_lossy(&self) -> bool {
        self.lossy.is_some()
    }

    /// Size of a decoded frame in interleaved bytes.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * super::frame::FRAME_CHANNELS
    }
}
