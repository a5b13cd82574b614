use std::io;

use log::debug;

use super::coder::FrameCoder;
use super::frame::{Frame, FrameKind};
use super::header::FrameHeader;
use super::rate::RateController;
use super::VideoConfig;
use crate::utils::bitstream_io::BitStreamWriter;
use crate::utils::errors::{CodecError, Result};

/// Streaming video encoder.
///
/// The header is written on construction; frames are then fed one at a time
/// and the stream is closed with [`VideoEncoder::finish`].
pub struct VideoEncoder<W: io::Write> {
    header: FrameHeader,
    coder: FrameCoder,
    bs: BitStreamWriter<W>,
    reference: Option<Frame>,
    index: u32,
    level: u8,
    rate: Option<RateController>,
}

impl<W: io::Write> VideoEncoder<W> {
    pub fn new(
        config: &VideoConfig,
        width: u16,
        height: u16,
        total_frames: u32,
        writer: W,
    ) -> Result<Self> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(CodecError::invalid_argument(format!(
                "frame size must be non-zero, got {width}x{height}"
            )));
        }

        let header = config.header(width, height, total_frames);
        let mut bs = BitStreamWriter::new(writer);
        header.write(&mut bs)?;
        debug!("{header:?}");

        Ok(Self {
            coder: FrameCoder::new(&header, config)?,
            bs,
            reference: None,
            index: 0,
            level: header.lossy.map_or(0, |l| l.quantization_level),
            rate: header.lossy.and_then(|l| RateController::new(l.target_bitrate)),
            header,
        })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Reconstruction of the last encoded frame, as the decoder will see it.
    pub fn reference(&self) -> Option<&Frame> {
        self.reference.as_ref()
    }

    /// Current quantization level (0 in lossless mode).
    pub fn quantization_level(&self) -> u8 {
        self.level
    }

    pub fn bits_written(&self) -> u64 {
        self.bs.bits_written()
    }

    pub fn encode_frame(&mut self, frame: &Frame) -> Result<FrameKind> {
        let header = &self.header;
        frame.check_dimensions(header.width as usize, header.height as usize)?;
        if self.index >= header.total_frames {
            return Err(CodecError::DimensionMismatch {
                what: "frame count",
                expected: header.total_frames as usize,
                actual: self.index as usize + 1,
            });
        }

        let kind = FrameKind::for_index(self.index, header.i_frame_interval);
        let start = self.bs.bits_written();
        self.bs.write_bit(kind.is_intra())?;

        let recon = match (&self.reference, kind) {
            (Some(reference), FrameKind::Inter) => {
                self.coder.encode_inter(frame, reference, self.level, &mut self.bs)?
            }
            _ => self.coder.encode_intra(frame, self.level, &mut self.bs)?,
        };
        self.reference = Some(recon);

        let frame_bits = self.bs.bits_written() - start;
        debug!("frame {} ({kind}): {frame_bits} bits, level {}", self.index, self.level);

        if let Some(rate) = self.rate.as_mut() {
            self.level = rate.update(frame_bits, self.level);
        }
        self.index += 1;
        Ok(kind)
    }

    /// Flushes the stream and returns the writer. Fails if fewer frames were
    /// encoded than the header announced.
    pub fn finish(self) -> Result<W> {
        if self.index != self.header.total_frames {
            return Err(CodecError::DimensionMismatch {
                what: "frame count",
                expected: self.header.total_frames as usize,
                actual: self.index as usize,
            });
        }
        self.bs.finish()
    }
}
