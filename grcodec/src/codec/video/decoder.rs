use std::io;

use log::debug;

use super::coder::FrameCoder;
use super::frame::Frame;
use super::header::FrameHeader;
use super::rate::RateController;
use super::VideoConfig;
use crate::utils::bitstream_io::BitStreamReader;
use crate::utils::errors::{CodecError, Result};

/// Streaming video decoder. Also iterates over the decoded frames.
pub struct VideoDecoder<R: io::Read> {
    header: FrameHeader,
    coder: FrameCoder,
    bs: BitStreamReader<R>,
    reference: Option<Frame>,
    index: u32,
    level: u8,
    rate: Option<RateController>,
    failed: bool,
}

impl<R: io::Read> VideoDecoder<R> {
    /// Reads the stream header. The transform settings and intra predictor
    /// are taken from `config`.
    pub fn new(config: &VideoConfig, reader: R) -> Result<Self> {
        config.transform.validate()?;
        let mut bs = BitStreamReader::new(reader);
        let header = FrameHeader::read(&mut bs)?;
        debug!("{header:?}");

        Ok(Self {
            coder: FrameCoder::new(&header, config)?,
            bs,
            reference: None,
            index: 0,
            level: header.lossy.map_or(0, |l| l.quantization_level),
            rate: header.lossy.and_then(|l| RateController::new(l.target_bitrate)),
            failed: false,
            header,
        })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn quantization_level(&self) -> u8 {
        self.level
    }

    pub fn bits_read(&self) -> u64 {
        self.bs.bits_read()
    }

    /// Next frame, or `None` once all announced frames have been decoded.
    pub fn decode_frame(&mut self) -> Result<Option<Frame>> {
        if self.index >= self.header.total_frames {
            return Ok(None);
        }

        let start = self.bs.bits_read();
        let intra = self.bs.read_bit()?;

        let frame = if intra {
            self.coder.decode_intra(self.level, &mut self.bs)?
        } else {
            let reference = self.reference.as_ref().ok_or_else(|| {
                CodecError::invalid_stream(format!(
                    "frame {} is a P-frame without a reference",
                    self.index
                ))
            })?;
            self.coder.decode_inter(reference, self.level, &mut self.bs)?
        };

        let frame_bits = self.bs.bits_read() - start;
        debug!(
            "frame {} ({}): {frame_bits} bits, level {}",
            self.index,
            if intra { "I" } else { "P" },
            self.level
        );

        if let Some(rate) = self.rate.as_mut() {
            self.level = rate.update(frame_bits, self.level);
        }
        self.index += 1;
        self.reference = Some(frame.clone());
        Ok(Some(frame))
    }
}

impl<R: io::Read> Iterator for VideoDecoder<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.decode_frame().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
