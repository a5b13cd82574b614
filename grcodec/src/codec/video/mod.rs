//! Block-based video coding with I-frames and motion-compensated P-frames.
//!
//! Frame `i` is an I-frame when `i % i_frame_interval == 0` and a P-frame
//! otherwise; its kind is also sent as the first bit of the frame.
//!
//! - I-frames are sent either as raw 8-bit planes, as predictive Golomb coded
//!   planes (when an intra predictor is configured), or in lossy mode as
//!   DCT blocks quantized with the luma/chroma matrices.
//! - P-frames carry one motion vector per block followed by the residual
//!   against the previous reconstructed frame, clipped to 8 bits (lossless)
//!   or DCT coded (lossy).
//!
//! In lossy mode with a target bitrate, the quantization level is adjusted
//! after each frame by [`RateController`] on both sides.
//!
//! ```
//! use grcodec::codec::video::{Frame, VideoConfig, decode_video, encode_video};
//!
//! let frames = vec![Frame::new(16, 16); 3];
//! let config = VideoConfig::default();
//! let bytes = encode_video(&config, &frames)?;
//! let (header, decoded) = decode_video(&config, &bytes)?;
//! assert_eq!(header.total_frames, 3);
//! assert_eq!(decoded, frames);
//! # Ok::<(), grcodec::CodecError>(())
//! ```

mod block;
mod coder;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod header;
pub mod motion;
pub mod rate;

pub use block::TransformConfig;
pub use decoder::VideoDecoder;
pub use encoder::VideoEncoder;
pub use frame::{Frame, FrameKind};
pub use header::{FrameHeader, LossyParams};
pub use motion::{MotionVector, find_motion_vector};
pub use rate::RateController;

use std::io;

use crate::predict::Predictor;
use rate::{MAX_QUANTIZATION_LEVEL, MIN_QUANTIZATION_LEVEL};
use crate::utils::errors::{CodecError, Result};

pub const DEFAULT_BLOCK_SIZE: u8 = 16;
pub const DEFAULT_I_FRAME_INTERVAL: u8 = 10;
pub const DEFAULT_SEARCH_RANGE: u8 = 16;
pub const DEFAULT_FPS: u16 = 30;
pub const MAX_SEARCH_RANGE: u8 = 127;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoConfig {
    pub block_size: u8,
    pub i_frame_interval: u8,
    pub search_range: u8,
    pub fps: u16,
    pub lossy: Option<LossyParams>,
    pub transform: TransformConfig,
    /// Predictor for lossless I-frames; `None` sends raw samples. Not part
    /// of the stream.
    pub intra_predictor: Option<Predictor>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            i_frame_interval: DEFAULT_I_FRAME_INTERVAL,
            search_range: DEFAULT_SEARCH_RANGE,
            fps: DEFAULT_FPS,
            lossy: None,
            transform: TransformConfig::default(),
            intra_predictor: None,
        }
    }
}

impl VideoConfig {
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(CodecError::invalid_argument("block size must be non-zero"));
        }
        if self.i_frame_interval == 0 {
            return Err(CodecError::invalid_argument(
                "I-frame interval must be at least 1",
            ));
        }
        if self.search_range > MAX_SEARCH_RANGE {
            return Err(CodecError::invalid_argument(format!(
                "search range must be at most {MAX_SEARCH_RANGE}, got {}",
                self.search_range
            )));
        }
        if let Some(l) = self.lossy {
            if !(MIN_QUANTIZATION_LEVEL..=MAX_QUANTIZATION_LEVEL).contains(&l.quantization_level) {
                return Err(CodecError::invalid_argument(format!(
                    "quantization level must be between {MIN_QUANTIZATION_LEVEL} and {MAX_QUANTIZATION_LEVEL}, got {}",
                    l.quantization_level
                )));
            }
        }
        self.transform.validate()
    }

    pub fn header(&self, width: u16, height: u16, total_frames: u32) -> FrameHeader {
        FrameHeader {
            width,
            height,
            block_size: self.block_size,
            i_frame_interval: self.i_frame_interval,
            search_range: self.search_range,
            fps: self.fps,
            total_frames,
            lossy: self.lossy,
        }
    }
}

/// Encodes a whole sequence into a byte buffer.
pub fn encode_video(config: &VideoConfig, frames: &[Frame]) -> Result<Vec<u8>> {
    let (width, height) = frames
        .first()
        .map_or((0, 0), |f| (f.width(), f.height()));
    let width = u16::try_from(width)
        .map_err(|_| CodecError::invalid_argument(format!("frame width {width} exceeds 65535")))?;
    let height = u16::try_from(height)
        .map_err(|_| CodecError::invalid_argument(format!("frame height {height} exceeds 65535")))?;
    let total = u32::try_from(frames.len())
        .map_err(|_| CodecError::invalid_argument("too many frames"))?;

    let mut encoder = VideoEncoder::new(config, width, height, total, Vec::new())?;
    for frame in frames {
        encoder.encode_frame(frame)?;
    }
    encoder.finish()
}

pub fn decode_video(config: &VideoConfig, bytes: &[u8]) -> Result<(FrameHeader, Vec<Frame>)> {
    let decoder = VideoDecoder::new(config, io::Cursor::new(bytes))?;
    let header = *decoder.header();
    let frames = decoder.collect::<Result<Vec<_>>>()?;
    Ok((header, frames))
}
