#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Every codec in this crate is built from the same parts: a sequential
//! MSB-first bitstream, a Golomb-Rice entropy coder with a truncated-binary
//! remainder, and a prediction stage that turns samples into small residuals.
//!
//! ### Image
//!
//! Per-channel causal prediction (left, above, above-left, ABC, MBC,
//! JPEG-LS), zigzag mapping and one Golomb parameter per channel. Lossless.
//!
//! ### Audio
//!
//! Blocks of up to 1024 interleaved samples, coded either with first-order
//! DPCM, a second-order predictor guarded by a per-block checksum, or a lossy
//! DCT with frequency-dependent step sizes.
//!
//! ### Video
//!
//! Open GOP of I-frames and motion-compensated P-frames, with an optional
//! lossy DCT path (JPEG luma/chroma matrices) and bitrate control mirrored
//! by the decoder.
//!
//! ## Quick Start
//!
//! ```rust
//! use grcodec::codec::image::{ImageCodec, Raster};
//! use grcodec::predict::Predictor;
//! use grcodec::utils::bitstream_io::{BsSliceReader, BsVecWriter};
//!
//! let raster = Raster::new(2, 2, 1, vec![10, 12, 11, 13])?;
//! let codec = ImageCodec::new(Predictor::JpegLs);
//!
//! let mut writer = BsVecWriter::in_memory();
//! codec.encode(&raster, &mut writer)?;
//! let bytes = writer.finish()?;
//!
//! let decoded = codec.decode(&mut BsSliceReader::from_slice(&bytes))?;
//! assert_eq!(decoded, raster);
//! # Ok::<(), grcodec::CodecError>(())
//! ```

/// Domain codecs.
///
/// - **Image** ([`codec::image`]): lossless predictive raster coding
/// - **Audio** ([`codec::audio`]): DPCM, strict and transform block coders
/// - **Video** ([`codec::video`]): I/P-frame coding with motion search
pub mod codec;

/// Entropy coding.
///
/// - **Golomb-Rice** ([`entropy::golomb`]): parameterised prefix code
/// - **Residual mapping** ([`entropy::residual`]): signed to unsigned
/// - **Estimation** ([`entropy::estimate`]): adaptive parameter choice
pub mod entropy;

/// Causal spatial predictors shared by the image and video codecs.
pub mod predict;

/// DCT, quantization and coefficient scan order.
pub mod transform;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading/writing
/// - **Checksum** ([`utils::checksum`]): Block integrity
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;

pub use utils::errors::{CodecError, Result};
