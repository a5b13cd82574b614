//! Block transforms shared by the lossy audio and video paths.
//!
//! - [`dct`]: orthonormal DCT-II / DCT-III, 1-D and separable 2-D.
//! - [`quant`]: quantization matrices (JPEG luma/chroma) and audio step sizes.
//! - [`zigzag`]: zig-zag coefficient scan for square blocks.

pub mod dct;
pub mod quant;
pub mod zigzag;

pub use dct::DctPlan;
pub use quant::QuantMatrix;
pub use zigzag::ZigzagScan;
