/// Audio coding of interleaved 16-bit PCM.
///
/// Provides the [`AudioCodec`](audio::AudioCodec) driver and the
/// [`BlockCoder`](audio::BlockCoder) implementations it dispatches to.
pub mod audio;

/// Lossless predictive coding of 8-bit rasters.
///
/// Provides the [`ImageCodec`](image::ImageCodec) and its
/// [`Raster`](image::Raster) input.
pub mod image;

/// I/P-frame video coding with motion compensation.
///
/// Provides the streaming [`VideoEncoder`](video::VideoEncoder) and
/// [`VideoDecoder`](video::VideoDecoder).
pub mod video;
