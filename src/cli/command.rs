use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use grcodec::predict::Predictor;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ")\ngrcodec ",
    env!("GRCODEC_VERSION"),
    "\nbuilt ",
    env!("BUILD_TIMESTAMP"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about        = "Predictive Golomb-Rice coding of raw images, PCM audio and video",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// YAML profile with default codec settings.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Encode or decode 8-bit interleaved rasters.
    #[command(subcommand)]
    Image(ImageCommand),

    /// Encode or decode 16-bit little-endian PCM.
    #[command(subcommand)]
    Audio(AudioCommand),

    /// Encode or decode sequences of 8-bit three-channel frames.
    #[command(subcommand)]
    Video(VideoCommand),

    /// Print the header of an encoded stream
    Info(InfoArgs),
}

/// Input and output shared by every encode and decode command.
#[derive(Debug, Args)]
pub struct IoArgs {
    /// Input file (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (use "-" for stdout).
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum ImageCommand {
    /// Compress a raw raster.
    Encode(ImageEncodeArgs),
    /// Restore a raw raster.
    Decode(ImageDecodeArgs),
}

#[derive(Debug, Args)]
pub struct ImageEncodeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Raster width in pixels.
    #[arg(long)]
    pub width: usize,

    /// Raster height in pixels.
    #[arg(long)]
    pub height: usize,

    /// Interleaved channels per pixel.
    #[arg(long, default_value_t = 1)]
    pub channels: usize,

    /// Spatial predictor (left, above, above-left, abc, mbc, jpeg-ls).
    #[arg(long)]
    pub predictor: Option<Predictor>,
}

#[derive(Debug, Args)]
pub struct ImageDecodeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Predictor the stream was encoded with.
    #[arg(long)]
    pub predictor: Option<Predictor>,
}

#[derive(Debug, Subcommand)]
pub enum AudioCommand {
    /// Compress raw PCM.
    Encode(AudioEncodeArgs),
    /// Restore raw PCM.
    Decode(AudioDecodeArgs),
}

#[derive(Debug, Args)]
pub struct AudioEncodeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Interleaved channels in the input.
    #[arg(long, default_value_t = 1)]
    pub channels: u8,

    /// Sample rate recorded in the stream header.
    #[arg(long, default_value_t = 44_100)]
    pub sample_rate: u32,

    /// Use the DCT block coder.
    #[arg(long)]
    pub lossy: bool,

    /// Estimate the Golomb parameter per block.
    #[arg(long)]
    pub adaptive: bool,

    /// Quantization level of the lossy coder (1-255).
    #[arg(long, value_name = "Q")]
    pub quantization: Option<u8>,

    /// Samples per block.
    #[arg(long, value_name = "N")]
    pub block_size: Option<usize>,

    /// Second-order prediction with per-block checksums.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct AudioDecodeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// The stream was encoded with --strict.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Subcommand)]
pub enum VideoCommand {
    /// Compress raw frames.
    Encode(VideoEncodeArgs),
    /// Restore raw frames.
    Decode(VideoDecodeArgs),
}

#[derive(Debug, Args)]
pub struct VideoEncodeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Frame width in pixels.
    #[arg(long)]
    pub width: u16,

    /// Frame height in pixels.
    #[arg(long)]
    pub height: u16,

    /// Frame rate recorded in the stream header.
    #[arg(long)]
    pub fps: Option<u16>,

    /// Code residuals through the block DCT.
    #[arg(long)]
    pub lossy: bool,

    /// Initial quantization level of the lossy mode.
    #[arg(long, value_name = "Q")]
    pub quantization: Option<u8>,

    /// Average bits per frame to steer towards (0 disables rate control).
    #[arg(long, value_name = "BITS")]
    pub target_bitrate: Option<u32>,

    /// Motion estimation block size.
    #[arg(long, value_name = "N")]
    pub block_size: Option<u8>,

    /// Distance between I-frames.
    #[arg(long, value_name = "K")]
    pub i_frame_interval: Option<u8>,

    /// Motion search range in pixels.
    #[arg(long, value_name = "S")]
    pub search_range: Option<u8>,
}

#[derive(Debug, Args)]
pub struct VideoDecodeArgs {
    #[command(flatten)]
    pub io: IoArgs,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Encoded stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Codec the stream was produced by.
    #[arg(long, value_enum)]
    pub kind: StreamKind,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StreamKind {
    Image,
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text with timestamps.
    Plain,
    /// One JSON object per log record.
    Json,
}
