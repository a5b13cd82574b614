use std::io::Write;

use anyhow::{Context, Result};
use grcodec::codec::audio::AudioHeader;
use grcodec::codec::image::read_image_header;
use grcodec::codec::video::FrameHeader;
use grcodec::utils::bitstream_io::BitStreamReader;
use serde::Serialize;

use crate::cli::command::{InfoArgs, StreamKind};
use crate::input::InputReader;
use crate::timestamp::time_str;

#[derive(Debug, Serialize)]
struct ImageInfo {
    codec: &'static str,
    channels: usize,
    rows: usize,
    cols: usize,
}

#[derive(Debug, Serialize)]
struct AudioInfo {
    codec: &'static str,
    channels: u8,
    sample_count: u32,
    sample_rate: u32,
    duration: String,
    adaptive: bool,
    lossy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantization_level: Option<u8>,
}

#[derive(Debug, Serialize)]
struct VideoInfo {
    codec: &'static str,
    width: u16,
    height: u16,
    block_size: u8,
    i_frame_interval: u8,
    search_range: u8,
    fps: u16,
    total_frames: u32,
    duration: String,
    lossy: Option<LossyInfo>,
}

#[derive(Debug, Serialize)]
struct LossyInfo {
    quantization_level: u8,
    target_bitrate: u32,
}

impl From<AudioHeader> for AudioInfo {
    fn from(h: AudioHeader) -> Self {
        let frames = h.sample_count / u32::from(h.channels.max(1));
        let duration = if h.sample_rate == 0 {
            0.0
        } else {
            frames as f64 / h.sample_rate as f64
        };
        Self {
            codec: "audio",
            channels: h.channels,
            sample_count: h.sample_count,
            sample_rate: h.sample_rate,
            duration: time_str(duration),
            adaptive: h.adaptive,
            lossy: h.lossy,
            quantization_level: h.lossy.then_some(h.quantization_level),
        }
    }
}

impl From<FrameHeader> for VideoInfo {
    fn from(h: FrameHeader) -> Self {
        Self {
            codec: "video",
            width: h.width,
            height: h.height,
            block_size: h.block_size,
            i_frame_interval: h.i_frame_interval,
            search_range: h.search_range,
            fps: h.fps,
            total_frames: h.total_frames,
            duration: time_str(h.total_frames as f64 / h.fps.max(1) as f64),
            lossy: h.lossy.map(|l| LossyInfo {
                quantization_level: l.quantization_level,
                target_bitrate: l.target_bitrate,
            }),
        }
    }
}

/// Reads just the stream header and renders it as YAML.
pub(crate) fn header_yaml<R: std::io::Read>(kind: StreamKind, reader: R) -> Result<String> {
    let mut bs = BitStreamReader::new(reader);
    let yaml = match kind {
        StreamKind::Image => {
            let (channels, rows, cols) = read_image_header(&mut bs)?;
            serde_yaml_ng::to_string(&ImageInfo {
                codec: "image",
                channels,
                rows,
                cols,
            })?
        }
        StreamKind::Audio => serde_yaml_ng::to_string(&AudioInfo::from(AudioHeader::read(&mut bs)?))?,
        StreamKind::Video => serde_yaml_ng::to_string(&VideoInfo::from(FrameHeader::read(&mut bs)?))?,
    };
    Ok(yaml)
}

pub fn cmd_info(args: &InfoArgs) -> Result<()> {
    let input = InputReader::new(&args.input)?;
    let yaml = header_yaml(args.kind, input)
        .with_context(|| format!("Failed to read {:?} header of {}", args.kind, args.input.display()))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(yaml.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grcodec::codec::audio::{AudioConfig, PcmBuffer, encode_audio};
    use grcodec::codec::image::{ImageCodec, Raster};
    use grcodec::codec::video::{Frame, VideoConfig, encode_video};
    use grcodec::predict::Predictor;
    use grcodec::utils::bitstream_io::BsVecWriter;

    #[test]
    fn image_header() {
        let raster = Raster::new(3, 5, 2, vec![7; 30]).unwrap();
        let mut bs = BsVecWriter::in_memory();
        ImageCodec::new(Predictor::Left).encode(&raster, &mut bs).unwrap();
        let bytes = bs.finish().unwrap();

        let yaml = header_yaml(StreamKind::Image, bytes.as_slice()).unwrap();
        assert!(yaml.contains("channels: 2"));
        assert!(yaml.contains("rows: 3"));
        assert!(yaml.contains("cols: 5"));
    }

    #[test]
    fn audio_header() {
        let pcm = PcmBuffer::new(2, 8000, vec![0; 16_000]);
        let bytes = encode_audio(&AudioConfig::default(), &pcm).unwrap();

        let yaml = header_yaml(StreamKind::Audio, bytes.as_slice()).unwrap();
        assert!(yaml.contains("sample_count: 16000"));
        assert!(yaml.contains("sample_rate: 8000"));
        assert!(yaml.contains("duration: 00:00:01.000"));
        assert!(!yaml.contains("quantization_level"));
    }

    #[test]
    fn video_header() {
        let frames = vec![Frame::new(4, 2); 3];
        let bytes = encode_video(&VideoConfig::default(), &frames).unwrap();

        let yaml = header_yaml(StreamKind::Video, bytes.as_slice()).unwrap();
        assert!(yaml.contains("width: 4"));
        assert!(yaml.contains("total_frames: 3"));
        assert!(yaml.contains("lossy: null"));
    }

    #[test]
    fn truncated_header_fails() {
        assert!(header_yaml(StreamKind::Video, [0u8, 4].as_slice()).is_err());
    }
}
