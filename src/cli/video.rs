use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use grcodec::codec::video::{Frame, FrameKind, LossyParams, VideoConfig, VideoDecoder, VideoEncoder};
use indicatif::{MultiProgress, ProgressBar};

use crate::cli::command::{VideoCommand, VideoDecodeArgs, VideoEncodeArgs};
use crate::cli::log_summary;
use crate::cli::progress::maybe_progress_bar;
use crate::config::Profile;
use crate::input::{InputReader, create_output};
use crate::raw::raster_bytes;
use crate::timestamp::time_str;

pub fn cmd_video(
    command: &VideoCommand,
    profile: &Profile,
    multi: Option<&MultiProgress>,
) -> Result<()> {
    match command {
        VideoCommand::Encode(args) => encode(args, profile, multi),
        VideoCommand::Decode(args) => decode(args, profile, multi),
    }
}

pub(crate) fn encode_config(args: &VideoEncodeArgs, profile: &Profile) -> Result<VideoConfig> {
    let mut config = profile.video.config()?;
    if let Some(n) = args.block_size {
        config.block_size = n;
    }
    if let Some(k) = args.i_frame_interval {
        config.i_frame_interval = k;
    }
    if let Some(s) = args.search_range {
        config.search_range = s;
    }
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if args.lossy || args.quantization.is_some() || args.target_bitrate.is_some() {
        let base = config.lossy.unwrap_or_default();
        config.lossy = Some(LossyParams {
            quantization_level: args.quantization.unwrap_or(base.quantization_level),
            target_bitrate: args.target_bitrate.unwrap_or(base.target_bitrate),
        });
    }
    Ok(config)
}

fn finish_bar(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

fn encode(args: &VideoEncodeArgs, profile: &Profile, multi: Option<&MultiProgress>) -> Result<()> {
    let start = Instant::now();
    let config = encode_config(args, profile)?;
    let (width, height) = (args.width as usize, args.height as usize);
    let frame_bytes = raster_bytes(width, height, 3)?;

    let mut input = InputReader::new(&args.io.input)?;
    // The header announces the frame count, so piped input is buffered first.
    let buffered = if input.is_pipe() {
        Some(input.read_all()?)
    } else {
        None
    };
    let total_bytes = match &buffered {
        Some(data) => data.len() as u64,
        None => input.size_hint().unwrap_or(0),
    };
    if frame_bytes == 0 || total_bytes % frame_bytes as u64 != 0 {
        anyhow::bail!(
            "{} holds {total_bytes} bytes, which is not a whole number of {width}x{height} frames",
            args.io.input.display()
        );
    }
    let total_frames = u32::try_from(total_bytes / frame_bytes as u64)
        .context("Too many frames for the 32-bit frame count")?;

    log::info!(
        "Encoding {total_frames} frames of {width}x{height} at {} fps ({}), {}",
        config.fps,
        time_str(total_frames as f64 / config.fps.max(1) as f64),
        match config.lossy {
            Some(l) => format!(
                "lossy, level {}, target {} bits/frame",
                l.quantization_level, l.target_bitrate
            ),
            None => "lossless".to_string(),
        }
    );

    let output = create_output(&args.io.output)?;
    let mut encoder = VideoEncoder::new(&config, args.width, args.height, total_frames, output)?;
    let pb = maybe_progress_bar(multi, total_frames as u64)?;
    let mut intra_frames = 0u32;

    let mut encode_one = |data: &[u8]| -> Result<()> {
        let frame = Frame::from_interleaved(width, height, data)?;
        let kind = encoder.encode_frame(&frame)?;
        if kind == FrameKind::Intra {
            intra_frames += 1;
        }
        if let Some(pb) = &pb {
            pb.inc(1);
            pb.set_message(format!("frame {kind} | level {}", encoder.quantization_level()));
        }
        Ok(())
    };

    match &buffered {
        Some(data) => {
            for chunk in data.chunks_exact(frame_bytes) {
                encode_one(chunk)?;
            }
        }
        None => input.process_records(frame_bytes, encode_one)?,
    }

    let output_bytes = encoder.bits_written().div_ceil(8);
    let mut output = encoder.finish()?;
    output
        .flush()
        .with_context(|| format!("Failed to write {}", args.io.output.display()))?;
    finish_bar(pb);

    log::info!(
        "{intra_frames} I-frames, {} P-frames",
        total_frames - intra_frames
    );
    log_summary("Encoded", input.bytes_read(), output_bytes, start.elapsed());
    Ok(())
}

fn decode(args: &VideoDecodeArgs, profile: &Profile, multi: Option<&MultiProgress>) -> Result<()> {
    let start = Instant::now();
    let config = profile.video.config()?;

    let input = InputReader::new(&args.io.input)?;
    let mut decoder = VideoDecoder::new(&config, input)
        .with_context(|| format!("Failed to read header of {}", args.io.input.display()))?;
    let header = *decoder.header();

    log::info!(
        "Decoding {} frames of {}x{} at {} fps ({})",
        header.total_frames,
        header.width,
        header.height,
        header.fps,
        time_str(header.total_frames as f64 / header.fps.max(1) as f64)
    );

    let mut output = create_output(&args.io.output)?;
    let pb = maybe_progress_bar(multi, header.total_frames as u64)?;
    let mut output_bytes = 0u64;
    let mut index = 0u32;

    while let Some(frame) = decoder
        .decode_frame()
        .with_context(|| format!("Failed to decode frame {index}"))?
    {
        let data = frame.to_interleaved();
        output.write_all(&data)?;
        output_bytes += data.len() as u64;
        index += 1;
        if let Some(pb) = &pb {
            pb.inc(1);
            pb.set_message(format!("level {}", decoder.quantization_level()));
        }
    }
    output
        .flush()
        .with_context(|| format!("Failed to write {}", args.io.output.display()))?;
    finish_bar(pb);

    let input_bytes = decoder.bits_read().div_ceil(8);
    log_summary("Decoded", input_bytes, output_bytes, start.elapsed());
    Ok(())
}
