use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use grcodec::codec::audio::{AudioConfig, PcmBuffer, decode_audio, encode_audio};

use crate::cli::command::{AudioCommand, AudioDecodeArgs, AudioEncodeArgs};
use crate::cli::log_summary;
use crate::config::Profile;
use crate::input::{InputReader, create_output};
use crate::raw::{pcm_from_s16le, pcm_to_s16le};
use crate::timestamp::time_str;

pub fn cmd_audio(command: &AudioCommand, profile: &Profile) -> Result<()> {
    match command {
        AudioCommand::Encode(args) => encode(args, profile),
        AudioCommand::Decode(args) => decode(args, profile),
    }
}

fn make_strict(config: &mut AudioConfig) {
    config.adaptive = true;
    config.second_order = true;
    config.checksum = true;
}

/// Profile settings with the encode flags applied on top.
pub(crate) fn encode_config(args: &AudioEncodeArgs, profile: &Profile) -> AudioConfig {
    let mut config = profile.audio.config();
    if args.strict {
        make_strict(&mut config);
    }
    if args.lossy {
        config.lossy = true;
    }
    if args.adaptive {
        config.adaptive = true;
    }
    if let Some(q) = args.quantization {
        config.quantization_level = q;
    }
    if let Some(n) = args.block_size {
        config.block_size = n;
    }
    config
}

/// Whether the stream is lossy is read from its header, so only the
/// out-of-band strict settings matter here.
pub(crate) fn decode_config(args: &AudioDecodeArgs, profile: &Profile) -> AudioConfig {
    let mut config = profile.audio.config();
    config.lossy = false;
    if args.strict {
        make_strict(&mut config);
    }
    config
}

fn duration_secs(pcm: &PcmBuffer) -> f64 {
    if pcm.sample_rate == 0 {
        0.0
    } else {
        pcm.frames() as f64 / pcm.sample_rate as f64
    }
}

fn encode(args: &AudioEncodeArgs, profile: &Profile) -> Result<()> {
    let start = Instant::now();
    let config = encode_config(args, profile);

    let raw = InputReader::new(&args.io.input)?.read_all()?;
    let samples = pcm_from_s16le(&raw)?;
    if args.channels > 0 && samples.len() % args.channels as usize != 0 {
        log::warn!(
            "{} samples do not split evenly into {} channels",
            samples.len(),
            args.channels
        );
    }
    let pcm = PcmBuffer::new(args.channels, args.sample_rate, samples);

    log::info!(
        "Encoding {} samples, {} channel(s) at {} Hz ({}), {}{}",
        pcm.samples.len(),
        pcm.channels,
        pcm.sample_rate,
        time_str(duration_secs(&pcm)),
        if config.lossy { "lossy" } else { "lossless" },
        if config.is_strict() { ", strict" } else { "" }
    );

    let bytes = encode_audio(&config, &pcm)?;

    let mut output = create_output(&args.io.output)?;
    output
        .write_all(&bytes)
        .and_then(|_| output.flush())
        .with_context(|| format!("Failed to write {}", args.io.output.display()))?;

    log_summary("Encoded", raw.len() as u64, bytes.len() as u64, start.elapsed());
    Ok(())
}

fn decode(args: &AudioDecodeArgs, profile: &Profile) -> Result<()> {
    let start = Instant::now();
    let config = decode_config(args, profile);

    let bytes = InputReader::new(&args.io.input)?.read_all()?;
    let pcm = decode_audio(&config, &bytes)
        .with_context(|| format!("Failed to decode {}", args.io.input.display()))?;

    log::info!(
        "Decoded {} samples, {} channel(s) at {} Hz ({})",
        pcm.samples.len(),
        pcm.channels,
        pcm.sample_rate,
        time_str(duration_secs(&pcm))
    );

    let raw = pcm_to_s16le(&pcm.samples);
    let mut output = create_output(&args.io.output)?;
    output
        .write_all(&raw)
        .and_then(|_| output.flush())
        .with_context(|| format!("Failed to write {}", args.io.output.display()))?;

    log_summary("Decoded", bytes.len() as u64, raw.len() as u64, start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::IoArgs;

    fn encode_args() -> AudioEncodeArgs {
        AudioEncodeArgs {
            io: IoArgs {
                input: "in.pcm".into(),
                output: "out.grc".into(),
            },
            channels: 2,
            sample_rate: 48_000,
            lossy: false,
            adaptive: false,
            quantization: None,
            block_size: None,
            strict: false,
        }
    }

    #[test]
    fn flags_override_profile() {
        let profile = Profile::parse("audio:\n  block_size: 256\n  quantization: 9\n").unwrap();
        let mut args = encode_args();
        let config = encode_config(&args, &profile);
        assert_eq!(config.block_size, 256);
        assert_eq!(config.quantization_level, 9);

        args.block_size = Some(512);
        args.quantization = Some(3);
        args.lossy = true;
        let config = encode_config(&args, &profile);
        assert_eq!(config.block_size, 512);
        assert_eq!(config.quantization_level, 3);
        assert!(config.lossy);
    }

    #[test]
    fn strict_flag_matches_library_preset() {
        let mut args = encode_args();
        args.strict = true;
        assert_eq!(encode_config(&args, &Profile::default()), AudioConfig::strict());
    }

    #[test]
    fn decode_ignores_lossy_profile() {
        let profile = Profile::parse("audio:\n  lossy: true\n").unwrap();
        let args = AudioDecodeArgs {
            io: IoArgs {
                input: "in.grc".into(),
                output: "out.pcm".into(),
            },
            strict: true,
        };
        let config = decode_config(&args, &profile);
        assert!(!config.lossy);
        assert!(config.validate().is_ok());
    }
}
