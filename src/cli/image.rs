use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use grcodec::codec::image::{ImageCodec, Raster};
use grcodec::utils::bitstream_io::{BsSliceReader, BsVecWriter};

use crate::cli::command::{ImageCommand, ImageDecodeArgs, ImageEncodeArgs};
use crate::cli::log_summary;
use crate::config::Profile;
use crate::input::{InputReader, create_output};
use crate::raw::raster_bytes;

pub fn cmd_image(command: &ImageCommand, profile: &Profile) -> Result<()> {
    match command {
        ImageCommand::Encode(args) => encode(args, profile),
        ImageCommand::Decode(args) => decode(args, profile),
    }
}

fn encode(args: &ImageEncodeArgs, profile: &Profile) -> Result<()> {
    let start = Instant::now();
    let predictor = match args.predictor {
        Some(p) => p,
        None => profile.image.predictor()?,
    };

    let expected = raster_bytes(args.width, args.height, args.channels)?;
    let data = InputReader::new(&args.io.input)?.read_all()?;
    if data.len() != expected {
        anyhow::bail!(
            "{} holds {} bytes, but a {}x{} raster with {} channel(s) needs {expected}",
            args.io.input.display(),
            data.len(),
            args.width,
            args.height,
            args.channels
        );
    }
    let input_bytes = data.len() as u64;

    log::info!(
        "Encoding {}x{} raster, {} channel(s), predictor {predictor}",
        args.width,
        args.height,
        args.channels
    );
    let raster = Raster::new(args.height, args.width, args.channels, data)?;

    let mut bs = BsVecWriter::in_memory();
    ImageCodec::new(predictor).encode(&raster, &mut bs)?;
    let bytes = bs.finish()?;

    let mut output = create_output(&args.io.output)?;
    output
        .write_all(&bytes)
        .and_then(|_| output.flush())
        .with_context(|| format!("Failed to write {}", args.io.output.display()))?;

    log_summary("Encoded", input_bytes, bytes.len() as u64, start.elapsed());
    Ok(())
}

fn decode(args: &ImageDecodeArgs, profile: &Profile) -> Result<()> {
    let start = Instant::now();
    let predictor = match args.predictor {
        Some(p) => p,
        None => profile.image.predictor()?,
    };

    let bytes = InputReader::new(&args.io.input)?.read_all()?;
    let raster = ImageCodec::new(predictor)
        .decode(&mut BsSliceReader::from_slice(&bytes))
        .with_context(|| format!("Failed to decode {}", args.io.input.display()))?;

    log::info!(
        "Decoded {}x{} raster, {} channel(s), predictor {predictor}",
        raster.cols(),
        raster.rows(),
        raster.channels()
    );

    let data = raster.into_data();
    let mut output = create_output(&args.io.output)?;
    output
        .write_all(&data)
        .and_then(|_| output.flush())
        .with_context(|| format!("Failed to write {}", args.io.output.display()))?;

    log_summary("Decoded", bytes.len() as u64, data.len() as u64, start.elapsed());
    Ok(())
}
