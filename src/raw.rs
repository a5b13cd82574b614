//! Raw sample layouts read and written by the tool.
//!
//! PCM is interleaved signed 16-bit little-endian. Rasters and video frames
//! are 8-bit, row-major with channels interleaved per pixel.

use anyhow::Result;

pub const PCM_SAMPLE_BYTES: usize = 2;

pub fn pcm_from_s16le(bytes: &[u8]) -> Result<Vec<i16>> {
    if bytes.len() % PCM_SAMPLE_BYTES != 0 {
        anyhow::bail!(
            "PCM input has an odd number of bytes ({}); expected 16-bit samples",
            bytes.len()
        );
    }
    Ok(bytes
        .chunks_exact(PCM_SAMPLE_BYTES)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}

pub fn pcm_to_s16le(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Bytes in one interleaved raster of the given geometry.
pub fn raster_bytes(width: usize, height: usize, channels: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| anyhow::anyhow!("Raster size {width}x{height}x{channels} overflows"))
}
