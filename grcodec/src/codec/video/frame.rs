use std::fmt;

use crate::utils::errors::{CodecError, Result};

pub const FRAME_CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Coded on its own.
    Intra,
    /// Motion-compensated from the previous reconstructed frame.
    Inter,
}

impl FrameKind {
    /// Kind of frame `index` for an open GOP of `interval` frames.
    pub fn for_index(index: u32, interval: u8) -> Self {
        if interval == 0 || index % interval as u32 == 0 {
            FrameKind::Intra
        } else {
            FrameKind::Inter
        }
    }

    pub fn is_intra(self) -> bool {
        self == FrameKind::Intra
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameKind::Intra => "I",
            FrameKind::Inter => "P",
        })
    }
}

/// Planar 3-channel 8-bit picture. Channel 0 is treated as luma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    planes: [Vec<u8>; FRAME_CHANNELS],
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        let plane = vec![0u8; width * height];
        Self {
            width,
            height,
            planes: [plane.clone(), plane.clone(), plane],
        }
    }

    pub fn from_planes(width: usize, height: usize, planes: [Vec<u8>; FRAME_CHANNELS]) -> Result<Self> {
        for plane in &planes {
            if plane.len() != width * height {
                return Err(CodecError::DimensionMismatch {
                    what: "frame plane length",
                    expected: width * height,
                    actual: plane.len(),
                });
            }
        }
        Ok(Self {
            width,
            height,
            planes,
        })
    }

    /// Splits packed `c0 c1 c2` pixels into planes.
    pub fn from_interleaved(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        let expected = width * height * FRAME_CHANNELS;
        if data.len() != expected {
            return Err(CodecError::DimensionMismatch {
                what: "frame length",
                expected,
                actual: data.len(),
            });
        }

        let mut frame = Self::new(width, height);
        for (i, px) in data.chunks_exact(FRAME_CHANNELS).enumerate() {
            for (c, &v) in px.iter().enumerate() {
                frame.planes[c][i] = v;
            }
        }
        Ok(frame)
    }

    pub fn to_interleaved(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * FRAME_CHANNELS);
        for i in 0..self.width * self.height {
            out.extend(self.planes.iter().map(|p| p[i]));
        }
        out
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn plane(&self, channel: usize) -> &[u8] {
        &self.planes[channel]
    }

    pub fn plane_mut(&mut self, channel: usize) -> &mut [u8] {
        &mut self.planes[channel]
    }

    #[inline(always)]
    pub fn get(&self, channel: usize, x: usize, y: usize) -> u8 {
        self.planes[channel][y * self.width + x]
    }

    #[inline(always)]
    pub fn set(&mut self, channel: usize, x: usize, y: usize, value: u8) {
        self.planes[channel][y * self.width + x] = value;
    }

    pub(crate) fn check_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if self.width != width {
            return Err(CodecError::DimensionMismatch {
                what: "frame width",
                expected: width,
                actual: self.width,
            });
        }
        if self.height != height {
            return Err(CodecError::DimensionMismatch {
                what: "frame height",
                expected: height,
                actual: self.height,
            });
        }
        Ok(())
    }
}

/// A rectangle of a frame, clipped to its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRegion {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Non-overlapping `size x size` tiles in raster order; edge tiles are clipped.
pub fn block_regions(width: usize, height: usize, size: usize) -> impl Iterator<Item = BlockRegion> {
    let size = size.max(1);
    (0..height).step_by(size).flat_map(move |y| {
        (0..width).step_by(size).map(move |x| BlockRegion {
            x,
            y,
            width: size.min(width - x),
            height: size.min(height - y),
        })
    })
}
