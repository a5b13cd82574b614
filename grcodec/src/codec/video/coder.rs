//! Frame payload coding shared by the encoder and the decoder.
//!
//! Every `encode_*` method returns the frame exactly as the decoder will
//! reconstruct it, which becomes the reference for the next P-frame.

use std::io;

use log::trace;

use super::block::{BlockTransform, to_pixel};
use super::frame::{BlockRegion, FRAME_CHANNELS, Frame, block_regions};
use super::header::FrameHeader;
use super::motion::{MV_OFFSET, MotionVector, find_motion_vector, reference_origin};
use super::VideoConfig;
use crate::codec::image::{plane_residuals, read_plane_codes, reconstruct_plane, write_plane_codes};
use crate::predict::Predictor;
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::Result;

const SAMPLE_SHIFT: f64 = 128.0;
const RESIDUAL_OFFSET: i32 = 128;

#[derive(Debug, Clone)]
pub(crate) struct FrameCoder {
    width: usize,
    height: usize,
    block_size: usize,
    search_range: u8,
    lossy: bool,
    intra_predictor: Option<Predictor>,
    transform: BlockTransform,
}

impl FrameCoder {
    pub fn new(header: &FrameHeader, config: &VideoConfig) -> Result<Self> {
        Ok(Self {
            width: header.width as usize,
            height: header.height as usize,
            block_size: header.block_size as usize,
            search_range: header.search_range,
            lossy: header.is_lossy(),
            intra_predictor: config.intra_predictor,
            transform: BlockTransform::new(&config.transform)?,
        })
    }

    pub fn encode_intra<W: io::Write>(
        &self,
        frame: &Frame,
        level: u8,
        bs: &mut BitStreamWriter<W>,
    ) -> Result<Frame> {
        if self.lossy {
            return self.encode_intra_lossy(frame, level, bs);
        }

        for c in 0..FRAME_CHANNELS {
            let plane = frame.plane(c);
            match self.intra_predictor {
                None => {
                    for &v in plane {
                        bs.write_bits(v as u64, 8)?;
                    }
                }
                Some(p) => {
                    let residuals = plane_residuals(plane, self.height, self.width, p);
                    let m = write_plane_codes(&residuals, bs)?;
                    trace!("intra channel {c}: m = {m}");
                }
            }
        }
        Ok(frame.clone())
    }

    pub fn decode_intra<R: io::Read>(&self, level: u8, bs: &mut BitStreamReader<R>) -> Result<Frame> {
        if self.lossy {
            return self.decode_intra_lossy(level, bs);
        }

        let mut frame = Frame::new(self.width, self.height);
        let count = self.width * self.height;
        for c in 0..FRAME_CHANNELS {
            match self.intra_predictor {
                None => {
                    for v in frame.plane_mut(c) {
                        *v = bs.read_bits(8)? as u8;
                    }
                }
                Some(p) => {
                    let residuals = read_plane_codes(count, bs)?;
                    reconstruct_plane(&residuals, self.height, self.width, p, frame.plane_mut(c));
                }
            }
        }
        Ok(frame)
    }

    fn encode_intra_lossy<W: io::Write>(
        &self,
        frame: &Frame,
        level: u8,
        bs: &mut BitStreamWriter<W>,
    ) -> Result<Frame> {
        let t = self.transform.size();
        let mut recon = Frame::new(self.width, self.height);

        for region in block_regions(self.width, self.height, t) {
            for c in 0..FRAME_CHANNELS {
                let mut block = vec![0.0; t * t];
                for j in 0..region.height {
                    for i in 0..region.width {
                        block[j * t + i] =
                            frame.get(c, region.x + i, region.y + j) as f64 - SAMPLE_SHIFT;
                    }
                }
                let out = self.transform.encode(block, c, level, bs)?;
                store_shifted(&mut recon, c, region, t, &out);
            }
        }
        Ok(recon)
    }

    fn decode_intra_lossy<R: io::Read>(&self, level: u8, bs: &mut BitStreamReader<R>) -> Result<Frame> {
        let t = self.transform.size();
        let mut frame = Frame::new(self.width, self.height);

        for region in block_regions(self.width, self.height, t) {
            for c in 0..FRAME_CHANNELS {
                let out = self.transform.decode(c, level, bs)?;
                store_shifted(&mut frame, c, region, t, &out);
            }
        }
        Ok(frame)
    }

    pub fn encode_inter<W: io::Write>(
        &self,
        frame: &Frame,
        reference: &Frame,
        level: u8,
        bs: &mut BitStreamWriter<W>,
    ) -> Result<Frame> {
        let mut recon = Frame::new(self.width, self.height);

        for region in block_regions(self.width, self.height, self.block_size) {
            let mv = find_motion_vector(frame, reference, region, self.search_range);
            bs.write_bits((mv.dx + MV_OFFSET) as u64, 8)?;
            bs.write_bits((mv.dy + MV_OFFSET) as u64, 8)?;
            let (rx, ry) = reference_origin(reference, region, mv);

            for c in 0..FRAME_CHANNELS {
                let residual: Vec<i32> = (0..region.height)
                    .flat_map(|j| (0..region.width).map(move |i| (i, j)))
                    .map(|(i, j)| {
                        frame.get(c, region.x + i, region.y + j) as i32
                            - reference.get(c, rx + i, ry + j) as i32
                    })
                    .collect();

                if self.lossy {
                    let decoded = self.encode_residual_tiles(&residual, region, c, level, bs)?;
                    predict_add(&mut recon, reference, c, region, (rx, ry), |k| decoded[k]);
                } else {
                    let mut clipped = Vec::with_capacity(residual.len());
                    for r in residual {
                        let r = r.clamp(-RESIDUAL_OFFSET, RESIDUAL_OFFSET - 1);
                        bs.write_bits((r + RESIDUAL_OFFSET) as u64, 8)?;
                        clipped.push(r as f64);
                    }
                    predict_add(&mut recon, reference, c, region, (rx, ry), |k| clipped[k]);
                }
            }
        }
        Ok(recon)
    }

    pub fn decode_inter<R: io::Read>(
        &self,
        reference: &Frame,
        level: u8,
        bs: &mut BitStreamReader<R>,
    ) -> Result<Frame> {
        let mut frame = Frame::new(self.width, self.height);

        for region in block_regions(self.width, self.height, self.block_size) {
            let mv = MotionVector {
                dx: bs.read_bits(8)? as i32 - MV_OFFSET,
                dy: bs.read_bits(8)? as i32 - MV_OFFSET,
            };
            let origin = reference_origin(reference, region, mv);

            for c in 0..FRAME_CHANNELS {
                let residual = if self.lossy {
                    self.decode_residual_tiles(region, c, level, bs)?
                } else {
                    (0..region.width * region.height)
                        .map(|_| Ok((bs.read_bits(8)? as i32 - RESIDUAL_OFFSET) as f64))
                        .collect::<Result<Vec<_>>>()?
                };
                predict_add(&mut frame, reference, c, region, origin, |k| residual[k]);
            }
        }
        Ok(frame)
    }

    /// Tiles a block residual into zero-padded transform blocks and codes them.
    /// Returns the decoded residual in the block's row-major layout.
    fn encode_residual_tiles<W: io::Write>(
        &self,
        residual: &[i32],
        region: BlockRegion,
        channel: usize,
        level: u8,
        bs: &mut BitStreamWriter<W>,
    ) -> Result<Vec<f64>> {
        let t = self.transform.size();
        let mut decoded = vec![0.0; residual.len()];

        for tile in block_regions(region.width, region.height, t) {
            let mut block = vec![0.0; t * t];
            for j in 0..tile.height {
                for i in 0..tile.width {
                    block[j * t + i] = residual[(tile.y + j) * region.width + tile.x + i] as f64;
                }
            }
            let out = self.transform.encode(block, channel, level, bs)?;
            scatter_tile(&mut decoded, region.width, tile, t, &out);
        }
        Ok(decoded)
    }

    fn decode_residual_tiles<R: io::Read>(
        &self,
        region: BlockRegion,
        channel: usize,
        level: u8,
        bs: &mut BitStreamReader<R>,
    ) -> Result<Vec<f64>> {
        let t = self.transform.size();
        let mut decoded = vec![0.0; region.width * region.height];

        for tile in block_regions(region.width, region.height, t) {
            let out = self.transform.decode(channel, level, bs)?;
            scatter_tile(&mut decoded, region.width, tile, t, &out);
        }
        Ok(decoded)
    }
}

fn store_shifted(frame: &mut Frame, channel: usize, region: BlockRegion, t: usize, block: &[f64]) {
    for j in 0..region.height {
        for i in 0..region.width {
            let v = to_pixel(block[j * t + i] + SAMPLE_SHIFT);
            frame.set(channel, region.x + i, region.y + j, v);
        }
    }
}

fn scatter_tile(dst: &mut [f64], stride: usize, tile: BlockRegion, t: usize, block: &[f64]) {
    for j in 0..tile.height {
        for i in 0..tile.width {
            dst[(tile.y + j) * stride + tile.x + i] = block[j * t + i];
        }
    }
}

/// `frame = clamp(reference + residual)` over `region`; `residual(k)` is the
/// residual at row-major offset `k` inside the region.
fn predict_add(
    frame: &mut Frame,
    reference: &Frame,
    channel: usize,
    region: BlockRegion,
    (rx, ry): (usize, usize),
    residual: impl Fn(usize) -> f64,
) {
    for j in 0..region.height {
        for i in 0..region.width {
            let pred = reference.get(channel, rx + i, ry + j) as f64;
            let v = to_pixel(pred + residual(j * region.width + i));
            frame.set(channel, region.x + i, region.y + j, v);
        }
    }
}
