//! Lossless predictive image coding.
//!
//! Each channel is scanned in raster order, predicted from its causal
//! neighbours, and the zigzag-mapped residuals are Golomb coded with one
//! parameter per channel.
//!
//! Stream layout:
//!
//! ```text
//! channels(8)
//! per channel: rows(16) cols(16) m(16) codes[rows * cols]
//! ```

use std::io;

use log::debug;

use crate::entropy::estimate::estimate_from_mapped;
use crate::entropy::golomb::GolombCoder;
use crate::entropy::residual::{SignMode, unzigzag, zigzag};
use crate::predict::{Predictor, causal_neighbors};
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::{CodecError, Result};

pub const MAX_DIMENSION: usize = u16::MAX as usize;
pub const MAX_CHANNELS: usize = u8::MAX as usize;

/// Interleaved 8-bit raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    rows: usize,
    cols: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Raster {
    pub fn new(rows: usize, cols: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        let expected = rows * cols * channels;
        if data.len() != expected {
            return Err(CodecError::DimensionMismatch {
                what: "raster length",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            channels,
            data,
        })
    }

    pub fn zeroed(rows: usize, cols: usize, channels: usize) -> Self {
        Self {
            rows,
            cols,
            channels,
            data: vec![0; rows * cols * channels],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> u8 {
        self.data[(row * self.cols + col) * self.channels + channel]
    }

    /// Copies one channel out as a row-major plane.
    pub fn plane(&self, channel: usize) -> Vec<u8> {
        self.data
            .iter()
            .skip(channel)
            .step_by(self.channels.max(1))
            .copied()
            .collect()
    }

    pub fn set_plane(&mut self, channel: usize, plane: &[u8]) {
        let step = self.channels.max(1);
        for (dst, &src) in self.data.iter_mut().skip(channel).step_by(step).zip(plane) {
            *dst = src;
        }
    }
}

/// Mapped residuals of one channel with the raster dimensions they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelResiduals {
    pub rows: usize,
    pub cols: usize,
    pub residuals: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidualStream {
    pub channels: Vec<ChannelResiduals>,
}

impl ResidualStream {
    /// Common `(rows, cols)` of all channels.
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        let first = self
            .channels
            .first()
            .ok_or_else(|| CodecError::invalid_stream("image stream has no channels"))?;

        for ch in &self.channels {
            if ch.residuals.len() != ch.rows * ch.cols {
                return Err(CodecError::DimensionMismatch {
                    what: "channel residual count",
                    expected: ch.rows * ch.cols,
                    actual: ch.residuals.len(),
                });
            }
            if (ch.rows, ch.cols) != (first.rows, first.cols) {
                return Err(CodecError::invalid_stream(format!(
                    "channel dimensions differ: {}x{} vs {}x{}",
                    ch.rows, ch.cols, first.rows, first.cols
                )));
            }
        }

        Ok((first.rows, first.cols))
    }
}

/// Zigzag-mapped prediction residuals of a row-major plane.
pub(crate) fn plane_residuals(
    plane: &[u8],
    rows: usize,
    cols: usize,
    predictor: Predictor,
) -> Vec<u32> {
    let mut out = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let (a, b, d) = causal_neighbors(plane, cols, r, c);
            let actual = plane[r * cols + c] as i32;
            out.push(zigzag(actual - predictor.predict(a, b, d)));
        }
    }
    out
}

/// Rebuilds a plane from mapped residuals, predicting from what has already
/// been reconstructed.
pub(crate) fn reconstruct_plane(
    residuals: &[u32],
    rows: usize,
    cols: usize,
    predictor: Predictor,
    plane: &mut [u8],
) {
    for r in 0..rows {
        for c in 0..cols {
            let (a, b, d) = causal_neighbors(plane, cols, r, c);
            let value = predictor.predict(a, b, d) + unzigzag(residuals[r * cols + c]);
            plane[r * cols + c] = value.rem_euclid(256) as u8;
        }
    }
}

/// Writes `m` (16 bits) followed by one Golomb code per residual.
pub(crate) fn write_plane_codes<W: io::Write>(
    residuals: &[u32],
    bs: &mut BitStreamWriter<W>,
) -> Result<u32> {
    let m = estimate_from_mapped(residuals);
    bs.write_bits(m as u64, 16)?;

    let coder = GolombCoder::new(m, SignMode::Interleaved)?;
    for &v in residuals {
        coder.encode_unsigned(v, bs)?;
    }
    Ok(m)
}

pub(crate) fn read_plane_codes<R: io::Read>(
    count: usize,
    bs: &mut BitStreamReader<R>,
) -> Result<Vec<u32>> {
    let m = bs.read_bits(16)? as u32;
    if m == 0 {
        return Err(CodecError::invalid_stream("Golomb parameter field is zero"));
    }

    let coder = GolombCoder::new(m, SignMode::Interleaved)?;
    (0..count).map(|_| coder.decode_unsigned(bs)).collect()
}

/// Predictive image coder. Encoder and decoder must use the same predictor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec {
    predictor: Predictor,
}

impl ImageCodec {
    pub fn new(predictor: Predictor) -> Self {
        Self { predictor }
    }

    pub fn predictor(&self) -> Predictor {
        self.predictor
    }

    pub fn residuals(&self, raster: &Raster) -> Result<ResidualStream> {
        if raster.rows > MAX_DIMENSION || raster.cols > MAX_DIMENSION {
            return Err(CodecError::invalid_argument(format!(
                "raster {}x{} exceeds {MAX_DIMENSION} in one dimension",
                raster.rows, raster.cols
            )));
        }
        if raster.channels == 0 || raster.channels > MAX_CHANNELS {
            return Err(CodecError::invalid_argument(format!(
                "channel count must be between 1 and {MAX_CHANNELS}, got {}",
                raster.channels
            )));
        }

        let channels = (0..raster.channels)
            .map(|ch| ChannelResiduals {
                rows: raster.rows,
                cols: raster.cols,
                residuals: plane_residuals(
                    &raster.plane(ch),
                    raster.rows,
                    raster.cols,
                    self.predictor,
                ),
            })
            .collect();

        Ok(ResidualStream { channels })
    }

    pub fn write_residuals<W: io::Write>(
        &self,
        stream: &ResidualStream,
        bs: &mut BitStreamWriter<W>,
    ) -> Result<()> {
        stream.dimensions()?;
        if stream.channels.len() > MAX_CHANNELS {
            return Err(CodecError::invalid_argument(format!(
                "channel count must be at most {MAX_CHANNELS}, got {}",
                stream.channels.len()
            )));
        }

        bs.write_bits(stream.channels.len() as u64, 8)?;
        for (idx, ch) in stream.channels.iter().enumerate() {
            if ch.rows > MAX_DIMENSION || ch.cols > MAX_DIMENSION {
                return Err(CodecError::invalid_argument(format!(
                    "channel {idx} is {}x{}, larger than {MAX_DIMENSION}",
                    ch.rows, ch.cols
                )));
            }
            bs.write_bits(ch.rows as u64, 16)?;
            bs.write_bits(ch.cols as u64, 16)?;
            let m = write_plane_codes(&ch.residuals, bs)?;
            debug!("image channel {idx}: {}x{}, m = {m}", ch.rows, ch.cols);
        }
        Ok(())
    }

    pub fn read_residuals<R: io::Read>(&self, bs: &mut BitStreamReader<R>) -> Result<ResidualStream> {
        let count = bs.read_bits(8)? as usize;
        if count == 0 {
            return Err(CodecError::invalid_stream("image stream has no channels"));
        }

        let mut channels = Vec::with_capacity(count);
        for idx in 0..count {
            let rows = bs.read_bits(16)? as usize;
            let cols = bs.read_bits(16)? as usize;
            let residuals = read_plane_codes(rows * cols, bs)?;
            debug!("image channel {idx}: {rows}x{cols}");
            channels.push(ChannelResiduals {
                rows,
                cols,
                residuals,
            });
        }

        Ok(ResidualStream { channels })
    }

    pub fn reconstruct(&self, stream: &ResidualStream) -> Result<Raster> {
        let (rows, cols) = stream.dimensions()?;
        let mut raster = Raster::zeroed(rows, cols, stream.channels.len());
        self.reconstruct_into(stream, &mut raster)?;
        Ok(raster)
    }

    /// Reconstructs into a caller-supplied raster of matching shape.
    pub fn reconstruct_into(&self, stream: &ResidualStream, raster: &mut Raster) -> Result<()> {
        let (rows, cols) = stream.dimensions()?;
        let checks = [
            ("raster rows", rows, raster.rows),
            ("raster columns", cols, raster.cols),
            ("raster channels", stream.channels.len(), raster.channels),
        ];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(CodecError::DimensionMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }

        let mut plane = vec![0u8; rows * cols];
        for (idx, ch) in stream.channels.iter().enumerate() {
            reconstruct_plane(&ch.residuals, rows, cols, self.predictor, &mut plane);
            raster.set_plane(idx, &plane);
        }
        Ok(())
    }

    pub fn encode<W: io::Write>(&self, raster: &Raster, bs: &mut BitStreamWriter<W>) -> Result<()> {
        let stream = self.residuals(raster)?;
        self.write_residuals(&stream, bs)
    }

    pub fn decode<R: io::Read>(&self, bs: &mut BitStreamReader<R>) -> Result<Raster> {
        let stream = self.read_residuals(bs)?;
        self.reconstruct(&stream)
    }
}

/// Header of an image stream: `(channels, rows, cols)` of the first channel.
pub fn read_image_header<R: io::Read>(bs: &mut BitStreamReader<R>) -> Result<(usize, usize, usize)> {
    let channels = bs.read_bits(8)? as usize;
    let rows = bs.read_bits(16)? as usize;
    let cols = bs.read_bits(16)? as usize;
    Ok((channels, rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::{BsSliceReader, BsVecWriter};
    use proptest::prelude::*;

    fn gradient(rows: usize, cols: usize, channels: usize) -> Raster {
        let data = (0..rows * cols * channels)
            .map(|i| {
                let px = i / channels;
                let (r, c, ch) = (px / cols, px % cols, i % channels);
                ((r * 7 + c * 3 + ch * 50) % 256) as u8
            })
            .collect();
        Raster::new(rows, cols, channels, data).unwrap()
    }

    fn round_trip(codec: &ImageCodec, raster: &Raster) -> Result<Raster> {
        let mut writer = BsVecWriter::in_memory();
        codec.encode(raster, &mut writer)?;
        let bytes = writer.finish()?;
        codec.decode(&mut BsSliceReader::from_slice(&bytes))
    }

    #[test]
    fn raster_length_is_checked() {
        assert!(matches!(
            Raster::new(2, 2, 3, vec![0; 11]),
            Err(CodecError::DimensionMismatch {
                expected: 12,
                actual: 11,
                ..
            })
        ));
    }

    #[test]
    fn planes_are_deinterleaved() -> Result<()> {
        let raster = Raster::new(1, 2, 3, vec![1, 2, 3, 4, 5, 6])?;
        assert_eq!(raster.plane(1), vec![2, 5]);
        let mut copy = Raster::zeroed(1, 2, 3);
        for ch in 0..3 {
            copy.set_plane(ch, &raster.plane(ch));
        }
        assert_eq!(copy, raster);
        Ok(())
    }

    #[test]
    fn residuals_of_a_flat_row() -> Result<()> {
        let raster = Raster::new(1, 3, 1, vec![100, 100, 90])?;
        let stream = ImageCodec::new(Predictor::Left).residuals(&raster)?;
        assert_eq!(stream.channels[0].residuals, vec![200, 0, 19]);
        Ok(())
    }

    #[test]
    fn lossless_for_every_predictor() -> Result<()> {
        let shapes = [(1, 1), (1, 17), (13, 1), (9, 11)];
        for predictor in Predictor::ALL {
            let codec = ImageCodec::new(predictor);
            for (rows, cols) in shapes {
                let raster = gradient(rows, cols, 3);
                assert_eq!(round_trip(&codec, &raster)?, raster, "{predictor} {rows}x{cols}");
            }
        }
        Ok(())
    }

    #[test]
    fn header_layout() -> Result<()> {
        let raster = gradient(4, 5, 2);
        let mut writer = BsVecWriter::in_memory();
        ImageCodec::default().encode(&raster, &mut writer)?;
        let bytes = writer.finish()?;

        let mut reader = BsSliceReader::from_slice(&bytes);
        assert_eq!(read_image_header(&mut reader)?, (2, 4, 5));
        let m = reader.read_bits(16)?;
        assert!((m as u32).is_power_of_two());
        Ok(())
    }

    #[test]
    fn reconstruct_into_checks_shape() -> Result<()> {
        let codec = ImageCodec::default();
        let stream = codec.residuals(&gradient(3, 4, 3))?;

        let mut wrong = Raster::zeroed(4, 3, 3);
        assert!(matches!(
            codec.reconstruct_into(&stream, &mut wrong),
            Err(CodecError::DimensionMismatch { .. })
        ));

        let mut right = Raster::zeroed(3, 4, 3);
        codec.reconstruct_into(&stream, &mut right)?;
        assert_eq!(right, gradient(3, 4, 3));
        Ok(())
    }

    #[test]
    fn oversized_inputs_are_rejected() {
        let codec = ImageCodec::default();
        let wide = Raster::zeroed(1, MAX_DIMENSION + 1, 1);
        assert!(matches!(
            codec.residuals(&wide),
            Err(CodecError::InvalidArgument(_))
        ));
        let many = Raster::zeroed(1, 1, 256);
        assert!(matches!(
            codec.residuals(&many),
            Err(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn mismatched_channels_are_rejected() {
        let stream = ResidualStream {
            channels: vec![
                ChannelResiduals {
                    rows: 1,
                    cols: 2,
                    residuals: vec![0, 0],
                },
                ChannelResiduals {
                    rows: 2,
                    cols: 1,
                    residuals: vec![0, 0],
                },
            ],
        };
        let mut writer = BsVecWriter::in_memory();
        assert!(ImageCodec::default().write_residuals(&stream, &mut writer).is_err());
    }

    #[test]
    fn truncated_stream_fails() -> Result<()> {
        let raster = gradient(6, 6, 3);
        let mut writer = BsVecWriter::in_memory();
        ImageCodec::default().encode(&raster, &mut writer)?;
        let bytes = writer.finish()?;

        let cut = &bytes[..bytes.len() / 2];
        assert!(matches!(
            ImageCodec::default().decode(&mut BsSliceReader::from_slice(cut)),
            Err(CodecError::UnexpectedEndOfStream { .. })
        ));
        Ok(())
    }

    proptest! {
        #[test]
        fn lossless_random_rasters(
            rows in 1usize..12,
            cols in 1usize..12,
            channels in 1usize..4,
            seed in any::<u64>(),
            predictor in prop::sample::select(Predictor::ALL.to_vec()),
        ) {
            let mut state = seed | 1;
            let data = (0..rows * cols * channels)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    state as u8
                })
                .collect();
            let raster = Raster::new(rows, cols, channels, data).unwrap();
            let codec = ImageCodec::new(predictor);
            prop_assert_eq!(round_trip(&codec, &raster).unwrap(), raster);
        }
    }
}
