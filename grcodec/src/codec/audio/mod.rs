//! Block-based audio coding of interleaved 16-bit PCM.
//!
//! The stream starts with an [`AudioHeader`] and is followed by blocks of at
//! most [`AudioConfig::block_size`] samples, each prefixed with its length in
//! 16 bits. The payload of a block is produced by a [`BlockCoder`]:
//!
//! - [`Dpcm`]: lossless first-order delta coding.
//! - [`SecondOrder`]: lossless `prev + prevDelta` prediction with capped unary
//!   runs.
//! - [`Checksummed`]: wraps another coder and appends a block checksum.
//! - [`TransformCoder`]: lossy DCT with frequency-dependent quantization.
//!
//! When adaptive mode is on, every block with at least two samples carries
//! its Golomb parameter in a [`M_FIELD_BITS`]-bit field right after the
//! block length.

pub mod checksum;
pub mod dpcm;
pub mod second_order;
pub mod transform;

use std::io;

use log::{debug, warn};

pub use checksum::Checksummed;
pub use dpcm::Dpcm;
pub use second_order::SecondOrder;
pub use transform::TransformCoder;

use crate::entropy::golomb::GolombCoder;
use crate::entropy::residual::SignMode;
use crate::utils::bitstream_io::{BitStreamReader, BitStreamWriter};
use crate::utils::errors::{CodecError, Result};

pub const BLOCK_SIZE: usize = 1024;
pub const MAX_BLOCK_SIZE: usize = u16::MAX as usize;
pub const DEFAULT_M: u32 = 8;
pub const DEFAULT_QUANTIZATION_LEVEL: u8 = 64;
/// Width of the per-block Golomb parameter field.
pub const M_FIELD_BITS: u32 = 6;
/// Longest unary run emitted by the second-order coder.
pub const STRICT_RUN_LIMIT: u32 = 31;

/// Encodes or decodes the payload of one block.
pub trait BlockCoder {
    fn encode_block<W: io::Write>(
        &mut self,
        block: &[i16],
        bs: &mut BitStreamWriter<W>,
    ) -> Result<()>;

    fn decode_block<R: io::Read>(
        &mut self,
        len: usize,
        bs: &mut BitStreamReader<R>,
    ) -> Result<Vec<i16>>;
}

/// Writes the adaptive parameter field and switches `coder` to it.
pub(crate) fn write_m_field<W: io::Write>(
    coder: &mut GolombCoder,
    m: u32,
    bs: &mut BitStreamWriter<W>,
) -> Result<()> {
    bs.write_bits(m as u64, M_FIELD_BITS)?;
    coder.set_m(m)
}

pub(crate) fn read_m_field<R: io::Read>(
    coder: &mut GolombCoder,
    bs: &mut BitStreamReader<R>,
) -> Result<()> {
    let m = bs.read_bits(M_FIELD_BITS)? as u32;
    if m == 0 {
        return Err(CodecError::invalid_stream("block Golomb parameter is zero"));
    }
    coder.set_m(m)
}

/// Audio coder settings.
///
/// `second_order` and `checksum` are not recorded in the stream; the decoder
/// has to be configured the same way as the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioConfig {
    pub block_size: usize,
    /// Golomb parameter used when `adaptive` is off.
    pub initial_m: u32,
    pub sign_mode: SignMode,
    pub quantization_level: u8,
    pub adaptive: bool,
    pub lossy: bool,
    pub second_order: bool,
    pub checksum: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            block_size: BLOCK_SIZE,
            initial_m: DEFAULT_M,
            sign_mode: SignMode::Interleaved,
            quantization_level: DEFAULT_QUANTIZATION_LEVEL,
            adaptive: false,
            lossy: false,
            second_order: false,
            checksum: false,
        }
    }
}

impl AudioConfig {
    /// Lossless, adaptive, second-order prediction and per-block checksums.
    pub fn strict() -> Self {
        Self {
            adaptive: true,
            second_order: true,
            checksum: true,
            ..Self::default()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.second_order || self.checksum
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(CodecError::invalid_argument(format!(
                "block size must be between 1 and {MAX_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        if self.initial_m == 0 {
            return Err(CodecError::invalid_argument("initial m must be at least 1"));
        }
        if self.quantization_level == 0 {
            return Err(CodecError::invalid_argument(
                "quantization level must be between 1 and 255",
            ));
        }
        if self.lossy && self.is_strict() {
            return Err(CodecError::invalid_argument(
                "second-order prediction and checksums only apply to lossless coding",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioHeader {
    pub channels: u8,
    pub sample_count: u32,
    pub sample_rate: u32,
    pub quantization_level: u8,
    pub adaptive: bool,
    pub lossy: bool,
}

impl AudioHeader {
    pub fn write<W: io::Write>(&self, bs: &mut BitStreamWriter<W>) -> Result<()> {
        bs.write_bits(self.channels as u64, 8)?;
        bs.write_bits((self.sample_count >> 16) as u64, 16)?;
        bs.write_bits((self.sample_count & 0xFFFF) as u64, 16)?;
        bs.write_bits((self.sample_rate >> 16) as u64, 16)?;
        bs.write_bits((self.sample_rate & 0xFFFF) as u64, 16)?;
        bs.write_bits(self.quantization_level as u64, 8)?;
        bs.write_bit(self.adaptive)?;
        bs.write_bit(self.lossy)
    }

    pub fn read<R: io::Read>(bs: &mut BitStreamReader<R>) -> Result<Self> {
        let channels = bs.read_bits(8)? as u8;
        let sample_count = ((bs.read_bits(16)? << 16) | bs.read_bits(16)?) as u32;
        let sample_rate = ((bs.read_bits(16)? << 16) | bs.read_bits(16)?) as u32;
        let quantization_level = bs.read_bits(8)? as u8;
        let adaptive = bs.read_bit()?;
        let lossy = bs.read_bit()?;

        Ok(Self {
            channels,
            sample_count,
            sample_rate,
            quantization_level,
            adaptive,
            lossy,
        })
    }
}

/// Interleaved PCM samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub channels: u8,
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl PcmBuffer {
    pub fn new(channels: u8, sample_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            channels,
            sample_rate,
            samples,
        }
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct AudioCodec {
    config: AudioConfig,
}

impl AudioCodec {
    pub fn new(config: AudioConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn encode<W: io::Write>(&self, pcm: &PcmBuffer, bs: &mut BitStreamWriter<W>) -> Result<()> {
        let config = &self.config;
        config.validate()?;

        if pcm.channels == 0 {
            return Err(CodecError::invalid_argument("channel count must be non-zero"));
        }
        let sample_count = u32::try_from(pcm.samples.len()).map_err(|_| {
            CodecError::invalid_argument(format!(
                "{} samples do not fit the 32-bit sample count",
                pcm.samples.len()
            ))
        })?;
        if sample_count == 0 {
            warn!("Encoding an empty sample buffer");
        }

        let header = AudioHeader {
            channels: pcm.channels,
            sample_count,
            sample_rate: pcm.sample_rate,
            quantization_level: config.quantization_level,
            adaptive: config.adaptive,
            lossy: config.lossy,
        };
        header.write(bs)?;

        let samples = &pcm.samples;
        let size = config.block_size;
        if config.lossy {
            let mut coder = TransformCoder::new(config.initial_m, config.sign_mode, &header)?;
            encode_blocks(&mut coder, samples, size, bs)
        } else {
            let adaptive = config.adaptive;
            let m = config.initial_m;
            match (config.second_order, config.checksum) {
                (false, false) => {
                    let mut coder = Dpcm::new(m, config.sign_mode, adaptive)?;
                    encode_blocks(&mut coder, samples, size, bs)
                }
                (true, false) => {
                    let mut coder = SecondOrder::new(m, adaptive)?;
                    encode_blocks(&mut coder, samples, size, bs)
                }
                (false, true) => {
                    let mut coder = Checksummed::new(Dpcm::new(m, config.sign_mode, adaptive)?);
                    encode_blocks(&mut coder, samples, size, bs)
                }
                (true, true) => {
                    let mut coder = Checksummed::new(SecondOrder::new(m, adaptive)?);
                    encode_blocks(&mut coder, samples, size, bs)
                }
            }
        }
    }

    /// Decodes a whole stream. `adaptive`, `lossy` and the quantization level
    /// come from the stream header.
    pub fn decode<R: io::Read>(&self, bs: &mut BitStreamReader<R>) -> Result<PcmBuffer> {
        let config = &self.config;
        let header = AudioHeader::read(bs)?;
        debug!("{header:?}");

        if header.channels == 0 {
            return Err(CodecError::invalid_stream("channel count is zero"));
        }

        let count = header.sample_count as usize;
        let m = config.initial_m;
        let samples = if header.lossy {
            if config.is_strict() {
                return Err(CodecError::invalid_argument(
                    "stream is lossy but the decoder expects strict lossless coding",
                ));
            }
            let mut coder = TransformCoder::new(m, config.sign_mode, &header)?;
            decode_blocks(&mut coder, count, bs)?
        } else {
            let adaptive = header.adaptive;
            match (config.second_order, config.checksum) {
                (false, false) => {
                    decode_blocks(&mut Dpcm::new(m, config.sign_mode, adaptive)?, count, bs)?
                }
                (true, false) => decode_blocks(&mut SecondOrder::new(m, adaptive)?, count, bs)?,
                (false, true) => decode_blocks(
                    &mut Checksummed::new(Dpcm::new(m, config.sign_mode, adaptive)?),
                    count,
                    bs,
                )?,
                (true, true) => decode_blocks(
                    &mut Checksummed::new(SecondOrder::new(m, adaptive)?),
                    count,
                    bs,
                )?,
            }
        };

        Ok(PcmBuffer {
            channels: header.channels,
            sample_rate: header.sample_rate,
            samples,
        })
    }
}

fn encode_blocks<C: BlockCoder, W: io::Write>(
    coder: &mut C,
    samples: &[i16],
    block_size: usize,
    bs: &mut BitStreamWriter<W>,
) -> Result<()> {
    for (idx, block) in samples.chunks(block_size).enumerate() {
        let start = bs.bits_written();
        bs.write_bits(block.len() as u64, 16)?;
        coder.encode_block(block, bs)?;
        debug!(
            "audio block {idx}: {} samples, {} bits",
            block.len(),
            bs.bits_written() - start
        );
    }
    Ok(())
}

fn decode_blocks<C: BlockCoder, R: io::Read>(
    coder: &mut C,
    count: usize,
    bs: &mut BitStreamReader<R>,
) -> Result<Vec<i16>> {
    let mut samples = Vec::with_capacity(count.min(1 << 24));
    while samples.len() < count {
        let len = bs.read_bits(16)? as usize;
        let remaining = count - samples.len();
        if len == 0 || len > remaining {
            return Err(CodecError::invalid_stream(format!(
                "block of {len} samples with {remaining} samples left"
            )));
        }
        samples.extend(coder.decode_block(len, bs)?);
    }
    Ok(samples)
}

/// Convenience wrapper encoding into a fresh byte buffer.
pub fn encode_audio(config: &AudioConfig, pcm: &PcmBuffer) -> Result<Vec<u8>> {
    let mut bs = BitStreamWriter::new(Vec::new());
    AudioCodec::new(config.clone())?.encode(pcm, &mut bs)?;
    bs.finish()
}

pub fn decode_audio(config: &AudioConfig, bytes: &[u8]) -> Result<PcmBuffer> {
    let mut bs = BitStreamReader::new(io::Cursor::new(bytes));
    AudioCodec::new(config.clone())?.decode(&mut bs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::{BsSliceReader, BsVecWriter};
    use proptest::prelude::*;

    fn tone(len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| ((i as f64 * 0.05).sin() * 12000.0 + (i as f64 * 0.31).cos() * 900.0) as i16)
            .collect()
    }

    fn lossless_configs() -> Vec<AudioConfig> {
        let base = AudioConfig::default();
        vec![
            base.clone(),
            AudioConfig {
                adaptive: true,
                ..base.clone()
            },
            AudioConfig {
                sign_mode: SignMode::SignMagnitude,
                adaptive: true,
                ..base.clone()
            },
            AudioConfig {
                second_order: true,
                ..base.clone()
            },
            AudioConfig {
                checksum: true,
                ..base
            },
            AudioConfig::strict(),
        ]
    }

    #[test]
    fn worked_example() -> Result<()> {
        let pcm = PcmBuffer::new(1, 8000, vec![100, 50]);
        let bytes = encode_audio(&AudioConfig::default(), &pcm)?;

        let mut reader = BsSliceReader::from_slice(&bytes);
        let header = AudioHeader::read(&mut reader)?;
        assert_eq!(header.sample_count, 2);
        assert_eq!(header.sample_rate, 8000);
        assert_eq!(reader.read_bits(16)?, 2);
        assert_eq!(reader.read_bits(16)?, 32868);
        // -50 -> 99 = 12 * 8 + 3
        let coder = GolombCoder::new(8, SignMode::Interleaved)?;
        assert_eq!(coder.decode_unsigned(&mut reader)?, 99);

        assert_eq!(decode_audio(&AudioConfig::default(), &bytes)?, pcm);
        Ok(())
    }

    #[test]
    fn header_halves_are_high_first() -> Result<()> {
        let header = AudioHeader {
            channels: 2,
            sample_count: 0x0001_0002,
            sample_rate: 44_100,
            quantization_level: 7,
            adaptive: true,
            lossy: false,
        };
        let mut writer = BsVecWriter::in_memory();
        header.write(&mut writer)?;
        assert_eq!(writer.bits_written(), 8 + 64 + 8 + 2);
        let bytes = writer.finish()?;
        assert_eq!(&bytes[..5], &[2, 0, 1, 0, 2]);
        assert_eq!(AudioHeader::read(&mut BsSliceReader::from_slice(&bytes))?, header);
        Ok(())
    }

    #[test]
    fn lossless_lengths() -> Result<()> {
        for config in lossless_configs() {
            for len in [0, 1, 2, BLOCK_SIZE - 1, BLOCK_SIZE, BLOCK_SIZE + 1, 3 * BLOCK_SIZE + 17] {
                let pcm = PcmBuffer::new(2, 48_000, tone(len));
                let bytes = encode_audio(&config, &pcm)?;
                assert_eq!(decode_audio(&config, &bytes)?, pcm, "{config:?} len {len}");
            }
        }
        Ok(())
    }

    #[test]
    fn extreme_jumps_are_lossless() -> Result<()> {
        let samples = vec![i16::MIN, i16::MAX, i16::MIN, 0, i16::MAX, i16::MAX, -1, i16::MIN];
        let pcm = PcmBuffer::new(1, 8000, samples);
        for config in lossless_configs() {
            let bytes = encode_audio(&config, &pcm)?;
            assert_eq!(decode_audio(&config, &bytes)?, pcm, "{config:?}");
        }
        Ok(())
    }

    #[test]
    fn small_blocks() -> Result<()> {
        let config = AudioConfig {
            block_size: 3,
            adaptive: true,
            ..AudioConfig::default()
        };
        let pcm = PcmBuffer::new(1, 8000, tone(10));
        let bytes = encode_audio(&config, &pcm)?;
        assert_eq!(decode_audio(&config, &bytes)?, pcm);
        Ok(())
    }

    #[test]
    fn strict_detects_corruption() -> Result<()> {
        let config = AudioConfig::strict();
        let pcm = PcmBuffer::new(1, 8000, tone(300));
        let mut bytes = encode_audio(&config, &pcm)?;
        let last = bytes.len() - 1;
        bytes[last] ^= 0x80;

        match decode_audio(&config, &bytes) {
            Err(CodecError::ChecksumMismatch { block: 0, .. }) => {}
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn lossy_with_strict_options_is_rejected() {
        let config = AudioConfig {
            lossy: true,
            ..AudioConfig::strict()
        };
        assert!(matches!(
            AudioCodec::new(config),
            Err(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn invalid_configs() {
        for config in [
            AudioConfig {
                block_size: 0,
                ..AudioConfig::default()
            },
            AudioConfig {
                block_size: MAX_BLOCK_SIZE + 1,
                ..AudioConfig::default()
            },
            AudioConfig {
                initial_m: 0,
                ..AudioConfig::default()
            },
            AudioConfig {
                quantization_level: 0,
                ..AudioConfig::default()
            },
        ] {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn zero_length_block_is_invalid() -> Result<()> {
        let mut writer = BsVecWriter::in_memory();
        AudioHeader {
            channels: 1,
            sample_count: 4,
            sample_rate: 8000,
            quantization_level: 1,
            adaptive: false,
            lossy: false,
        }
        .write(&mut writer)?;
        writer.write_bits(0, 16)?;
        let bytes = writer.finish()?;

        assert!(matches!(
            decode_audio(&AudioConfig::default(), &bytes),
            Err(CodecError::InvalidStream(_))
        ));
        Ok(())
    }

    #[test]
    fn truncated_stream() -> Result<()> {
        let pcm = PcmBuffer::new(1, 8000, tone(500));
        let bytes = encode_audio(&AudioConfig::default(), &pcm)?;
        assert!(matches!(
            decode_audio(&AudioConfig::default(), &bytes[..bytes.len() / 2]),
            Err(CodecError::UnexpectedEndOfStream { .. })
        ));
        Ok(())
    }

    #[test]
    fn lossy_error_shrinks_with_level() -> Result<()> {
        let pcm = PcmBuffer::new(1, 8000, tone(2 * BLOCK_SIZE));
        let mut last = f64::INFINITY;
        for level in [1u8, 4, 16, 64, 255] {
            let config = AudioConfig {
                lossy: true,
                adaptive: true,
                quantization_level: level,
                ..AudioConfig::default()
            };
            let decoded = decode_audio(&config, &encode_audio(&config, &pcm)?)?;
            assert_eq!(decoded.samples.len(), pcm.samples.len());

            let mse = pcm
                .samples
                .iter()
                .zip(&decoded.samples)
                .map(|(&a, &b)| (a as f64 - b as f64).powi(2))
                .sum::<f64>()
                / pcm.samples.len() as f64;
            assert!(mse <= last, "level {level}: {mse} > {last}");
            last = mse;
        }
        Ok(())
    }

    #[test]
    fn lossy_long_block() -> Result<()> {
        let config = AudioConfig {
            lossy: true,
            block_size: 40_000,
            ..AudioConfig::default()
        };
        config.validate()?;

        let pcm = PcmBuffer::new(1, 48_000, vec![0; 40_000]);
        let bytes = encode_audio(&config, &pcm)?;
        let decoded = decode_audio(&config, &bytes)?;
        assert_eq!(decoded, pcm);
        Ok(())
    }

    #[test]
    fn decoder_follows_header_flags() -> Result<()> {
        let encoder = AudioConfig {
            adaptive: true,
            lossy: true,
            quantization_level: 32,
            ..AudioConfig::default()
        };
        let pcm = PcmBuffer::new(1, 22_050, tone(700));
        let bytes = encode_audio(&encoder, &pcm)?;
        let decoded = decode_audio(&AudioConfig::default(), &bytes)?;
        assert_eq!(decoded.samples.len(), 700);
        assert_eq!(decoded.sample_rate, 22_050);
        Ok(())
    }

    proptest! {
        #[test]
        fn lossless_arbitrary_samples(
            samples in prop::collection::vec(any::<i16>(), 0..600),
            adaptive in any::<bool>(),
            strict in any::<bool>(),
            block_size in 1usize..300,
        ) {
            let config = AudioConfig {
                block_size,
                adaptive,
                second_order: strict,
                checksum: strict,
                ..AudioConfig::default()
            };
            let pcm = PcmBuffer::new(1, 16_000, samples);
            let bytes = encode_audio(&config, &pcm).unwrap();
            prop_assert_eq!(decode_audio(&config, &bytes).unwrap(), pcm);
        }
    }
}
