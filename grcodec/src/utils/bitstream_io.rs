//! Sequential bit-level I/O over a byte-oriented medium.
//!
//! Fields are written most-significant-bit first. Writers buffer at most one
//! partial byte; [`BitStreamWriter::flush`] pads it with zero bits. Readers
//! report running off the end of the medium as
//! [`CodecError::UnexpectedEndOfStream`].

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::utils::errors::{CodecError, Result};

/// Widest field accepted by `write_bits` / `read_bits`.
pub const MAX_FIELD_BITS: u32 = 64;

#[inline(always)]
fn check_width(n: u32) -> Result<()> {
    if n == 0 || n > MAX_FIELD_BITS {
        return Err(CodecError::invalid_argument(format!(
            "bit count must be between 1 and {MAX_FIELD_BITS}, got {n}"
        )));
    }
    Ok(())
}

#[inline(always)]
fn low_bits(value: u64, n: u32) -> u64 {
    if n >= 64 { value } else { value & ((1u64 << n) - 1) }
}

pub struct BitStreamWriter<W: io::Write> {
    bs: BitWriter<W, BigEndian>,
    bits_written: u64,
}

pub type BsVecWriter = BitStreamWriter<Vec<u8>>;
pub type BsFileWriter = BitStreamWriter<BufWriter<File>>;

impl<W: io::Write> BitStreamWriter<W> {
    pub fn new(write: W) -> Self {
        Self {
            bs: BitWriter::new(write),
            bits_written: 0,
        }
    }

    #[inline(always)]
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.bs
            .write_bit(bit)
            .map_err(|e| CodecError::from_io(e, self.bits_written))?;
        self.bits_written += 1;
        Ok(())
    }

    /// Writes the low `n` bits of `value`, most significant first.
    #[inline(always)]
    pub fn write_bits(&mut self, value: u64, n: u32) -> Result<()> {
        check_width(n)?;
        self.bs
            .write_unsigned_var(n, low_bits(value, n))
            .map_err(|e| CodecError::from_io(e, self.bits_written))?;
        self.bits_written += n as u64;
        Ok(())
    }

    pub fn write_string(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.write_bits(byte as u64, 8)?;
        }
        Ok(())
    }

    /// Pads the pending partial byte with zeros and emits it.
    pub fn flush(&mut self) -> Result<()> {
        let pad = (8 - (self.bits_written & 7)) & 7;
        self.bs
            .byte_align()
            .map_err(|e| CodecError::from_io(e, self.bits_written))?;
        self.bits_written += pad;
        Ok(())
    }

    /// Number of bits written so far, padding included.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Flushes the stream and hands back the underlying medium.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        let mut inner = self.bs.into_writer();
        inner.flush().map_err(CodecError::Io)?;
        Ok(inner)
    }
}

impl BsVecWriter {
    pub fn in_memory() -> Self {
        Self::new(Vec::new())
    }
}

impl BsFileWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path).map_err(CodecError::Io)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

pub struct BitStreamReader<R: io::Read> {
    bs: BitReader<R, BigEndian>,
    bits_read: u64,
}

pub type BsSliceReader<'a> = BitStreamReader<io::Cursor<&'a [u8]>>;
pub type BsFileReader = BitStreamReader<BufReader<File>>;

impl<R: io::Read> BitStreamReader<R> {
    pub fn new(read: R) -> Self {
        Self {
            bs: BitReader::new(read),
            bits_read: 0,
        }
    }

    #[inline(always)]
    pub fn read_bit(&mut self) -> Result<bool> {
        let bit = self
            .bs
            .read_bit()
            .map_err(|e| CodecError::from_io(e, self.bits_read))?;
        self.bits_read += 1;
        Ok(bit)
    }

    #[inline(always)]
    pub fn read_bits(&mut self, n: u32) -> Result<u64> {
        check_width(n)?;
        let value: u64 = self
            .bs
            .read_unsigned_var(n)
            .map_err(|e| CodecError::from_io(e, self.bits_read))?;
        self.bits_read += n as u64;
        Ok(value)
    }

    pub fn read_string(&mut self, len: usize) -> Result<Vec<u8>> {
        (0..len).map(|_| Ok(self.read_bits(8)? as u8)).collect()
    }

    /// Number of bits consumed so far.
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }
}

impl<'a> BsSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self::new(io::Cursor::new(buf))
    }
}

impl BsFileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(CodecError::Io)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bits_are_msb_first() -> Result<()> {
        let mut writer = BsVecWriter::in_memory();
        writer.write_bit(true)?;
        writer.write_bits(0b010, 3)?;
        writer.write_bits(0xF, 4)?;
        writer.write_bits(0xA5, 8)?;
        let bytes = writer.finish()?;

        assert_eq!(bytes, vec![0b1010_1111, 0xA5]);
        Ok(())
    }

    #[test]
    fn flush_pads_with_zeros() -> Result<()> {
        let mut writer = BsVecWriter::in_memory();
        writer.write_bits(0b101, 3)?;
        writer.flush()?;
        assert_eq!(writer.bits_written(), 8);
        writer.flush()?;
        assert_eq!(writer.bits_written(), 8);
        let bytes = writer.finish()?;
        assert_eq!(bytes, vec![0b1010_0000]);

        let mut reader = BsSliceReader::from_slice(&bytes);
        assert_eq!(reader.read_bits(3)?, 0b101);
        assert_eq!(reader.read_bits(5)?, 0);
        Ok(())
    }

    #[test]
    fn only_low_bits_are_written() -> Result<()> {
        let mut writer = BsVecWriter::in_memory();
        writer.write_bits(0x1FF, 8)?;
        let bytes = writer.finish()?;
        assert_eq!(bytes, vec![0xFF]);
        Ok(())
    }

    #[test]
    fn full_width_fields() -> Result<()> {
        let mut writer = BsVecWriter::in_memory();
        writer.write_bit(false)?;
        writer.write_bits(u64::MAX - 1, 64)?;
        let bytes = writer.finish()?;
        assert_eq!(bytes.len(), 9);

        let mut reader = BsSliceReader::from_slice(&bytes);
        assert!(!reader.read_bit()?);
        assert_eq!(reader.read_bits(64)?, u64::MAX - 1);
        Ok(())
    }

    #[test]
    fn rejects_bad_widths() {
        let mut writer = BsVecWriter::in_memory();
        assert!(matches!(
            writer.write_bits(1, 0),
            Err(CodecError::InvalidArgument(_))
        ));
        assert!(matches!(
            writer.write_bits(1, 65),
            Err(CodecError::InvalidArgument(_))
        ));

        let mut reader = BsSliceReader::from_slice(&[0xFF]);
        assert!(matches!(
            reader.read_bits(0),
            Err(CodecError::InvalidArgument(_))
        ));
        assert!(matches!(
            reader.read_bits(65),
            Err(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn reading_past_end_fails() -> Result<()> {
        let mut reader = BsSliceReader::from_slice(&[0xC3]);
        assert_eq!(reader.read_bits(6)?, 0b110000);
        assert!(matches!(
            reader.read_bits(4),
            Err(CodecError::UnexpectedEndOfStream { .. })
        ));

        let mut empty = BsSliceReader::from_slice(&[]);
        assert!(matches!(
            empty.read_bit(),
            Err(CodecError::UnexpectedEndOfStream { position: 0 })
        ));
        Ok(())
    }

    #[test]
    fn strings_round_trip() -> Result<()> {
        let mut writer = BsVecWriter::in_memory();
        writer.write_bit(true)?;
        writer.write_string(b"GRC1")?;
        let bytes = writer.finish()?;

        let mut reader = BsSliceReader::from_slice(&bytes);
        assert!(reader.read_bit()?);
        assert_eq!(reader.read_string(4)?, b"GRC1".to_vec());
        Ok(())
    }

    #[test]
    fn file_round_trip() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("grcodec-bs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).map_err(CodecError::Io)?;
        let path = dir.join("bits.bin");

        let mut writer = BsFileWriter::create(&path)?;
        writer.write_bits(0x2A, 7)?;
        writer.finish()?;

        let mut reader = BsFileReader::open(&path)?;
        assert_eq!(reader.read_bits(7)?, 0x2A);
        assert_eq!(reader.read_bit()?, false);
        assert!(reader.read_bit().is_err());

        std::fs::remove_dir_all(&dir).map_err(CodecError::Io)?;
        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = BsFileReader::open("/nonexistent/grcodec/stream.bin");
        assert!(matches!(result, Err(CodecError::Io(_))));
    }

    proptest! {
        #[test]
        fn roundtrip_field_sequences(
            fields in prop::collection::vec((any::<u64>(), 1u32..=64), 1..64)
        ) {
            let mut writer = BsVecWriter::in_memory();
            for &(value, n) in &fields {
                writer.write_bits(value, n).unwrap();
            }
            let total: u64 = fields.iter().map(|&(_, n)| n as u64).sum();
            prop_assert_eq!(writer.bits_written(), total);
            let bytes = writer.finish().unwrap();
            prop_assert_eq!(bytes.len() as u64, total.div_ceil(8));

            let mut reader = BsSliceReader::from_slice(&bytes);
            for &(value, n) in &fields {
                prop_assert_eq!(reader.read_bits(n).unwrap(), low_bits(value, n));
            }
            prop_assert_eq!(reader.bits_read(), total);
        }

        #[test]
        fn odd_flush_does_not_leak_into_fresh_stream(bits in 1u32..8, value in any::<u8>()) {
            let mut writer = BsVecWriter::in_memory();
            writer.write_bits(value as u64, bits).unwrap();
            writer.flush().unwrap();
            writer.write_bits(0xAB, 8).unwrap();
            let bytes = writer.finish().unwrap();
            prop_assert_eq!(bytes.len(), 2);
            prop_assert_eq!(bytes[1], 0xAB);

            let mut reader = BsSliceReader::from_slice(&bytes);
            prop_assert_eq!(reader.read_bits(bits).unwrap(), low_bits(value as u64, bits));
            prop_assert_eq!(reader.read_bits(8 - bits).unwrap(), 0);
            prop_assert_eq!(reader.read_bits(8).unwrap(), 0xAB);
        }
    }
}
