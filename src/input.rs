use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Buffered reader over a file or stdin ("-").
pub struct InputReader {
    reader: Box<dyn Read>,
    is_pipe: bool,
    len: Option<u64>,
    bytes_read: u64,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref();
        let is_pipe = is_stdio(path);

        let (reader, len): (Box<dyn Read>, _) = if is_pipe {
            (Box::new(io::stdin().lock()), None)
        } else {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            let len = file.metadata().ok().map(|m| m.len());
            (Box::new(BufReader::new(file)), len)
        };

        Ok(Self {
            reader,
            is_pipe,
            len,
            bytes_read: 0,
        })
    }

    /// Total input size, when known up front (regular files).
    pub fn size_hint(&self) -> Option<u64> {
        self.len
    }

    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        self.bytes_read += data.len() as u64;
        Ok(data)
    }

    /// Fills `buffer` completely. Returns `false` on a clean end of input
    /// and fails if the input ends part way through the buffer.
    pub fn read_record(&mut self, buffer: &mut [u8]) -> Result<bool> {
        let mut filled = 0;
        while filled < buffer.len() {
            let n = self.reader.read(&mut buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.bytes_read += filled as u64;

        match filled {
            0 => Ok(false),
            n if n == buffer.len() => Ok(true),
            n => anyhow::bail!(
                "Input ends inside a record: got {n} of {} bytes",
                buffer.len()
            ),
        }
    }

    /// Reads fixed-size records until the input ends.
    pub fn process_records<F>(&mut self, record_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let mut buffer = vec![0u8; record_size];
        while self.read_record(&mut buffer)? {
            callback(&buffer)?;
        }
        Ok(())
    }
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Buffered writer to a file or stdout ("-").
pub fn create_output<P: AsRef<Path>>(output_path: P) -> Result<Box<dyn Write>> {
    let path = output_path.as_ref();
    if is_stdio(path) {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn input_with(bytes: &[u8]) -> (tempfile::NamedTempFile, InputReader) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        let reader = InputReader::new(file.path()).unwrap();
        (file, reader)
    }

    #[test]
    fn records_split_input() {
        let (_file, mut reader) = input_with(&[1, 2, 3, 4, 5, 6]);
        assert!(!reader.is_pipe());
        assert_eq!(reader.size_hint(), Some(6));

        let mut records = Vec::new();
        reader
            .process_records(3, |r| {
                records.push(r.to_vec());
                Ok(())
            })
            .unwrap();
        assert_eq!(records, vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(reader.bytes_read(), 6);
    }

    #[test]
    fn partial_record_is_an_error() {
        let (_file, mut reader) = input_with(&[1, 2, 3, 4]);
        let err = reader.process_records(3, |_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("1 of 3"));
    }

    #[test]
    fn missing_input_names_the_file() {
        let err = InputReader::new("/nonexistent/grc-input.raw").err().unwrap();
        assert!(err.to_string().contains("grc-input.raw"));
    }
}
