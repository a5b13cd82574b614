use std::io;

/// Result alias used throughout the codec stack.
pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("Unexpected end of stream after {position} bits")]
    UnexpectedEndOfStream { position: u64 },

    #[error("Checksum mismatch in block {block}. Calculated {calculated:#010X}, Read {read:#010X}")]
    ChecksumMismatch {
        block: u64,
        calculated: u32,
        read: u32,
    },

    #[error("{what} mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid stream: {0}")]
    InvalidStream(String),
}

impl CodecError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_stream(msg: impl Into<String>) -> Self {
        Self::InvalidStream(msg.into())
    }

    /// Maps an I/O error raised at bit `position`, turning EOF into
    /// [`CodecError::UnexpectedEndOfStream`].
    pub(crate) fn from_io(err: io::Error, position: u64) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEndOfStream { position }
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_maps_to_end_of_stream() {
        let err = CodecError::from_io(io::Error::from(io::ErrorKind::UnexpectedEof), 17);
        assert!(matches!(
            err,
            CodecError::UnexpectedEndOfStream { position: 17 }
        ));

        let err = CodecError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), 0);
        assert!(matches!(err, CodecError::Io(_)));
    }

    #[test]
    fn checksum_message_is_hex() {
        let err = CodecError::ChecksumMismatch {
            block: 3,
            calculated: 0xDEAD_BEEF,
            read: 0x1,
        };
        assert_eq!(
            err.to_string(),
            "Checksum mismatch in block 3. Calculated 0xDEADBEEF, Read 0x00000001"
        );
    }
}
