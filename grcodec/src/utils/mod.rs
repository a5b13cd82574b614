//! Supporting infrastructure.
//!
//! Provides bit-level stream I/O, the error taxonomy and the block checksum
//! used by the strict audio coder.

pub mod bitstream_io;
pub mod checksum;
pub mod errors;
