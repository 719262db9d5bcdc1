//! Error types for stream splitting

use std::io;
use thiserror::Error;

use crate::chunk::ChunkType;

/// Fatal splitter error
///
/// Any of these halts the splitter instance; no resynchronization is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The stream does not start with the PNG magic
    #[error("Invalid PNG signature")]
    InvalidSignature,

    /// A chunk handler ran past the declared chunk length
    #[error("Bad chunk size: {chunk} declares {declared} bytes, handler needs {consumed}")]
    BadChunkSize {
        chunk: ChunkType,
        declared: u32,
        consumed: u64,
    },

    /// IHDR carries an unknown color type code
    #[error("Invalid color type: {0}")]
    InvalidColorType(u8),

    /// Stored chunk checksum differs from the computed one
    #[error("CRC mismatch in {chunk} chunk: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        chunk: ChunkType,
        stored: u32,
        computed: u32,
    },
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

/// Result type for splitter operations
pub type Result<T> = std::result::Result<T, Error>;
