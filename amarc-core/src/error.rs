//! Error types for amarc operations.
//!
//! One error enum covers the whole toolkit: format violations detected
//! while parsing a compressed stream, integrity mismatches detected after
//! decompression, and I/O errors from underlying readers/writers. Format
//! errors and integrity mismatches are deliberately distinct variants: a
//! stream can be structurally valid yet carry corrupted data.

use std::io;
use thiserror::Error;

/// The main error type for amarc operations.
#[derive(Debug, Error)]
pub enum AmarcError {
    /// I/O error from an underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported or unknown compression method.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compression method identifier.
        method: String,
    },

    /// A Huffman table whose code lengths do not form a valid canonical code.
    #[error("Bad Huffman table: {message}")]
    BadHuffmanTable {
        /// Description of the violation.
        message: String,
    },

    /// Corrupted data in a compressed stream.
    #[error("Corrupted data: {message}")]
    CorruptedData {
        /// Description of the corruption.
        message: String,
    },

    /// Token stream produced more or fewer bytes than the declared raw size.
    #[error("Decoded size mismatch: declared {declared} bytes, produced {produced}")]
    OutputOverrun {
        /// Raw size declared by the entry header.
        declared: u64,
        /// Bytes actually produced by the token stream.
        produced: u64,
    },

    /// Checksum computed over decompressed data disagrees with the stored one.
    #[error("Checksum mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    ChecksumMismatch {
        /// Checksum stored in the archive.
        expected: u16,
        /// Checksum computed from the data.
        computed: u16,
    },
}

/// Result type alias for amarc operations.
pub type Result<T> = std::result::Result<T, AmarcError>;

impl AmarcError {
    /// Create an unsupported method error.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Create a bad Huffman table error.
    pub fn bad_table(message: impl Into<String>) -> Self {
        Self::BadHuffmanTable {
            message: message.into(),
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::CorruptedData {
            message: message.into(),
        }
    }

    /// Create a decoded size mismatch error.
    pub fn output_overrun(declared: u64, produced: u64) -> Self {
        Self::OutputOverrun { declared, produced }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(expected: u16, computed: u16) -> Self {
        Self::ChecksumMismatch { expected, computed }
    }
}
