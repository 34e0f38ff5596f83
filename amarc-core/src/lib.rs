//! # amarc core
//!
//! Core components for the amarc toolkit for legacy Amiga file formats.
//!
//! This crate provides the building blocks shared by the format
//! implementations:
//!
//! - [`bitstream`]: MSB-first bit-level I/O for variable-length codes
//! - [`checksum`]: the 16-bit additive checksum used by archive entries
//! - [`vfs`]: abstract directory/file interfaces shared by the archive and
//!   disk-image subsystems
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```rust
//! use amarc_core::bitstream::{BitReader, BitWriter};
//! use amarc_core::checksum::Sum16;
//!
//! let mut writer = BitWriter::new();
//! writer.put_bits(12, 0xABC);
//! writer.flush();
//! let bytes = writer.into_bytes();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.get_bits(12), 0xABC);
//!
//! assert_eq!(Sum16::compute(b"aaaaaaaaaaa"), 0x042B);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod checksum;
pub mod error;
pub mod vfs;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use checksum::Sum16;
pub use error::{AmarcError, Result};
pub use vfs::{Directory, DirectoryEntry, File};
