//! # amarc lzhuf
//!
//! LZSS + canonical Huffman codec for Amiga LHA/LZH archives.
//!
//! Implements the static-Huffman methods of the LHA family, bit-exact
//! with archives produced by the classic Amiga tools:
//!
//! - **lh0**: stored (no compression)
//! - **lh5**: 8KB window (most common)
//! - **lh6**: 32KB window
//! - **lh7**: 64KB window
//!
//! Compression never grows an entry: when the compressed form would be at
//! least as large as the input, [`compress`] returns the raw bytes with
//! the `unpackable` flag set and the entry is stored instead.
//!
//! ## Example
//!
//! ```rust
//! use amarc_lzhuf::{compress, decompress_verified, CompressionMethod};
//!
//! let raw = b"to be or not to be, that is the question";
//! let packed = compress(CompressionMethod::Lh5, raw);
//!
//! let data = if packed.unpackable {
//!     raw.to_vec()
//! } else {
//!     decompress_verified(CompressionMethod::Lh5, &packed.data, raw.len(), packed.checksum)
//!         .expect("roundtrip failed")
//! };
//! assert_eq!(data, raw);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod decode;
pub mod encode;
pub(crate) mod lzss;
pub mod methods;
pub mod table;
pub(crate) mod tree;

// Re-exports
pub use decode::{decompress, decompress_verified};
pub use encode::{compress, Compressed};
pub use methods::CompressionMethod;
pub use table::DecodeTable;
