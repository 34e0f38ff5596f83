//! Compression method definitions.
//!
//! Archive entries carry a 5-byte ASCII method tag. This toolkit supports
//! the three static-Huffman variants plus raw storage:
//!
//! - `-lh0-`: stored (no compression)
//! - `-lh5-`: 8 KiB window (most common)
//! - `-lh6-`: 32 KiB window
//! - `-lh7-`: 64 KiB window

use amarc_core::error::{AmarcError, Result};

/// Compression method for an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    /// `-lh0-`: stored (no compression).
    None,
    /// `-lh5-`: 8 KiB window, 4-bit offset-code counts.
    #[default]
    Lh5,
    /// `-lh6-`: 32 KiB window, 5-bit offset-code counts.
    Lh6,
    /// `-lh7-`: 64 KiB window, 5-bit offset-code counts.
    Lh7,
}

impl CompressionMethod {
    /// Parse a method from its 5-byte tag.
    pub fn from_id(id: &[u8]) -> Option<Self> {
        match id {
            b"-lh0-" => Some(Self::None),
            b"-lh5-" => Some(Self::Lh5),
            b"-lh6-" => Some(Self::Lh6),
            b"-lh7-" => Some(Self::Lh7),
            _ => None,
        }
    }

    /// Parse a method from its 5-byte tag, rejecting unknown tags.
    ///
    /// This is the entry-header path: a tag the toolkit cannot decompress
    /// is reported as [`AmarcError::UnsupportedMethod`].
    pub fn try_from_id(id: &[u8]) -> Result<Self> {
        Self::from_id(id)
            .ok_or_else(|| AmarcError::unsupported_method(String::from_utf8_lossy(id)))
    }

    /// The 5-byte method tag.
    pub fn id(&self) -> &'static [u8; 5] {
        match self {
            Self::None => b"-lh0-",
            Self::Lh5 => b"-lh5-",
            Self::Lh6 => b"-lh6-",
            Self::Lh7 => b"-lh7-",
        }
    }

    /// Dictionary-size exponent: the window holds `1 << dict_bits()` bytes.
    pub fn dict_bits(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lh5 => 13,
            Self::Lh6 => 15,
            Self::Lh7 => 16,
        }
    }

    /// Sliding window size in bytes.
    pub fn dict_size(&self) -> usize {
        match self {
            Self::None => 0,
            _ => 1 << self.dict_bits(),
        }
    }

    /// Bit width of the offset-table code counts.
    pub fn pbit(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lh5 => 4,
            Self::Lh6 | Self::Lh7 => 5,
        }
    }

    /// Offset alphabet size (`dict_bits + 1`).
    pub fn np(&self) -> usize {
        self.dict_bits() as usize + 1
    }

    /// Whether this method stores data uncompressed.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Short method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "lh0",
            Self::Lh5 => "lh5",
            Self::Lh6 => "lh6",
            Self::Lh7 => "lh7",
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Codec constants shared by the encoder and decoder.
pub mod constants {
    /// Maximum match length.
    pub const MAX_MATCH: usize = 256;
    /// Minimum match length; shorter repeats are emitted as literals.
    pub const THRESHOLD: usize = 3;
    /// Literal/length alphabet size: 256 literals plus the match lengths.
    pub const NC: usize = 255 + MAX_MATCH + 2 - THRESHOLD;
    /// Meta ("pretree") alphabet size.
    pub const NT: usize = 19;
    /// Storage size for pretree/offset length arrays.
    pub const NPT: usize = 0x80;
    /// Largest offset alphabet (`-lh7-`: 16-bit offsets + 1).
    pub const NP_MAX: usize = 17;
    /// Bit width of the meta-table code count.
    pub const TBIT: u8 = 5;
    /// Bit width of the literal/length-table code count.
    pub const CBIT: u8 = 9;
    /// Hash-bucket count for the match finder (15-bit hash).
    pub const HASH_SIZE: usize = 1 << 15;
    /// Mask applied to the rolling hash.
    pub const HASH_MASK: usize = HASH_SIZE - 1;
    /// Chain probes allowed before a bucket is flagged "too long".
    pub const HASH_CHAIN_LIMIT: usize = 0x100;
    /// Staging-buffer budget that triggers a block flush.
    pub const BUFFER_SIZE: usize = 16 * 1024 * 2;
}
