//! The 16-bit additive checksum used by archive entries.
//!
//! Every byte of the *uncompressed* entry data is folded into a running
//! 16-bit sum, independent of the compression method chosen for the entry.
//! The consumer recomputes the sum after decompression and compares it with
//! the stored value.

/// Running 16-bit additive checksum.
///
/// # Example
///
/// ```
/// use amarc_core::checksum::Sum16;
///
/// let mut sum = Sum16::new();
/// sum.add(b"aaaa");
/// sum.add(b"aaaaaaa");
/// assert_eq!(sum.value(), 0x042B);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum16 {
    value: u16,
}

impl Sum16 {
    /// Create a checksum at the identity value (0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `bytes` into the running sum.
    pub fn add(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.value = self.value.wrapping_add(byte as u16);
        }
    }

    /// The accumulated 16-bit sum.
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Checksum a whole buffer at once.
    pub fn compute(bytes: &[u8]) -> u16 {
        let mut sum = Self::new();
        sum.add(bytes);
        sum.value()
    }
}
