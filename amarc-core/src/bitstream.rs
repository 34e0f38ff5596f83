//! Bit-level I/O for variable-length codes.
//!
//! The LZH wire format packs bits MSB-first: the first bit written lands in
//! the most significant bit of the first output byte. Both halves keep the
//! classic 16-bit shift-buffer arithmetic so that canonical Huffman codes
//! can be handled as left-justified 16-bit values.
//!
//! # End of input
//!
//! [`BitReader::fill`] substitutes zero bytes once the input slice is
//! exhausted instead of failing (`endOfStreamFillsZero`). The final byte of
//! a compressed stream is zero-padded, so a decoder regularly reads a few
//! bits past the last meaningful code; structural validation is the job of
//! the table and block layers, not the bit reader. This is intentional
//! wire-format tolerance, required for bit-exact compatibility with
//! existing archives.
//!
//! # Example
//!
//! ```
//! use amarc_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.put_bits(3, 0b101);
//! writer.put_bits(4, 0b1100);
//! writer.flush();
//! let bytes = writer.into_bytes();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.get_bits(3), 0b101);
//! assert_eq!(reader.get_bits(4), 0b1100);
//! ```

/// A bit-level writer accumulating MSB-first bits into a byte buffer.
///
/// An optional byte limit turns the writer into the encoder's "unpackable"
/// detector: once the output would grow past the limit, bytes are dropped
/// and [`BitWriter::overflowed`] latches, letting the encoder abandon the
/// attempt and fall back to raw storage.
#[derive(Debug)]
pub struct BitWriter {
    /// Completed output bytes.
    out: Vec<u8>,
    /// Partially filled byte, used bits at the top.
    sub: u8,
    /// Free bits remaining in `sub` (1..=8).
    free_bits: u8,
    /// Maximum number of output bytes, if bounded.
    limit: Option<usize>,
    /// Whether a byte was dropped because of the limit.
    overflowed: bool,
}

impl BitWriter {
    /// Create an unbounded writer.
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            sub: 0,
            free_bits: 8,
            limit: None,
            overflowed: false,
        }
    }

    /// Create a writer that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            out: Vec::with_capacity(limit),
            sub: 0,
            free_bits: 8,
            limit: Some(limit),
            overflowed: false,
        }
    }

    /// Append the low `count` bits of `value`, MSB first.
    pub fn put_bits(&mut self, count: u8, value: u16) {
        debug_assert!(count <= 16, "cannot write more than 16 bits at once");
        if count == 0 {
            return;
        }
        let mask = if count == 16 {
            u16::MAX
        } else {
            (1u16 << count) - 1
        };
        self.put_code(count, (value & mask) << (16 - count));
    }

    /// Append the top `count` bits of a left-justified 16-bit code.
    ///
    /// Canonical Huffman codes are stored left-justified with zero bits
    /// below the code length, which is exactly what this expects.
    pub fn put_code(&mut self, count: u8, code: u16) {
        let mut count = count as u32;
        let mut code = code as u32;

        while count >= self.free_bits as u32 {
            count -= self.free_bits as u32;
            self.sub = self
                .sub
                .wrapping_add((code >> (16 - self.free_bits as u32)) as u8);
            code <<= self.free_bits as u32;
            self.emit_byte();
        }

        self.sub = self
            .sub
            .wrapping_add((code >> (16 - self.free_bits as u32)) as u8);
        self.free_bits -= count as u8;
    }

    /// Pad the pending partial byte with zero bits and emit it.
    ///
    /// A no-op when the writer is already byte-aligned.
    pub fn flush(&mut self) {
        self.put_bits(7, 0);
    }

    /// Number of bytes emitted so far.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Whether no bytes have been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Whether the byte limit was hit.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Consume the writer and return the output bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    fn emit_byte(&mut self) {
        match self.limit {
            Some(limit) if self.out.len() >= limit => self.overflowed = true,
            _ => self.out.push(self.sub),
        }
        self.sub = 0;
        self.free_bits = 8;
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// A bit-level reader over a byte slice, MSB first.
///
/// Maintains a 16-bit shift buffer plus one pending byte; `peek`/`fill`
/// mirror the writer's arithmetic exactly. Reads past the end of the slice
/// yield zero bits (see the module docs).
#[derive(Debug)]
pub struct BitReader<'a> {
    input: &'a [u8],
    /// Next input byte to fetch.
    pos: usize,
    /// 16-bit shift buffer; valid bits at the top.
    bit_buf: u16,
    /// Pending byte, unconsumed bits at the top.
    sub: u8,
    /// Valid bits remaining in `sub`.
    avail: u8,
}

impl<'a> BitReader<'a> {
    /// Create a reader and prime the 16-bit shift buffer.
    pub fn new(input: &'a [u8]) -> Self {
        let mut reader = Self {
            input,
            pos: 0,
            bit_buf: 0,
            sub: 0,
            avail: 0,
        };
        reader.fill(16);
        reader
    }

    /// Return the next `count` bits without consuming them.
    pub fn peek_bits(&self, count: u8) -> u16 {
        debug_assert!(count <= 16, "cannot peek more than 16 bits at once");
        if count == 0 {
            0
        } else {
            self.bit_buf >> (16 - count)
        }
    }

    /// The raw 16-bit shift buffer, for walking long Huffman codes bit by
    /// bit without consuming them.
    pub fn bit_buf(&self) -> u16 {
        self.bit_buf
    }

    /// Consume `count` bits, refilling the shift buffer from the input.
    pub fn fill(&mut self, count: u8) {
        debug_assert!(count <= 16, "cannot consume more than 16 bits at once");
        let mut n = count;

        while n > self.avail {
            n -= self.avail;
            self.bit_buf = ((((self.bit_buf as u32) << self.avail)
                + ((self.sub as u32) >> (8 - self.avail as u32)))
                & 0xffff) as u16;
            self.sub = self.next_byte();
            self.avail = 8;
        }

        self.avail -= n;
        self.bit_buf = ((((self.bit_buf as u32) << n) + ((self.sub as u32) >> (8 - n as u32)))
            & 0xffff) as u16;
        self.sub = ((self.sub as u16) << n) as u8;
    }

    /// Read and consume `count` bits.
    pub fn get_bits(&mut self, count: u8) -> u16 {
        let bits = self.peek_bits(count);
        self.fill(count);
        bits
    }

    fn next_byte(&mut self) -> u8 {
        if self.pos < self.input.len() {
            let byte = self.input[self.pos];
            self.pos += 1;
            byte
        } else {
            // Zero-fill past end of input.
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_msb_first() {
        let mut writer = BitWriter::new();
        writer.put_bits(4, 0xA);
        writer.put_bits(4, 0xB);
        writer.flush();
        assert_eq!(writer.into_bytes(), vec![0xAB]);
    }

    #[test]
    fn test_writer_sixteen_bits() {
        let mut writer = BitWriter::new();
        writer.put_bits(16, 0xBEEF);
        writer.flush();
        assert_eq!(writer.into_bytes(), vec![0xBE, 0xEF]);
    }

    #[test]
    fn test_writer_flush_pads_with_zeros() {
        let mut writer = BitWriter::new();
        writer.put_bits(3, 0b101);
        writer.flush();
        assert_eq!(writer.into_bytes(), vec![0b1010_0000]);
    }

    #[test]
    fn test_put_code_left_justified() {
        // A 3-bit canonical code 0b110 is stored as 0xC000.
        let mut writer = BitWriter::new();
        writer.put_code(3, 0xC000);
        writer.put_code(5, 0x0800); // 0b00001
        writer.flush();
        assert_eq!(writer.into_bytes(), vec![0b1100_0001]);
    }

    #[test]
    fn test_reader_basic() {
        let data = [0b1011_0101, 0xCD];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.get_bits(1), 1);
        assert_eq!(reader.get_bits(3), 0b011);
        assert_eq!(reader.get_bits(4), 0b0101);
        assert_eq!(reader.get_bits(8), 0xCD);
    }

    #[test]
    fn test_reader_peek_does_not_consume() {
        let data = [0xAB, 0xCD];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.peek_bits(8), 0xAB);
        assert_eq!(reader.peek_bits(8), 0xAB);
        assert_eq!(reader.peek_bits(16), 0xABCD);
        reader.fill(8);
        assert_eq!(reader.peek_bits(8), 0xCD);
    }

    #[test]
    fn test_reader_zero_fills_past_end() {
        let data = [0xFF];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.get_bits(8), 0xFF);
        assert_eq!(reader.get_bits(16), 0);
        assert_eq!(reader.get_bits(16), 0);
    }

    #[test]
    fn test_reader_empty_input() {
        let mut reader = BitReader::new(&[]);
        assert_eq!(reader.get_bits(16), 0);
    }

    #[test]
    fn test_roundtrip_mixed_widths() {
        let mut writer = BitWriter::new();
        writer.put_bits(5, 19);
        writer.put_bits(9, 264);
        writer.put_bits(2, 3);
        writer.put_bits(16, 0x1234);
        writer.put_bits(1, 1);
        writer.flush();
        let bytes = writer.into_bytes();

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.get_bits(5), 19);
        assert_eq!(reader.get_bits(9), 264);
        assert_eq!(reader.get_bits(2), 3);
        assert_eq!(reader.get_bits(16), 0x1234);
        assert_eq!(reader.get_bits(1), 1);
    }

    #[test]
    fn test_writer_limit_latches_overflow() {
        let mut writer = BitWriter::with_limit(1);
        writer.put_bits(16, 0xFFFF);
        assert!(writer.overflowed());
        assert_eq!(writer.into_bytes(), vec![0xFF]);
    }

    #[test]
    fn test_writer_limit_not_hit() {
        let mut writer = BitWriter::with_limit(2);
        writer.put_bits(16, 0xABCD);
        assert!(!writer.overflowed());
        assert_eq!(writer.into_bytes(), vec![0xAB, 0xCD]);
    }
}
