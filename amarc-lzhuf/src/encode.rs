//! Compression: LZSS tokenization plus per-block Huffman coding.
//!
//! Tokens are staged until roughly a buffer's worth has accumulated, then
//! flushed as one block: three Huffman codes are built from the staged
//! frequencies (literal/length, meta, offset), their length tables are
//! serialized, and the tokens follow. The output writer is capped at the
//! input size; if the cap is hit the attempt is abandoned and the caller
//! stores the entry raw.

use amarc_core::bitstream::BitWriter;
use amarc_core::checksum::Sum16;

use crate::lzss::{MatchData, SlidingDict};
use crate::methods::constants::{BUFFER_SIZE, CBIT, NC, NT, TBIT, THRESHOLD};
use crate::methods::CompressionMethod;
use crate::tree::{build_tree, BuiltTree};

/// The result of compressing one entry.
#[derive(Debug)]
pub struct Compressed {
    /// Compressed bytes, or the original bytes when `unpackable`.
    pub data: Vec<u8>,
    /// 16-bit additive checksum of the original data.
    pub checksum: u16,
    /// Whether the entry must be stored raw because compression did not
    /// shrink it (always set for [`CompressionMethod::None`]).
    pub unpackable: bool,
}

/// Compress `raw` with `method`.
///
/// Falls back to the raw bytes (with `unpackable` set) whenever the
/// compressed form would be at least as large as the input, so the result
/// never exceeds the input size.
pub fn compress(method: CompressionMethod, raw: &[u8]) -> Compressed {
    let checksum = Sum16::compute(raw);
    if method.is_stored() {
        return Compressed {
            data: raw.to_vec(),
            checksum,
            unpackable: true,
        };
    }
    match try_compress(method, raw) {
        Some(data) => Compressed {
            data,
            checksum,
            unpackable: false,
        },
        None => Compressed {
            data: raw.to_vec(),
            checksum,
            unpackable: true,
        },
    }
}

/// One staged LZSS token.
#[derive(Debug, Clone, Copy)]
enum Token {
    Literal(u8),
    /// `code` is the length mapped into the literal/length alphabet;
    /// `pos` is the distance minus one, masked to the dictionary.
    Match { code: u16, pos: u16 },
}

/// Number of bits needed to represent `p` (0 for 0).
fn bit_width(mut p: u16) -> usize {
    let mut c = 0;
    while p != 0 {
        p >>= 1;
        c += 1;
    }
    c
}

/// Staged tokens and frequencies for the block in progress.
struct BlockEncoder {
    tokens: Vec<Token>,
    c_freq: Vec<u16>,
    p_freq: Vec<u16>,
    /// Byte cost of the staged tokens (flag bytes included), used to
    /// decide when to flush a block.
    staged: usize,
    /// Tokens left in the current 8-token flag group.
    group: u8,
    np: usize,
    pbit: u8,
}

impl BlockEncoder {
    fn new(method: CompressionMethod) -> Self {
        Self {
            tokens: Vec::new(),
            c_freq: vec![0; NC],
            p_freq: vec![0; method.np()],
            staged: 0,
            group: 0,
            np: method.np(),
            pbit: method.pbit(),
        }
    }

    fn push(&mut self, token: Token, writer: &mut BitWriter) {
        if self.group == 0 {
            self.group = 8;
            if self.staged >= BUFFER_SIZE - 3 * 8 {
                self.send_block(writer);
                if writer.overflowed() {
                    return;
                }
                self.staged = 0;
            }
            self.staged += 1;
        }
        self.group -= 1;

        match token {
            Token::Literal(b) => {
                self.staged += 1;
                self.c_freq[b as usize] += 1;
            }
            Token::Match { code, pos } => {
                self.staged += 3;
                self.c_freq[code as usize] += 1;
                self.p_freq[bit_width(pos)] += 1;
            }
        }
        self.tokens.push(token);
    }

    /// Flush the staged tokens as one block.
    fn send_block(&mut self, writer: &mut BitWriter) {
        let c_tree = build_tree(&self.c_freq);
        writer.put_bits(16, self.tokens.len() as u16);

        match c_tree.single {
            Some(symbol) => {
                // One distinct literal/length symbol: no tables at all,
                // just the symbol itself.
                writer.put_bits(TBIT, 0);
                writer.put_bits(TBIT, 0);
                writer.put_bits(CBIT, 0);
                writer.put_bits(CBIT, symbol);
            }
            None => {
                let t_freq = count_meta_freq(&c_tree.len);
                let t_tree = build_tree(&t_freq);
                match t_tree.single {
                    Some(symbol) => {
                        writer.put_bits(TBIT, 0);
                        writer.put_bits(TBIT, symbol);
                    }
                    None => write_table_lengths(writer, &t_tree, NT, TBIT, Some(3)),
                }
                write_code_lengths(writer, &c_tree, &t_tree);
            }
        }

        let p_tree = build_tree(&self.p_freq);
        match p_tree.single {
            Some(symbol) => {
                writer.put_bits(self.pbit, 0);
                writer.put_bits(self.pbit, symbol);
            }
            None => write_table_lengths(writer, &p_tree, self.np, self.pbit, None),
        }

        for token in &self.tokens {
            match *token {
                Token::Literal(b) => {
                    writer.put_code(c_tree.len[b as usize], c_tree.code[b as usize]);
                }
                Token::Match { code, pos } => {
                    writer.put_code(c_tree.len[code as usize], c_tree.code[code as usize]);
                    let c = bit_width(pos);
                    writer.put_code(p_tree.len[c], p_tree.code[c]);
                    if c > 1 {
                        // Drop the implicit leading 1 bit.
                        writer.put_bits(c as u8 - 1, pos);
                    }
                }
            }
            if writer.overflowed() {
                break;
            }
        }

        self.tokens.clear();
        self.c_freq.iter_mut().for_each(|f| *f = 0);
        self.p_freq.iter_mut().for_each(|f| *f = 0);
    }

    fn finish(&mut self, writer: &mut BitWriter) {
        self.send_block(writer);
        writer.flush();
    }
}

/// Meta-symbol frequencies for a literal/length table, mirroring the
/// run-length scheme [`write_code_lengths`] will emit.
fn count_meta_freq(c_len: &[u8]) -> [u16; NT] {
    let mut t_freq = [0u16; NT];
    let mut n = NC;
    while n > 0 && c_len[n - 1] == 0 {
        n -= 1;
    }

    let mut i = 0;
    while i < n {
        let k = c_len[i];
        i += 1;
        if k == 0 {
            let mut count = 1u16;
            while i < n && c_len[i] == 0 {
                i += 1;
                count += 1;
            }
            if count <= 2 {
                t_freq[0] += count;
            } else if count <= 18 {
                t_freq[1] += 1;
            } else if count == 19 {
                t_freq[0] += 1;
                t_freq[1] += 1;
            } else {
                t_freq[2] += 1;
            }
        } else {
            t_freq[k as usize + 2] += 1;
        }
    }
    t_freq
}

/// Serialize a meta or offset length table.
///
/// Lengths 0..=6 are written in 3 bits; a longer length `k` as `k - 4` one
/// bits closed with a zero. For the meta table, a 2-bit zero-run count
/// follows entry 3 so the three run symbols can be skipped cheaply.
fn write_table_lengths(
    writer: &mut BitWriter,
    tree: &BuiltTree,
    alphabet: usize,
    nbit: u8,
    special: Option<usize>,
) {
    let mut n = alphabet;
    while n > 0 && tree.len[n - 1] == 0 {
        n -= 1;
    }
    writer.put_bits(nbit, n as u16);

    let mut i = 0;
    while i < n {
        let k = tree.len[i];
        i += 1;
        if k <= 6 {
            writer.put_bits(3, k as u16);
        } else {
            writer.put_bits(k - 3, 0xFFFE);
        }
        if special == Some(i) {
            while i < 6 && tree.len[i] == 0 {
                i += 1;
            }
            writer.put_bits(2, (i - 3) as u16);
        }
    }
}

/// Serialize the literal/length table, run-length coded through the meta
/// code: symbol 0 is one zero, symbol 1 a 3..=18 zero run, symbol 2 a
/// 20..=531 zero run, and symbol `k + 2` a literal length `k`.
fn write_code_lengths(writer: &mut BitWriter, c_tree: &BuiltTree, t_tree: &BuiltTree) {
    let mut n = NC;
    while n > 0 && c_tree.len[n - 1] == 0 {
        n -= 1;
    }
    writer.put_bits(CBIT, n as u16);

    let mut i = 0;
    while i < n {
        let k = c_tree.len[i];
        i += 1;
        if k == 0 {
            let mut count = 1u16;
            while i < n && c_tree.len[i] == 0 {
                i += 1;
                count += 1;
            }
            if count <= 2 {
                for _ in 0..count {
                    writer.put_code(t_tree.len[0], t_tree.code[0]);
                }
            } else if count <= 18 {
                writer.put_code(t_tree.len[1], t_tree.code[1]);
                writer.put_bits(4, count - 3);
            } else if count == 19 {
                writer.put_code(t_tree.len[0], t_tree.code[0]);
                writer.put_code(t_tree.len[1], t_tree.code[1]);
                writer.put_bits(4, 15);
            } else {
                writer.put_code(t_tree.len[2], t_tree.code[2]);
                writer.put_bits(CBIT, count - 20);
            }
        } else {
            let s = k as usize + 2;
            writer.put_code(t_tree.len[s], t_tree.code[s]);
        }
    }
}

fn try_compress(method: CompressionMethod, raw: &[u8]) -> Option<Vec<u8>> {
    let dict_size = method.dict_size();
    let mut writer = BitWriter::with_limit(raw.len());
    let mut block = BlockEncoder::new(method);
    let mut dict = SlidingDict::new(dict_size, raw);

    let mut m = MatchData {
        len: (THRESHOLD - 1).min(dict.remainder),
        offset: 0,
    };
    dict.insert();

    while dict.remainder > 0 && !writer.overflowed() {
        let last = m;

        dict.next_token();
        m = dict.search(last.len.saturating_sub(1));
        dict.insert();

        if m.len > last.len || last.len < THRESHOLD {
            block.push(Token::Literal(dict.prev_byte()), &mut writer);
        } else {
            // Lazy matching: the previous position's match won, emit it
            // and advance past the matched bytes.
            block.push(
                Token::Match {
                    code: (last.len + 256 - THRESHOLD) as u16,
                    pos: ((last.offset - 1) & (dict_size - 1)) as u16,
                },
                &mut writer,
            );
            let mut n = last.len - 1;
            while n > 1 {
                dict.next_token();
                dict.insert();
                n -= 1;
            }
            dict.next_token();
            m = dict.search(THRESHOLD - 1);
            dict.insert();
        }
    }

    if writer.overflowed() {
        return None;
    }
    block.finish(&mut writer);
    if writer.overflowed() {
        return None;
    }
    Some(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_method_is_identity() {
        let raw = b"some data".to_vec();
        let out = compress(CompressionMethod::None, &raw);
        assert!(out.unpackable);
        assert_eq!(out.data, raw);
        assert_eq!(out.checksum, Sum16::compute(&raw));
    }

    #[test]
    fn test_repetitive_input_packs() {
        let raw = b"aaaaaaaaaaa";
        let out = compress(CompressionMethod::Lh5, raw);
        assert!(!out.unpackable);
        assert!(out.data.len() < raw.len());
        assert_eq!(out.checksum, 0x042B);
    }

    #[test]
    fn test_tiny_input_falls_back_to_raw() {
        // Header overhead alone exceeds three bytes.
        let raw = b"aaa";
        let out = compress(CompressionMethod::Lh5, raw);
        assert!(out.unpackable);
        assert_eq!(out.data, raw);
    }

    #[test]
    fn test_empty_input_falls_back_to_raw() {
        let out = compress(CompressionMethod::Lh7, &[]);
        assert!(out.unpackable);
        assert!(out.data.is_empty());
        assert_eq!(out.checksum, 0);
    }

    #[test]
    fn test_output_never_exceeds_input() {
        // Pseudo-random bytes are incompressible.
        let mut state = 0x2545F491u32;
        let raw: Vec<u8> = (0..4096)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 24) as u8
            })
            .collect();
        let out = compress(CompressionMethod::Lh5, &raw);
        assert!(out.data.len() <= raw.len());
        if out.unpackable {
            assert_eq!(out.data, raw);
        }
    }

    #[test]
    fn test_bit_width() {
        assert_eq!(bit_width(0), 0);
        assert_eq!(bit_width(1), 1);
        assert_eq!(bit_width(2), 2);
        assert_eq!(bit_width(3), 2);
        assert_eq!(bit_width(0x1FFF), 13);
        assert_eq!(bit_width(0xFFFF), 16);
    }
}
