//! Decompression: per-block Huffman tables driving a ring-buffer copy.
//!
//! A compressed stream is a sequence of blocks, each opening with a 16-bit
//! token count and three serialized length tables. Tokens are decoded
//! until the declared raw size has been produced; a token stream that
//! would produce more is rejected rather than truncated.

use amarc_core::bitstream::BitReader;
use amarc_core::checksum::Sum16;
use amarc_core::error::{AmarcError, Result};

use crate::methods::constants::{CBIT, NC, NPT, NT, TBIT, THRESHOLD};
use crate::methods::CompressionMethod;
use crate::table::DecodeTable;

/// Decompress `data` into exactly `raw_size` bytes.
///
/// For [`CompressionMethod::None`] the data is returned as-is (it must be
/// at least `raw_size` long). The compressed stream may be followed by
/// padding; trailing bytes are ignored.
pub fn decompress(method: CompressionMethod, data: &[u8], raw_size: usize) -> Result<Vec<u8>> {
    if method.is_stored() {
        if data.len() < raw_size {
            return Err(AmarcError::corrupted(format!(
                "stored entry holds {} of {} bytes",
                data.len(),
                raw_size
            )));
        }
        return Ok(data[..raw_size].to_vec());
    }

    let dict_size = method.dict_size();
    let mut reader = BitReader::new(data);
    let mut block = BlockDecoder::new(method);

    let mut out = Vec::with_capacity(raw_size);
    let mut ring = vec![0u8; dict_size];
    let mut loc = 0usize;
    let mut decoded = 0usize;

    while decoded < raw_size {
        let c = block.decode_c(&mut reader)?;

        if c < 256 {
            ring[loc] = c as u8;
            loc += 1;
            if loc == dict_size {
                out.extend_from_slice(&ring);
                loc = 0;
            }
            decoded += 1;
        } else {
            let len = c as usize - (256 - THRESHOLD);
            let offset = block.decode_p(&mut reader)? as usize + 1;
            let mut pos = (loc + dict_size - offset) & (dict_size - 1);

            decoded += len;
            if decoded > raw_size {
                return Err(AmarcError::output_overrun(raw_size as u64, decoded as u64));
            }

            for _ in 0..len {
                ring[loc] = ring[pos];
                loc += 1;
                if loc == dict_size {
                    out.extend_from_slice(&ring);
                    loc = 0;
                }
                pos = (pos + 1) & (dict_size - 1);
            }
        }
    }

    out.extend_from_slice(&ring[..loc]);
    Ok(out)
}

/// Decompress and verify the stored checksum in one step.
pub fn decompress_verified(
    method: CompressionMethod,
    data: &[u8],
    raw_size: usize,
    checksum: u16,
) -> Result<Vec<u8>> {
    let out = decompress(method, data, raw_size)?;
    let computed = Sum16::compute(&out);
    if computed != checksum {
        return Err(AmarcError::checksum_mismatch(checksum, computed));
    }
    Ok(out)
}

/// Per-block decode state: the three tables plus the remaining token count.
struct BlockDecoder {
    c_table: Option<DecodeTable>,
    p_table: Option<DecodeTable>,
    remaining: u16,
    np: usize,
    pbit: u8,
}

impl BlockDecoder {
    fn new(method: CompressionMethod) -> Self {
        Self {
            c_table: None,
            p_table: None,
            remaining: 0,
            np: method.np(),
            pbit: method.pbit(),
        }
    }

    /// Decode one literal/length symbol, reading block headers as needed.
    fn decode_c(&mut self, reader: &mut BitReader<'_>) -> Result<u16> {
        if self.remaining == 0 {
            self.remaining = reader.get_bits(16);
            if self.remaining == 0 {
                return Err(AmarcError::corrupted(
                    "empty block before declared size was reached".to_string(),
                ));
            }
            let t_table = read_table_lengths(reader, NT, TBIT, true)?;
            self.c_table = Some(read_code_lengths(reader, &t_table)?);
            self.p_table = Some(read_table_lengths(reader, self.np, self.pbit, false)?);
        }
        self.remaining -= 1;

        let table = self.c_table.as_ref().ok_or_else(|| {
            AmarcError::corrupted("token before any block header".to_string())
        })?;
        table.decode(reader)
    }

    /// Decode one match distance (the stored form, distance minus one).
    fn decode_p(&mut self, reader: &mut BitReader<'_>) -> Result<u16> {
        let table = self.p_table.as_ref().ok_or_else(|| {
            AmarcError::corrupted("match before any block header".to_string())
        })?;
        let j = table.decode(reader)?;
        if j == 0 {
            Ok(0)
        } else {
            // j is the bit width; restore the implicit leading 1.
            let low = reader.get_bits(j as u8 - 1) as u32;
            Ok(((1u32 << (j - 1)) + low) as u16)
        }
    }
}

/// Read a meta or offset length table and build its decode table.
///
/// A zero entry count is followed by the single symbol every lookup will
/// yield. `skip_after_runs` enables the 2-bit zero-run count that follows
/// entry 3 of the meta table.
fn read_table_lengths(
    reader: &mut BitReader<'_>,
    alphabet: usize,
    nbit: u8,
    skip_after_runs: bool,
) -> Result<DecodeTable> {
    let n = reader.get_bits(nbit) as usize;
    if n == 0 {
        let symbol = reader.get_bits(nbit);
        return DecodeTable::single(symbol, alphabet, 8);
    }

    let mut len = vec![0u8; NPT.max(alphabet)];
    let mut i = 0;
    while i < n.min(NPT) {
        let mut c = reader.peek_bits(3);
        if c != 7 {
            reader.fill(3);
        } else {
            // Escape: count the 1 bits after the leading 111.
            let mut mask = 1u16 << (16 - 4);
            while mask & reader.bit_buf() != 0 {
                mask >>= 1;
                c += 1;
            }
            if c > 16 + 3 {
                return Err(AmarcError::bad_table(format!(
                    "escaped code length {} exceeds 16 bits",
                    c - 3
                )));
            }
            reader.fill((c - 3) as u8);
        }
        len[i] = c as u8;
        i += 1;

        if skip_after_runs && i == 3 {
            let skip = reader.get_bits(2) as usize;
            for _ in 0..skip {
                if i < NPT {
                    len[i] = 0;
                    i += 1;
                }
            }
        }
    }

    DecodeTable::from_lengths(&len, alphabet, 8)
}

/// Read the literal/length table, run-length decoded through the meta
/// table, and build its decode table.
fn read_code_lengths(reader: &mut BitReader<'_>, t_table: &DecodeTable) -> Result<DecodeTable> {
    let n = reader.get_bits(CBIT) as usize;
    if n == 0 {
        let symbol = reader.get_bits(CBIT);
        return DecodeTable::single(symbol, NC, 12);
    }

    let mut len = vec![0u8; NC];
    let mut i = 0;
    while i < n.min(NC) {
        let c = t_table.decode(reader)?;
        if c <= 2 {
            let zeros = match c {
                0 => 1,
                1 => reader.get_bits(4) as usize + 3,
                _ => reader.get_bits(CBIT) as usize + 20,
            };
            for _ in 0..zeros {
                if i < NC {
                    len[i] = 0;
                    i += 1;
                }
            }
        } else {
            len[i] = (c - 2) as u8;
            i += 1;
        }
    }

    DecodeTable::from_lengths(&len, NC, 12)
}
