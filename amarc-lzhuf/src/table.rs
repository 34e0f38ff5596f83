//! Huffman decode tables built from serialized code lengths.
//!
//! Short codes are resolved with a single direct table lookup; codes longer
//! than the table width fall through to a left/right node walk. The
//! literal/length alphabet uses a 12-bit table, the pretree and offset
//! alphabets an 8-bit one.

use amarc_core::bitstream::BitReader;
use amarc_core::error::{AmarcError, Result};

/// A decode table for one canonical Huffman code.
#[derive(Debug)]
pub struct DecodeTable {
    /// Direct lookup on the next `table_bits` bits. Entries are either a
    /// symbol (`< alphabet`) or an internal-node id into `left`/`right`.
    table: Vec<u16>,
    left: Vec<u16>,
    right: Vec<u16>,
    /// Code length per symbol; 0 for the degenerate single-symbol code.
    len: Vec<u8>,
    alphabet: u16,
    table_bits: u8,
}

impl DecodeTable {
    /// Build the degenerate table for a code with a single symbol.
    ///
    /// Every lookup yields `symbol` and consumes zero bits.
    pub fn single(symbol: u16, alphabet: usize, table_bits: u8) -> Result<Self> {
        if symbol as usize >= alphabet {
            return Err(AmarcError::bad_table(format!(
                "single symbol {symbol} outside alphabet of {alphabet}"
            )));
        }
        Ok(Self {
            table: vec![symbol; 1 << table_bits],
            left: Vec::new(),
            right: Vec::new(),
            len: vec![0; alphabet],
            alphabet: alphabet as u16,
            table_bits,
        })
    }

    /// Build a table from per-symbol code lengths.
    ///
    /// Rejects lengths over 16 bits and codes that do not exactly fill the
    /// code space (over- or under-subscribed length sets).
    pub fn from_lengths(len: &[u8], alphabet: usize, table_bits: u8) -> Result<Self> {
        debug_assert!(len.len() >= alphabet);

        let mut count = [0u16; 17];
        for &l in &len[..alphabet] {
            if l > 16 {
                return Err(AmarcError::bad_table(format!(
                    "code length {l} exceeds 16 bits"
                )));
            }
            count[l as usize] += 1;
        }

        let mut weight = [0u32; 17];
        let mut start = [0u32; 17];
        let mut total: u32 = 0;
        for i in 1..=16u32 {
            start[i as usize] = total & 0xFFFF;
            weight[i as usize] = 1 << (16 - i);
            total += (count[i as usize] as u32) << (16 - i);
        }
        if total != 0x10000 {
            return Err(AmarcError::bad_table(format!(
                "code lengths fill {total:#x}/65536 of the code space"
            )));
        }

        // Short codes index the table directly; scale their start/weight
        // down to table units.
        let m = 16 - table_bits as u32;
        for i in 1..=table_bits as u32 {
            start[i as usize] >>= m;
            weight[i as usize] >>= m;
        }

        let mut table = vec![0u16; 1 << table_bits];
        let arena = 2 * alphabet;
        let mut left = vec![0u16; arena];
        let mut right = vec![0u16; arena];
        let mut avail = alphabet as u16;

        for (symbol, &l) in len[..alphabet].iter().enumerate() {
            if l == 0 {
                continue;
            }
            let l = l as u32;
            if l <= table_bits as u32 {
                let begin = start[l as usize] as usize;
                let end = begin + weight[l as usize] as usize;
                for entry in &mut table[begin..end] {
                    *entry = symbol as u16;
                }
                start[l as usize] += weight[l as usize];
            } else {
                // Long code: walk/extend the node arena below one table
                // entry, branching on the bits past `table_bits`.
                let mut i = (start[l as usize] << table_bits as u32) & 0xFFFF;
                let index = (start[l as usize] >> m) as usize;
                start[l as usize] += weight[l as usize];

                let mut node = TableSlot::Table(index);
                for _ in 0..(l - table_bits as u32) {
                    let entry = match node {
                        TableSlot::Table(k) => table[k],
                        TableSlot::Left(k) => left[k],
                        TableSlot::Right(k) => right[k],
                    };
                    let next = if entry == 0 {
                        let k = avail as usize;
                        if k >= arena {
                            return Err(AmarcError::bad_table(
                                "code tree exceeds node arena".to_string(),
                            ));
                        }
                        left[k] = 0;
                        right[k] = 0;
                        match node {
                            TableSlot::Table(t) => table[t] = avail,
                            TableSlot::Left(t) => left[t] = avail,
                            TableSlot::Right(t) => right[t] = avail,
                        }
                        avail += 1;
                        k
                    } else {
                        entry as usize
                    };
                    node = if i & 0x8000 != 0 {
                        TableSlot::Right(next)
                    } else {
                        TableSlot::Left(next)
                    };
                    i = (i << 1) & 0xFFFF;
                }
                match node {
                    TableSlot::Table(k) => table[k] = symbol as u16,
                    TableSlot::Left(k) => left[k] = symbol as u16,
                    TableSlot::Right(k) => right[k] = symbol as u16,
                }
            }
        }

        Ok(Self {
            table,
            left,
            right,
            len: len[..alphabet].to_vec(),
            alphabet: alphabet as u16,
            table_bits,
        })
    }

    /// Decode one symbol from `reader`.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let mut j = self.table[reader.peek_bits(self.table_bits) as usize];
        if j < self.alphabet {
            reader.fill(self.len[j as usize]);
            return Ok(j);
        }

        // Long code: consume the table prefix, then follow the arena one
        // bit at a time.
        reader.fill(self.table_bits);
        let mut mask = 1u16 << 15;
        loop {
            j = if reader.bit_buf() & mask != 0 {
                self.right[j as usize]
            } else {
                self.left[j as usize]
            };
            if j < self.alphabet {
                break;
            }
            mask >>= 1;
            if mask == 0 {
                return Err(AmarcError::corrupted(
                    "symbol code exceeds 16 bits".to_string(),
                ));
            }
        }
        reader.fill(self.len[j as usize] - self.table_bits);
        Ok(j)
    }
}

/// Where the next arena link lives during table construction.
enum TableSlot {
    Table(usize),
    Left(usize),
    Right(usize),
}
