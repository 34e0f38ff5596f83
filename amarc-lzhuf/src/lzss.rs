//! LZSS sliding-window match finder.
//!
//! Matches are located through a 15-bit rolling hash over 3-byte prefixes:
//! each bucket holds the most recent window position for its hash, and a
//! per-position chain links back through earlier occurrences. Buckets whose
//! chains blow the probe budget are flagged and subsequent searches key on
//! a token a few bytes ahead instead, trading a little match length for
//! bounded work on degenerate input.

use crate::methods::constants::{HASH_CHAIN_LIMIT, HASH_MASK, HASH_SIZE, MAX_MATCH, THRESHOLD};

/// A candidate match: length and backward distance.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MatchData {
    pub len: usize,
    pub offset: usize,
}

/// One hash bucket: the newest position for this token, plus the flag
/// marking its chain as too long to walk in full.
#[derive(Debug, Clone, Copy, Default)]
struct HashSlot {
    position: usize,
    too_long: bool,
}

fn init_hash(text: &[u8], position: usize) -> usize {
    ((((text[position] as usize) << 5) ^ text[position + 1] as usize) << 5
        ^ text[position + 2] as usize)
        & HASH_MASK
}

fn next_hash(hash: usize, text: &[u8], position: usize) -> usize {
    ((hash << 5) ^ text[position + 2] as usize) & HASH_MASK
}

/// The text window plus hash state, fed incrementally from an input slice.
///
/// The window holds two dictionaries' worth of text plus `MAX_MATCH` bytes
/// of slack; when the cursor runs into the slack region the upper half
/// slides down and all recorded positions are rebased. Position 0 doubles
/// as the nil chain link, which is safe because live positions never drop
/// below `dict_size` after rebasing subtracts at most one dictionary.
pub(crate) struct SlidingDict<'a> {
    text: Vec<u8>,
    dict_size: usize,
    data: &'a [u8],
    data_pos: usize,
    /// Unencoded bytes at or after `position`.
    pub remainder: usize,
    /// Current cursor into `text`.
    pub position: usize,
    /// Rolling hash of the 3 bytes at `position`.
    pub token: usize,
    hash: Vec<HashSlot>,
    /// Previous position with the same hash, indexed by position masked to
    /// the dictionary.
    prev: Vec<usize>,
}

impl<'a> SlidingDict<'a> {
    pub fn new(dict_size: usize, data: &'a [u8]) -> Self {
        let text_size = dict_size * 2 + MAX_MATCH;
        let mut dict = Self {
            text: vec![0; text_size],
            dict_size,
            data,
            data_pos: 0,
            remainder: 0,
            position: dict_size,
            token: 0,
            hash: vec![HashSlot::default(); HASH_SIZE],
            prev: vec![0; dict_size],
        };
        dict.remainder = dict.read_into(dict_size, text_size - dict_size);
        dict.token = init_hash(&dict.text, dict.position);
        dict
    }

    /// Copy up to `size` input bytes into `text[offset..]`.
    fn read_into(&mut self, offset: usize, size: usize) -> usize {
        let n = size.min(self.data.len() - self.data_pos);
        self.text[offset..offset + n]
            .copy_from_slice(&self.data[self.data_pos..self.data_pos + n]);
        self.data_pos += n;
        n
    }

    /// The byte just behind the cursor (the literal to emit after an
    /// advance that found no match).
    pub fn prev_byte(&self) -> u8 {
        self.text[self.position - 1]
    }

    /// Record the current position in its hash chain.
    pub fn insert(&mut self) {
        self.prev[self.position & (self.dict_size - 1)] = self.hash[self.token].position;
        self.hash[self.token].position = self.position;
    }

    /// Advance the cursor one byte, sliding the window if needed.
    pub fn next_token(&mut self) {
        self.remainder -= 1;
        self.position += 1;
        if self.position >= self.text.len() - MAX_MATCH {
            self.slide();
        }
        self.token = next_hash(self.token, &self.text, self.position);
    }

    /// Slide the window down one dictionary and refill from the input.
    fn slide(&mut self) {
        let text_size = self.text.len();
        self.text.copy_within(self.dict_size.., 0);
        let n = self.read_into(text_size - self.dict_size, self.dict_size);
        self.remainder += n;
        self.position -= self.dict_size;

        for slot in &mut self.hash {
            slot.position = if slot.position > self.dict_size {
                slot.position - self.dict_size
            } else {
                0
            };
            slot.too_long = false;
        }
        for link in &mut self.prev {
            *link = if *link > self.dict_size {
                *link - self.dict_size
            } else {
                0
            };
        }
    }

    /// Find the longest match at the cursor, at least `min_len + 1` long.
    pub fn search(&mut self, min_len: usize) -> MatchData {
        let min_len = min_len.max(THRESHOLD - 1);
        let mut m = MatchData {
            len: min_len,
            offset: 0,
        };

        // Overloaded bucket: key on a token further ahead so the chain we
        // walk is one that still has headroom.
        let mut offset = 0;
        let mut tok = self.token;
        while self.hash[tok].too_long && offset < MAX_MATCH - THRESHOLD {
            offset += 1;
            tok = next_hash(tok, &self.text, self.position + offset);
        }
        if offset == MAX_MATCH - THRESHOLD {
            offset = 0;
            tok = self.token;
        }

        self.search_chain(tok, offset, MAX_MATCH, &mut m);

        if offset > 0 && m.len < offset + 3 {
            // The shifted search cannot see matches shorter than the shift;
            // rescan the true chain for those.
            self.search_chain(self.token, 0, offset + 2, &mut m);
        }

        if m.len > self.remainder {
            m.len = self.remainder;
        }
        m
    }

    /// Walk one hash chain, improving `m` in place.
    fn search_chain(&mut self, token: usize, offset: usize, max_len: usize, m: &mut MatchData) {
        let mut chain = 0usize;
        let mut scan_position = self.hash[token].position;
        let mut scan_begin = scan_position as isize - offset as isize;
        let scan_end = (self.position - self.dict_size) as isize;

        while scan_begin > scan_end {
            chain += 1;
            let begin = scan_begin as usize;

            // Cheap reject: the byte that would extend the current best.
            if self.text[begin + m.len] == self.text[self.position + m.len] {
                let mut len = 0;
                while len < max_len && self.text[begin + len] == self.text[self.position + len] {
                    len += 1;
                }
                if len > m.len {
                    m.offset = self.position - begin;
                    m.len = len;
                    if len == max_len {
                        break;
                    }
                }
            }

            scan_position = self.prev[scan_position & (self.dict_size - 1)];
            scan_begin = scan_position as isize - offset as isize;
        }

        if chain >= HASH_CHAIN_LIMIT {
            self.hash[token].too_long = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DICT: usize = 1 << 13;

    #[test]
    fn test_finds_simple_repeat() {
        // "abcdefabcdef...": after the first 6 literals the finder should
        // see a distance-6 match.
        let data: Vec<u8> = b"abcdef".iter().copied().cycle().take(64).collect();
        let mut dict = SlidingDict::new(DICT, &data);

        dict.insert();
        for _ in 0..5 {
            dict.next_token();
            let m = dict.search(2);
            dict.insert();
            assert_eq!(m.offset, 0, "no match expected in the first period");
        }
        dict.next_token();
        let m = dict.search(2);
        dict.insert();
        assert_eq!(m.offset, 6);
        assert!(m.len >= THRESHOLD);
    }

    #[test]
    fn test_match_clamped_to_remainder() {
        let data = vec![b'x'; 10];
        let mut dict = SlidingDict::new(DICT, &data);
        dict.insert();
        dict.next_token();
        let m = dict.search(2);
        assert!(m.len <= dict.remainder);
    }

    #[test]
    fn test_run_match_caps_at_max_match() {
        let data = vec![0u8; 4096];
        let mut dict = SlidingDict::new(DICT, &data);
        dict.insert();
        dict.next_token();
        let m = dict.search(2);
        dict.insert();
        assert_eq!(m.offset, 1);
        assert_eq!(m.len, MAX_MATCH);
    }

    #[test]
    fn test_prev_byte_tracks_cursor() {
        let data = b"hello".to_vec();
        let mut dict = SlidingDict::new(DICT, &data);
        dict.insert();
        dict.next_token();
        assert_eq!(dict.prev_byte(), b'h');
        dict.next_token();
        assert_eq!(dict.prev_byte(), b'e');
    }

    #[test]
    fn test_slide_preserves_matches() {
        // Enough data to force at least one window slide; the finder must
        // keep producing valid offsets afterwards.
        let period = 17usize;
        let data: Vec<u8> = (0..DICT * 4)
            .map(|i| (i % period) as u8)
            .collect();
        let mut dict = SlidingDict::new(DICT, &data);
        dict.insert();

        let mut advanced = 1usize;
        while dict.remainder > 0 {
            dict.next_token();
            advanced += 1;
            let m = dict.search(2);
            dict.insert();
            if m.len >= THRESHOLD && m.offset > 0 {
                // A match must reproduce the bytes it claims.
                for k in 0..m.len {
                    assert_eq!(
                        dict.text[dict.position - m.offset + k],
                        dict.text[dict.position + k]
                    );
                }
            }
            if advanced > DICT * 3 {
                break;
            }
        }
    }
}
