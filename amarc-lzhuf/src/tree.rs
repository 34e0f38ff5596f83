//! Length-limited canonical Huffman tree construction (encoder side).
//!
//! Builds code lengths from symbol frequencies with a binary min-heap, then
//! limits lengths to 16 bits by demoting leaves and reassigns canonical
//! codes. The decoder never sees the tree itself, only the length array
//! serialized into the block header.

/// A built code: per-symbol lengths and left-justified canonical codes.
///
/// When at most one symbol has a nonzero frequency the code degenerates:
/// all lengths are zero, `single` names that symbol (or 0 for an empty
/// alphabet), and the block header stores the symbol directly instead of a
/// length table.
#[derive(Debug)]
pub(crate) struct BuiltTree {
    /// Code length per symbol, 0 for unused symbols.
    pub len: Vec<u8>,
    /// Left-justified 16-bit canonical code per symbol.
    pub code: Vec<u16>,
    /// The only used symbol, when fewer than two symbols occur.
    pub single: Option<u16>,
}

/// Scratch state for one tree construction.
struct TreeBuilder<'a> {
    freq: &'a [u16],
    /// 1-based min-heap of symbol/node ids ordered by frequency.
    heap: Vec<u16>,
    heap_size: usize,
    /// Frequencies of synthesized internal nodes, indexed from `n`.
    node_freq: Vec<u16>,
    left: Vec<u16>,
    right: Vec<u16>,
    /// Leaves in heap pop order (ascending frequency).
    sort: Vec<u16>,
    /// Leaf count per code length; index 16 collects everything deeper.
    len_count: [u16; 17],
}

impl<'a> TreeBuilder<'a> {
    fn new(freq: &'a [u16]) -> Self {
        let n = freq.len();
        Self {
            freq,
            heap: vec![0; n + 1],
            heap_size: 0,
            node_freq: vec![0; 2 * n],
            left: vec![0; 2 * n],
            right: vec![0; 2 * n],
            sort: Vec::with_capacity(n),
            len_count: [0; 17],
        }
    }

    fn freq_of(&self, node: u16) -> u16 {
        let i = node as usize;
        if i < self.freq.len() {
            self.freq[i]
        } else {
            self.node_freq[i]
        }
    }

    /// Sift `heap[i]` down to restore the min-heap invariant.
    fn down_heap(&mut self, mut i: usize) {
        let k = self.heap[i];
        let k_freq = self.freq_of(k);
        let mut j = 2 * i;
        while j <= self.heap_size {
            if j < self.heap_size && self.freq_of(self.heap[j]) > self.freq_of(self.heap[j + 1]) {
                j += 1;
            }
            if k_freq <= self.freq_of(self.heap[j]) {
                break;
            }
            self.heap[i] = self.heap[j];
            i = j;
            j = 2 * i;
        }
        self.heap[i] = k;
    }

    /// Pop the lowest-frequency node, recording leaves in pop order.
    fn pop(&mut self) -> u16 {
        let node = self.heap[1];
        if (node as usize) < self.freq.len() {
            self.sort.push(node);
        }
        self.heap[1] = self.heap[self.heap_size];
        self.heap_size -= 1;
        self.down_heap(1);
        node
    }

    /// Count leaves per depth under `node`, clamping depths >= 16.
    fn count_leaf(&mut self, node: u16, depth: usize) {
        if (node as usize) < self.freq.len() {
            self.len_count[depth.min(16)] += 1;
        } else {
            let i = node as usize;
            let (l, r) = (self.left[i], self.right[i]);
            self.count_leaf(l, depth + 1);
            self.count_leaf(r, depth + 1);
        }
    }

    /// Enforce the 16-bit length limit by demoting leaves.
    ///
    /// The weighted Kraft sum over the counted lengths exceeds capacity by
    /// some amount `c` (in weight-16 units) when leaves were clamped; each
    /// demotion of a leaf from the deepest occupied level below 16 frees
    /// exactly one unit.
    fn adjust_lengths(&mut self) {
        let mut total: u32 = 0;
        for i in 1..=16 {
            total = total.wrapping_add((self.len_count[i] as u32) << (16 - i));
        }
        let mut excess = total & 0xFFFF;
        if excess == 0 {
            return;
        }
        self.len_count[16] -= excess as u16;
        loop {
            let mut i = 15;
            while i > 0 {
                if self.len_count[i] != 0 {
                    self.len_count[i] -= 1;
                    self.len_count[i + 1] += 2;
                    break;
                }
                i -= 1;
            }
            excess -= 1;
            if excess == 0 {
                break;
            }
        }
    }

    /// Assign final lengths to symbols, deepest codes to the least
    /// frequent leaves (the front of the pop-order list).
    fn assign_lengths(&self, len: &mut [u8]) {
        let mut cursor = 0;
        for depth in (1..=16).rev() {
            for _ in 0..self.len_count[depth] {
                len[self.sort[cursor] as usize] = depth as u8;
                cursor += 1;
            }
        }
    }
}

/// Derive left-justified canonical codes from lengths.
pub(crate) fn make_code(len: &[u8]) -> Vec<u16> {
    let mut weight = [0u16; 17];
    let mut start = [0u16; 17];
    let mut total: u16 = 0;
    for i in 1..=16u32 {
        start[i as usize] = total;
        let mut count = 0u16;
        for &l in len {
            if l as u32 == i {
                count += 1;
            }
        }
        weight[i as usize] = ((1u32 << (16 - i)) & 0xFFFF) as u16;
        total = total.wrapping_add(count.wrapping_mul(weight[i as usize]));
    }

    let mut code = vec![0u16; len.len()];
    for (i, &l) in len.iter().enumerate() {
        if l != 0 {
            code[i] = start[l as usize];
            start[l as usize] = start[l as usize].wrapping_add(weight[l as usize]);
        }
    }
    code
}

/// Build a length-limited canonical code for `freq`.
pub(crate) fn build_tree(freq: &[u16]) -> BuiltTree {
    let n = freq.len();
    let mut builder = TreeBuilder::new(freq);

    for (symbol, &f) in freq.iter().enumerate() {
        if f != 0 {
            builder.heap_size += 1;
            builder.heap[builder.heap_size] = symbol as u16;
        }
    }

    if builder.heap_size < 2 {
        // Zero or one used symbol: nothing to code.
        let single = if builder.heap_size == 1 {
            builder.heap[1]
        } else {
            0
        };
        return BuiltTree {
            len: vec![0; n],
            code: vec![0; n],
            single: Some(single),
        };
    }

    let mut i = builder.heap_size / 2;
    while i >= 1 {
        builder.down_heap(i);
        i -= 1;
    }

    let mut avail = n as u16;
    let root = loop {
        let a = builder.pop();
        let b = builder.heap[1];
        if (b as usize) < n {
            builder.sort.push(b);
        }

        let node = avail;
        avail += 1;
        let ni = node as usize;
        let combined = builder.freq_of(a).wrapping_add(builder.freq_of(b));
        builder.node_freq[ni] = combined;
        builder.left[ni] = a;
        builder.right[ni] = b;

        builder.heap[1] = node;
        builder.down_heap(1);

        if builder.heap_size == 1 {
            break node;
        }
    };

    builder.count_leaf(root, 0);
    builder.adjust_lengths();

    let mut len = vec![0u8; n];
    builder.assign_lengths(&mut len);
    let code = make_code(&len);

    BuiltTree {
        len,
        code,
        single: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Kraft sum of a complete prefix code in weight-16 units is exactly
    /// 2^16.
    fn kraft_sum(len: &[u8]) -> u32 {
        len.iter()
            .filter(|&&l| l != 0)
            .map(|&l| 1u32 << (16 - l as u32))
            .sum()
    }

    #[test]
    fn test_empty_alphabet() {
        let tree = build_tree(&[0; 8]);
        assert_eq!(tree.single, Some(0));
        assert!(tree.len.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_single_symbol() {
        let mut freq = [0u16; 19];
        freq[7] = 42;
        let tree = build_tree(&freq);
        assert_eq!(tree.single, Some(7));
        assert!(tree.len.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_two_symbols_one_bit_each() {
        let mut freq = [0u16; 16];
        freq[3] = 10;
        freq[12] = 90;
        let tree = build_tree(&freq);
        assert_eq!(tree.single, None);
        assert_eq!(tree.len[3], 1);
        assert_eq!(tree.len[12], 1);
        assert_eq!(kraft_sum(&tree.len), 0x10000);
        assert_ne!(tree.code[3], tree.code[12]);
    }

    #[test]
    fn test_complete_code_uniform() {
        let freq = [5u16; 8];
        let tree = build_tree(&freq);
        assert!(tree.len.iter().all(|&l| l == 3));
        assert_eq!(kraft_sum(&tree.len), 0x10000);
    }

    #[test]
    fn test_skewed_frequencies_stay_complete() {
        // Fibonacci-ish frequencies force a deep tree.
        let freq: Vec<u16> = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144].to_vec();
        let tree = build_tree(&freq);
        assert_eq!(kraft_sum(&tree.len), 0x10000);
        assert!(tree.len.iter().all(|&l| l <= 16));
        // More frequent symbols never get longer codes.
        for i in 1..freq.len() {
            assert!(tree.len[i] <= tree.len[i - 1]);
        }
    }

    #[test]
    fn test_length_limit_enforced() {
        // 30 doubling-ish frequencies would want codes deeper than 16 bits
        // in an unconstrained Huffman tree.
        let mut freq = vec![0u16; 32];
        let mut f = 1u32;
        for slot in freq.iter_mut() {
            *slot = f.min(u16::MAX as u32) as u16;
            f = (f * 3 / 2).max(f + 1);
        }
        let tree = build_tree(&freq);
        assert!(tree.len.iter().all(|&l| l <= 16), "lengths: {:?}", tree.len);
        assert_eq!(kraft_sum(&tree.len), 0x10000);
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let freq = [3u16, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];
        let tree = build_tree(&freq);
        for i in 0..freq.len() {
            for j in 0..freq.len() {
                if i == j || tree.len[i] == 0 || tree.len[j] == 0 {
                    continue;
                }
                let shorter = tree.len[i].min(tree.len[j]);
                let mask = !0u16 << (16 - shorter);
                assert!(
                    tree.code[i] & mask != tree.code[j] & mask,
                    "codes for {i} and {j} share a prefix"
                );
            }
        }
    }

    #[test]
    fn test_make_code_canonical_order() {
        // Equal lengths get consecutive codes in symbol order.
        let len = [2u8, 2, 2, 2];
        let code = make_code(&len);
        assert_eq!(code, vec![0x0000, 0x4000, 0x8000, 0xC000]);
    }
}
