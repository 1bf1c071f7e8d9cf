//! Canonical Huffman tree: construction, serialization, and the decoder-side
//! inverse (reconstructing codes from a serialized shape).
//!
//! The tree is stored as an arena (`Vec<Node>`) addressed by index rather
//! than as a pointer graph, per the design notes: this keeps the
//! priority-queue entries cheap to move and avoids a owned-subtree drop glue.

use bit_vec::BitVec;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::Error;

enum Node {
    Leaf {
        symbol: u8,
        freq: u64,
    },
    Internal {
        freq: u64,
        left: usize,
        right: usize,
    },
}

impl Node {
    fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } => *freq,
            Node::Internal { freq, .. } => *freq,
        }
    }
}

/// A priority-queue entry: frequency first, then the lexicographic key of
/// the symbol bytes the node represents, exactly as required for bit-exact
/// output (§4.1). The key is computed once, at construction, and never
/// recomputed.
struct HeapEntry {
    freq: u64,
    key: Vec<u8>,
    index: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.key == other.key
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.freq, &self.key).cmp(&(other.freq, &other.key))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reverses `HeapEntry`'s ordering so `BinaryHeap` (a max-heap) pops the
/// smallest `(freq, key)` pair first.
struct MinEntry(HeapEntry);
impl PartialEq for MinEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for MinEntry {}
impl Ord for MinEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}
impl PartialOrd for MinEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The output of [`Tree::serialize`]: everything the encoder needs to emit
/// a header and payload, in one sweep over the tree.
pub struct Serialized {
    /// Leaf symbols in pre-order traversal order (the on-wire symbol list).
    pub symbols: Vec<u8>,
    /// The `4L-4`-bit tree-shape bit-string.
    pub shape: BitVec,
    /// Symbol -> code, indexed by symbol value for O(1) encode-time lookup.
    pub codebook: Vec<Option<BitVec>>,
    /// Total payload length in bits, `E = sum(freq(s) * len(code(s)))`.
    pub encoding_length: u64,
}

/// A Huffman tree built from a non-empty, multi-symbol frequency table.
pub struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

impl Tree {
    /// Builds a tree from `(symbol, frequency)` pairs. `freqs` must contain
    /// at least two entries; the one-symbol case is handled separately by
    /// the caller (§4.4), since it needs no tree at all.
    pub fn build(freqs: &[(u8, u64)]) -> Self {
        debug_assert!(freqs.len() >= 2, "tree construction requires >=2 symbols");
        let mut nodes = Vec::with_capacity(2 * freqs.len() - 1);
        let mut heap = BinaryHeap::with_capacity(freqs.len());
        for &(symbol, freq) in freqs {
            let index = nodes.len();
            nodes.push(Node::Leaf { symbol, freq });
            heap.push(MinEntry(HeapEntry {
                freq,
                key: vec![symbol],
                index,
            }));
        }
        while heap.len() > 1 {
            let MinEntry(a) = heap.pop().expect("checked len > 1");
            let MinEntry(b) = heap.pop().expect("checked len > 1");
            let freq = a.freq + b.freq;
            let mut key = a.key;
            key.extend_from_slice(&b.key);
            let index = nodes.len();
            nodes.push(Node::Internal {
                freq,
                left: a.index,
                right: b.index,
            });
            heap.push(MinEntry(HeapEntry { freq, key, index }));
        }
        let MinEntry(root_entry) = heap.pop().expect("non-empty input has a root");
        Tree {
            nodes,
            root: root_entry.index,
        }
    }

    /// Traverses the tree once, producing the symbol list, shape bits,
    /// codebook, and payload length together (§4.2).
    pub fn serialize(&self) -> Serialized {
        let mut symbols = Vec::new();
        let mut shape = BitVec::new();
        let mut codebook: Vec<Option<BitVec>> = vec![None; 256];
        let mut encoding_length = 0u64;
        let mut code = BitVec::new();
        self.traverse(
            self.root,
            &mut code,
            &mut shape,
            &mut symbols,
            &mut codebook,
            &mut encoding_length,
        );
        Serialized {
            symbols,
            shape,
            codebook,
            encoding_length,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn traverse(
        &self,
        index: usize,
        code: &mut BitVec,
        shape: &mut BitVec,
        symbols: &mut Vec<u8>,
        codebook: &mut [Option<BitVec>],
        encoding_length: &mut u64,
    ) {
        match &self.nodes[index] {
            Node::Leaf { symbol, freq } => {
                symbols.push(*symbol);
                codebook[*symbol as usize] = Some(code.clone());
                *encoding_length += freq * code.len() as u64;
            }
            Node::Internal { left, right, .. } => {
                shape.push(false);
                code.push(false);
                self.traverse(*left, code, shape, symbols, codebook, encoding_length);
                code.pop();
                shape.push(true);

                shape.push(false);
                code.push(true);
                self.traverse(*right, code, shape, symbols, codebook, encoding_length);
                code.pop();
                shape.push(true);
            }
        }
    }

    #[cfg(test)]
    fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    #[cfg(test)]
    fn root_freq(&self) -> u64 {
        self.nodes[self.root].freq()
    }
}

/// Reconstructs the `code -> symbol` map from a decoded shape bit-string and
/// the symbol list read from the header, inverting [`Tree::serialize`]'s
/// traversal without rebuilding the tree itself (§4.6 step 6).
pub fn codes_from_shape(shape: &[bool], symbols: &[u8]) -> Result<HashMap<String, u8>, Error> {
    let mut codes: Vec<String> = Vec::new();
    let mut code = String::new();
    let mut prev = false;
    for &cur in shape {
        if !prev {
            if cur {
                // "01": a leaf was just reached, and we're ascending back out of it.
                codes.push(code.clone());
                code.pop();
            } else {
                code.push('0');
            }
        } else if !cur {
            code.push('1');
        } else {
            code.pop();
        }
        prev = cur;
    }
    if codes.len() != symbols.len() {
        return Err(Error::MalformedHeader(format!(
            "tree shape decoded to {} codes, expected {}",
            codes.len(),
            symbols.len()
        )));
    }
    Ok(codes.into_iter().zip(symbols.iter().copied()).collect())
}
