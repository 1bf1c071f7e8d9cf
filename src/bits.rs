//! Bit-level utilities shared by the tree, encoder, and decoder.
//!
//! `bit_vec::BitVec` is used throughout the crate for bit sequences. Its byte
//! conversions (`from_bytes`/`to_bytes`) are MSB-first, which is exactly the
//! packing order this format requires, so no custom bit-order shuffling (as
//! the teacher's `lzw` module needs for its optional LSB0 mode) is needed here.

use bit_vec::BitVec;
use std::io::Read;

/// Default size of one chunked read, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Turn a single byte into its 8-bit, MSB-first representation.
pub fn byte_to_bits(b: u8) -> BitVec {
    BitVec::from_bytes(&[b])
}

/// Reads chunks of up to `capacity` bytes from an underlying reader, yielding
/// `None` once the reader is exhausted. Mirrors `file_chunks`/`default_size`
/// from the original Python implementation.
pub struct ChunkReader<R> {
    reader: R,
    capacity: usize,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { reader, capacity }
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = vec![0u8; self.capacity];
        let mut total = 0;
        while total < buf.len() {
            match self.reader.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        if total == 0 {
            None
        } else {
            buf.truncate(total);
            Some(Ok(buf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn byte_round_trip() {
        let bits = byte_to_bits(0b1011_0010);
        let collected: Vec<bool> = bits.iter().collect();
        assert_eq!(
            collected,
            vec![true, false, true, true, false, false, true, false]
        );
    }

    #[test]
    fn chunk_reader_splits_on_capacity() {
        let data: Vec<u8> = (0..10u8).collect();
        let reader = ChunkReader::with_capacity(Cursor::new(data.clone()), 4);
        let chunks: Vec<Vec<u8>> = reader.map(|c| c.unwrap()).collect();
        assert_eq!(chunks, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
    }

    #[test]
    fn chunk_reader_empty_input() {
        let reader = ChunkReader::with_capacity(Cursor::new(Vec::<u8>::new()), 4);
        let chunks: Vec<Vec<u8>> = reader.map(|c| c.unwrap()).collect();
        assert!(chunks.is_empty());
    }
}
