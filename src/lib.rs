//! # huffcompress
//!
//! Lossless file compression with canonical (static, single-pass) Huffman
//! coding over byte symbols.
//!
//! * `tree` builds the Huffman tree from a frequency table and serializes it
//!   to and from the on-wire tree-shape bit-string.
//! * `huffman` is the encode/expand driver: header assembly, the one-symbol
//!   special case, chunked payload I/O, and the buffered bit writer.
//! * `bits` holds small bit- and chunk-level helpers shared by the above.
//!
//! The compression/expansion functions are generics that operate on trait
//! objects with bounds `Read + Seek` (source) or `Write` (sink). There are
//! convenience functions for working directly with in-memory buffers.
//!
//! ## File Example
//!
//! ```rs
//! use huffcompress::*;
//! let mut in_file = std::fs::File::open("some_input_path").expect("open failed");
//! let mut out_file = std::fs::File::create("some_output_path").expect("create failed");
//! huffman::encode(&mut in_file, &mut out_file).expect("compression failed");
//! ```
//!
//! ## Buffer Example
//!
//! ```rs
//! use huffcompress::*;
//! let test_data = "This is the chaunt of the priests.  The chaunt of the priests of Mung.".as_bytes();
//! let compressed = huffman::compress_slice(test_data).expect("compression failed");
//! ```

pub mod bits;
pub mod huffman;
pub mod tree;

/// Errors produced while compressing or expanding a stream.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("input is empty")]
    EmptyInput,
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("payload ended mid-code")]
    TruncatedPayload,
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Options controlling compression and expansion.
#[derive(Clone)]
pub struct Options {
    /// size of one chunked read/write, in bytes
    pub chunk_size: usize,
    /// bit-buffer size that triggers a flush to the sink, in bits
    pub bit_buffer_threshold: usize,
}

pub const STD_OPTIONS: Options = Options {
    chunk_size: bits::DEFAULT_CHUNK_SIZE,
    bit_buffer_threshold: 8 * 1024 * 1024,
};
