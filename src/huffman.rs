//! Canonical Huffman compression: the file format, the streaming encoder and
//! decoder, and the bit-buffered output sink.
//!
//! This performs the compression described in `SPEC_FULL.md` (a static,
//! single-pass-derived canonical Huffman code over byte symbols), grounded on
//! the two-pass frequency-count-then-encode structure of the original
//! `comp.py`/`compress/decomp.py` implementation this crate reimplements, in
//! the streaming, chunk-at-a-time style the teacher uses for its own
//! `lzss_huff::compress`/`expand` pair.

use bit_vec::BitVec;
use log::{debug, trace};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::bits::{byte_to_bits, ChunkReader};
use crate::tree::{codes_from_shape, Tree};
use crate::{Error, Options, STD_OPTIONS};

/// Smallest number of whole bytes needed to hold `k` in big-endian form.
/// `k` is assumed nonzero (the one-symbol case is never reached with a
/// zero-length repeat, since the encoder is never called on empty input).
fn byte_width(k: u64) -> usize {
    let bit_length = 64 - k.leading_zeros() as usize;
    (bit_length + 7) / 8
}

/// An append-only bit sink that buffers fragments in memory and flushes
/// whole bytes to the underlying writer once the configured threshold is
/// exceeded (§4.5).
struct BitWriter<'a, W: Write> {
    sink: &'a mut W,
    buf: BitVec,
    threshold_bits: usize,
}

impl<'a, W: Write> BitWriter<'a, W> {
    fn new(sink: &'a mut W, threshold_bits: usize) -> Self {
        Self {
            sink,
            buf: BitVec::new(),
            threshold_bits,
        }
    }

    fn write(&mut self, bits: &BitVec) -> Result<(), Error> {
        self.buf.extend(bits.iter());
        if self.buf.len() > self.threshold_bits {
            self.flush()?;
        }
        Ok(())
    }

    /// Splits off the longest whole-byte prefix currently buffered and
    /// writes it to the sink, retaining any sub-byte remainder.
    fn flush(&mut self) -> Result<(), Error> {
        let whole_bits = (self.buf.len() / 8) * 8;
        if whole_bits == 0 {
            return Ok(());
        }
        let head: BitVec = self.buf.iter().take(whole_bits).collect();
        let tail: BitVec = self.buf.iter().skip(whole_bits).collect();
        self.sink.write_all(&head.to_bytes())?;
        self.buf = tail;
        Ok(())
    }

    /// Final flush: the remaining residue must already be byte-aligned,
    /// since the header's alignment field guarantees end-of-stream residue
    /// is empty for any well-formed tree-based encode.
    fn close(mut self) -> Result<(), Error> {
        debug_assert_eq!(self.buf.len() % 8, 0, "end-of-stream residue must be byte-aligned");
        if !self.buf.is_empty() {
            self.sink.write_all(&self.buf.to_bytes())?;
        }
        Ok(())
    }
}

/// Counts byte frequencies over the whole input, returning `(symbol, freq)`
/// pairs for every symbol that appears at least once, in ascending symbol
/// order. `source` is rewound to the start before returning.
fn count_frequencies<R: Read + Seek>(
    source: &mut R,
    chunk_size: usize,
) -> Result<Vec<(u8, u64)>, Error> {
    let mut freq = [0u64; 256];
    for chunk in ChunkReader::with_capacity(&mut *source, chunk_size) {
        for b in chunk? {
            freq[b as usize] += 1;
        }
    }
    source.seek(SeekFrom::Start(0))?;
    Ok(freq
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f > 0)
        .map(|(s, &f)| (s as u8, f))
        .collect())
}

/// Writes the one-symbol special case (§4.4): `0x00`, the symbol, then the
/// repeat count as a minimum-width big-endian integer. The count is already
/// known from the frequency pass, so the input is not read a second time.
fn write_one_symbol<W: Write>(sink: &mut W, symbol: u8, count: u64) -> Result<(), Error> {
    sink.write_all(&[0x00, symbol])?;
    let width = byte_width(count);
    let be = count.to_be_bytes();
    sink.write_all(&be[be.len() - width..])?;
    Ok(())
}

/// Compresses everything read from `source` into `sink`, using the default
/// chunk size and bit-buffer threshold (`STD_OPTIONS`).
pub fn encode<R: Read + Seek, W: Write>(source: &mut R, sink: &mut W) -> Result<(), Error> {
    encode_with_options(source, sink, &STD_OPTIONS)
}

/// Like [`encode`], but with caller-supplied chunk size and flush threshold.
pub fn encode_with_options<R: Read + Seek, W: Write>(
    source: &mut R,
    sink: &mut W,
    opt: &Options,
) -> Result<(), Error> {
    let freqs = count_frequencies(source, opt.chunk_size)?;
    if freqs.is_empty() {
        return Err(Error::EmptyInput);
    }
    debug!("encode: {} distinct symbols", freqs.len());
    if freqs.len() == 1 {
        let (symbol, count) = freqs[0];
        return write_one_symbol(sink, symbol, count);
    }

    let tree = Tree::build(&freqs);
    let ser = tree.serialize();
    let l = ser.symbols.len();

    let mut writer = BitWriter::new(sink, opt.bit_buffer_threshold);
    writer.write(&byte_to_bits((l - 1) as u8))?;
    for &s in &ser.symbols {
        writer.write(&byte_to_bits(s))?;
    }
    let total_before_align = ser.shape.len() as u64 + ser.encoding_length;
    let align = ((8 - (total_before_align % 8)) % 8) as usize;
    let align_bits: BitVec = std::iter::repeat(true).take(align).collect();
    writer.write(&align_bits)?;
    writer.write(&ser.shape)?;
    trace!(
        "encode: header is {} bits (align={align}, shape={})",
        8 + 8 * l as u64 + align as u64 + ser.shape.len() as u64,
        ser.shape.len()
    );

    for chunk in ChunkReader::with_capacity(&mut *source, opt.chunk_size) {
        let chunk = chunk?;
        let mut payload = BitVec::new();
        for b in chunk {
            let code = ser.codebook[b as usize]
                .as_ref()
                .expect("every input byte was counted into the frequency table");
            payload.extend(code.iter());
        }
        writer.write(&payload)?;
    }
    writer.close()
}

/// Convenience wrapper: compresses an in-memory slice, returning a fresh
/// `Vec<u8>`.
pub fn compress_slice(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut src = std::io::Cursor::new(data);
    let mut out = Vec::new();
    encode(&mut src, &mut out)?;
    Ok(out)
}

/// Writes `count` copies of `symbol` to `sink` in bounded-size chunks, so
/// memory use stays independent of `count` even for very large repeats.
fn write_repeated<W: Write>(sink: &mut W, symbol: u8, mut count: u64) -> Result<(), Error> {
    const WRITE_CHUNK: u64 = 64 * 1024;
    let buf = vec![symbol; WRITE_CHUNK.min(count.max(1)) as usize];
    while count > 0 {
        let n = WRITE_CHUNK.min(count) as usize;
        sink.write_all(&buf[..n])?;
        count -= n as u64;
    }
    Ok(())
}

fn read_exact_or_malformed<R: Read>(
    source: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<(), Error> {
    source
        .read_exact(buf)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                Error::MalformedHeader(format!("stream ended while reading {what}"))
            }
            _ => Error::IoError(e),
        })
}

/// Expands a compressed stream read from `source` into `sink`, using the
/// default chunk size (`STD_OPTIONS`).
pub fn decode<R: Read, W: Write>(source: &mut R, sink: &mut W) -> Result<(), Error> {
    decode_with_options(source, sink, &STD_OPTIONS)
}

/// Like [`decode`], but with a caller-supplied chunk size for the payload
/// scan.
pub fn decode_with_options<R: Read, W: Write>(
    source: &mut R,
    sink: &mut W,
    opt: &Options,
) -> Result<(), Error> {
    let mut first = [0u8; 1];
    let n = source.read(&mut first)?;
    if n == 0 {
        return Err(Error::MalformedHeader("empty compressed stream".into()));
    }

    if first[0] == 0x00 {
        let mut symbol = [0u8; 1];
        read_exact_or_malformed(source, &mut symbol, "one-symbol byte")?;
        let mut rest = Vec::new();
        source.read_to_end(&mut rest)?;
        if rest.is_empty() {
            return Err(Error::MalformedHeader("missing repeat count".into()));
        }
        let mut count: u64 = 0;
        for b in &rest {
            count = (count << 8) | (*b as u64);
        }
        return write_repeated(sink, symbol[0], count);
    }

    let l = first[0] as usize + 1;
    let mut symbols = vec![0u8; l];
    read_exact_or_malformed(source, &mut symbols, "symbol list")?;

    // This read is capped, not exact: the cap is a worst-case bound on
    // align-run + shape length, but a short input can legitimately end
    // partway through it (the payload can be short enough that the whole
    // file ends inside what this read requests). A short read here is only
    // an error once we know it left us without enough bits for the shape
    // (checked below), mirroring the original implementation's tolerant
    // `file.read(n)` semantics rather than an exact-size read.
    let shape_len = 4 * l - 4;
    let t_byte_len = (shape_len + 7) / 8 + 1;
    let mut t_bytes = vec![0u8; t_byte_len];
    let mut filled = 0;
    while filled < t_bytes.len() {
        match source.read(&mut t_bytes[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    t_bytes.truncate(filled);
    let t_bits = BitVec::from_bytes(&t_bytes);

    let align_start = t_bits
        .iter()
        .position(|b| !b)
        .ok_or_else(|| Error::MalformedHeader("alignment field is all ones".into()))?;
    if align_start + shape_len > t_bits.len() {
        return Err(Error::MalformedHeader(
            "declared shape length exceeds available header bytes".into(),
        ));
    }
    let shape: Vec<bool> = t_bits.iter().skip(align_start).take(shape_len).collect();
    let residue: Vec<bool> = t_bits.iter().skip(align_start + shape_len).collect();

    let code_map = codes_from_shape(&shape, &symbols)?;
    debug!(
        "decode: {} symbols, header is {} bits",
        symbols.len(),
        8 + 8 * symbols.len() + align_start + shape_len
    );

    let mut code_acc = String::new();
    for b in residue {
        code_acc.push(if b { '1' } else { '0' });
        if let Some(&sym) = code_map.get(&code_acc) {
            sink.write_all(&[sym])?;
            code_acc.clear();
        }
    }

    for chunk in ChunkReader::with_capacity(source, opt.chunk_size) {
        let chunk = chunk?;
        let bits = BitVec::from_bytes(&chunk);
        for b in bits.iter() {
            code_acc.push(if b { '1' } else { '0' });
            if let Some(&sym) = code_map.get(&code_acc) {
                sink.write_all(&[sym])?;
                code_acc.clear();
            }
        }
    }

    if !code_acc.is_empty() {
        return Err(Error::TruncatedPayload);
    }
    Ok(())
}

/// Convenience wrapper: expands an in-memory compressed slice, returning a
/// fresh `Vec<u8>`.
pub fn expand_slice(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut src = std::io::Cursor::new(data);
    let mut out = Vec::new();
    decode(&mut src, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        hex::decode(s.replace(' ', "")).unwrap()
    }

    #[test]
    fn one_byte() {
        let compressed = compress_slice(b"a").unwrap();
        assert_eq!(compressed, hex("00 61 01"));
        assert_eq!(expand_slice(&compressed).unwrap(), b"a");
    }

    #[test]
    fn one_byte_repeated() {
        let compressed = compress_slice(b"aa").unwrap();
        assert_eq!(compressed, hex("00 61 02"));
        assert_eq!(expand_slice(&compressed).unwrap(), b"aa");
    }

    #[test]
    fn one_byte_large_repeat() {
        let data = vec![0xFFu8; 3_000_000];
        let compressed = compress_slice(&data).unwrap();
        let mut expected = hex("00 FF");
        expected.extend(hex("2D C6 C0"));
        assert_eq!(compressed, expected);
        assert_eq!(expand_slice(&compressed).unwrap(), data);
    }

    #[test]
    fn two_bytes() {
        let compressed = compress_slice(b"ab").unwrap();
        assert_eq!(compressed, hex("01 61 62 D5"));
        assert_eq!(expand_slice(&compressed).unwrap(), b"ab");
    }

    #[test]
    fn couple_bytes() {
        let compressed = compress_slice(b"abcdef\xFF").unwrap();
        assert_eq!(
            compressed,
            hex("06 FF 61 62 63 64 65 66 F2 5C 59 74 E5 DC")
        );
        assert_eq!(expand_slice(&compressed).unwrap(), b"abcdef\xFF");
    }

    #[test]
    fn large_scenario() {
        let mut data = Vec::with_capacity(30_000_000);
        data.extend(std::iter::repeat(b'a').take(10_000_000));
        data.extend(std::iter::repeat(0xFFu8).take(10_000_000));
        data.extend(std::iter::repeat(b'c').take(10_000_000));
        let compressed = compress_slice(&data).unwrap();

        let mut expected = hex("02 FF 61 63 4B");
        expected.extend(std::iter::repeat(0xAAu8).take(2_500_000));
        expected.extend(std::iter::repeat(0x00u8).take(1_250_000));
        expected.extend(std::iter::repeat(0xFFu8).take(2_500_000));
        assert_eq!(compressed, expected);
        assert_eq!(expand_slice(&compressed).unwrap(), data);
    }

    #[test]
    fn empty_input_fails() {
        let err = compress_slice(b"").unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn deterministic_output() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let a = compress_slice(data).unwrap();
        let b = compress_slice(data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn truncated_payload_is_detected() {
        let compressed = compress_slice(b"abcdef\xFF").unwrap();
        // Drop the last two bytes: enough to leave a dangling partial code
        // ("010", the prefix of 'a's code) with no further input to
        // complete it, without removing so much that the header read
        // itself comes up short (which would surface as MalformedHeader
        // instead, exercised separately below).
        let mut truncated = compressed.clone();
        truncated.truncate(compressed.len() - 2);
        let err = expand_slice(&truncated).unwrap_err();
        assert!(matches!(err, Error::TruncatedPayload));
    }

    #[test]
    fn malformed_empty_stream() {
        let err = expand_slice(&[]).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn malformed_short_symbol_list() {
        // Declares 3 distinct symbols (N=2) but provides none of the bytes.
        let err = expand_slice(&[0x02]).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn round_trip_small_chunk_size() {
        let data = b"mississippi river".repeat(50);
        let opt = Options {
            chunk_size: 7,
            bit_buffer_threshold: 13,
        };
        let mut src = std::io::Cursor::new(&data[..]);
        let mut compressed = Vec::new();
        encode_with_options(&mut src, &mut compressed, &opt).unwrap();
        let mut out = Vec::new();
        let mut csrc = std::io::Cursor::new(&compressed[..]);
        decode_with_options(&mut csrc, &mut out, &opt).unwrap();
        assert_eq!(out, data);
    }
}
