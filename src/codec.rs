//! Length-prefixed fast-codec block compression, ported from the
//! Snappy-wrapping logic in Canu's `ovFile::writeBuffer`/`readBuffer`.
//!
//! The codec itself is LZ4 (`lz4_flex`), a fast, deterministic LZ77-family
//! compressor with the same shape as Snappy: it can report a
//! pre-compression upper bound on the output size, and the compressed
//! payload self-describes its decompressed length.
//!
//! Wire format of one block, written by [`write_block`]:
//!
//! ```text
//! [u64 compressed_length (native endian)][compressed_length bytes]
//! ```
//!
//! where `compressed_length bytes` is itself `lz4_flex`'s
//! length-prepended block format (a 4-byte LE decompressed-size header
//! followed by the LZ4 block), so [`read_block`] never needs a second
//! side channel for the decompressed size.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::OvError;

/// Compress `raw` and write it as one length-prefixed block to `out`.
pub fn write_block(out: &mut impl Write, raw: &[u8]) -> Result<()> {
    let compressed = lz4_flex::compress_prepend_size(raw);
    let len = compressed.len() as u64;

    out.write_all(&len.to_ne_bytes()).context("writing compressed block length")?;
    out.write_all(&compressed).context("writing compressed block payload")?;
    Ok(())
}

/// The outcome of attempting to read one block.
pub enum BlockRead {
    /// A full block was read and decompressed.
    Block(Vec<u8>),
    /// EOF was encountered exactly at the length prefix: a clean end of
    /// stream, not an error.
    Eof,
}

/// Read and decompress one length-prefixed block from `input`, identified
/// by `path` for diagnostics.
///
/// EOF at the very start of the length prefix is a normal end-of-stream.
/// Any other short read (inside the length prefix, or inside the
/// compressed payload) is fatal corruption and is reported with `path` and
/// the expected/actual byte counts, per this format's error taxonomy.
pub fn read_block(input: &mut impl Read, path: &str) -> Result<BlockRead> {
    let mut len_buf = [0u8; 8];

    let mut filled = 0usize;
    loop {
        match input.read(&mut len_buf[filled..])? {
            0 if filled == 0 => return Ok(BlockRead::Eof),
            0 => {
                return Err(OvError::ShortRead { path: Path::new(path).to_path_buf(), expected: 8, actual: filled as u64 }.into());
            }
            n => filled += n,
        }
        if filled == 8 {
            break;
        }
    }
    let compressed_len = u64::from_ne_bytes(len_buf) as usize;

    let mut compressed = vec![0u8; compressed_len];
    let mut filled = 0usize;
    while filled < compressed_len {
        match input.read(&mut compressed[filled..])? {
            0 => {
                return Err(OvError::ShortRead {
                    path: Path::new(path).to_path_buf(),
                    expected: compressed_len as u64,
                    actual: filled as u64,
                }
                .into());
            }
            n => filled += n,
        }
    }

    let raw = lz4_flex::decompress_size_prepended(&compressed)
        .with_context(|| format!("decompressing block in '{path}'"))?;

    Ok(BlockRead::Block(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_single_block() {
        let raw = b"some record bytes repeated repeated repeated".to_vec();
        let mut buf = Vec::new();
        write_block(&mut buf, &raw).unwrap();

        let mut cursor = Cursor::new(buf);
        match read_block(&mut cursor, "test").unwrap() {
            BlockRead::Block(out) => assert_eq!(out, raw),
            BlockRead::Eof => panic!("expected a block, got EOF"),
        }
    }

    #[test]
    fn empty_stream_is_clean_eof() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(matches!(read_block(&mut cursor, "test").unwrap(), BlockRead::Eof));
    }

    #[test]
    fn multiple_blocks_stream_sequentially() {
        let mut buf = Vec::new();
        write_block(&mut buf, b"first block").unwrap();
        write_block(&mut buf, b"second block, a bit longer").unwrap();

        let mut cursor = Cursor::new(buf);
        let BlockRead::Block(a) = read_block(&mut cursor, "t").unwrap() else { panic!() };
        let BlockRead::Block(b) = read_block(&mut cursor, "t").unwrap() else { panic!() };
        assert_eq!(a, b"first block");
        assert_eq!(b, b"second block, a bit longer");
        assert!(matches!(read_block(&mut cursor, "t").unwrap(), BlockRead::Eof));
    }

    #[test]
    fn short_read_inside_frame_is_fatal() {
        let mut buf = Vec::new();
        write_block(&mut buf, b"a reasonably sized payload to compress").unwrap();
        buf.truncate(buf.len() - 3); // cut the tail off the compressed payload

        let mut cursor = Cursor::new(buf);
        assert!(read_block(&mut cursor, "truncated.dat").is_err());
    }
}
