//! The append-only record file (component F), ported from Canu's
//! `ovFile` in `stores/ovStoreFile.C`.
//!
//! An [`OvFile`] owns a byte buffer sized to hold a whole number of
//! records in either [`Shape`], a raw file handle, and the counts and
//! histogram sidecars appropriate to its [`OvFileMode`]. All of it is
//! released together when the file is dropped.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::codec::{read_block, write_block, BlockRead};
use crate::error::OvError;
use crate::path_layout::{counts_path, strip_extension};
use crate::record::{Overlap, Shape, Word, WORD_32BIT_UNITS};
use crate::sidecar::{CountsSidecar, Histogram};

/// The default minimum buffer size requested by [`OvFile::open`]: 16 KiB,
/// rounded up to a whole number of [`Shape::Normal`]/[`Shape::Full`]
/// record groups.
pub const DEFAULT_BUFFER_BYTES: u64 = 16 * 1024;

/// One of the six ways an overlap file may be opened (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvFileMode {
    /// Normal shape, uncompressed, read-only. Seekable.
    Normal,
    /// Normal shape, uncompressed, write-only. Seekable (write position
    /// only). Creates counts and histogram sidecars.
    NormalWrite,
    /// Full shape, compressed, read-only. Creates a read-only counts
    /// sidecar.
    Full,
    /// Full shape, compressed; reads *only* the counts sidecar and never
    /// opens the main file. See [`OvFile::open_counts`].
    FullCounts,
    /// Full shape, compressed, write-only. Creates counts and histogram
    /// sidecars.
    FullWrite,
    /// Full shape, compressed, write-only, with no counts sidecar.
    FullWriteNoCounts,
}

impl OvFileMode {
    fn shape(self) -> Shape {
        match self {
            OvFileMode::Normal | OvFileMode::NormalWrite => Shape::Normal,
            _ => Shape::Full,
        }
    }

    fn compressed(self) -> bool {
        !matches!(self, OvFileMode::Normal | OvFileMode::NormalWrite)
    }

    fn is_write(self) -> bool {
        matches!(self, OvFileMode::NormalWrite | OvFileMode::FullWrite | OvFileMode::FullWriteNoCounts)
    }

    fn wants_counts(self) -> bool {
        matches!(self, OvFileMode::NormalWrite | OvFileMode::Full | OvFileMode::FullWrite)
    }

    fn counts_readonly(self) -> bool {
        matches!(self, OvFileMode::Full)
    }

    /// Normal-shape modes always carry a histogram sidecar (empty unless
    /// the file is also opened for writing); full-shape modes never do
    /// (§6 — `FullWrite` creates counts only).
    fn wants_histogram(self) -> bool {
        matches!(self, OvFileMode::Normal | OvFileMode::NormalWrite)
    }

    fn seekable(self) -> bool {
        matches!(self, OvFileMode::Normal | OvFileMode::NormalWrite)
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: u64, b: u64) -> u64 {
    a / gcd(a, b) * b
}

/// Largest multiple of `unit` not exceeding `requested`, but never zero.
fn buffer_size(requested: u64, unit: u64) -> u64 {
    (requested / unit).max(1) * unit
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> anyhow::Error {
    OvError::Io { path: path.into(), source }.into()
}

fn write_word(buf: &mut Vec<u8>, w: Word) {
    #[cfg(feature = "word64")]
    {
        let v: u64 = w;
        buf.extend_from_slice(&((v >> 32) as u32).to_ne_bytes());
        buf.extend_from_slice(&(v as u32).to_ne_bytes());
    }
    #[cfg(feature = "word32")]
    {
        buf.extend_from_slice(&w.to_ne_bytes());
    }
}

fn read_word(bytes: &[u8], at: usize) -> Word {
    #[cfg(feature = "word64")]
    {
        let hi = u32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap());
        let lo = u32::from_ne_bytes(bytes[at + 4..at + 8].try_into().unwrap());
        (u64::from(hi) << 32) | u64::from(lo)
    }
    #[cfg(feature = "word32")]
    {
        u32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap())
    }
}

fn encode_record<const N: usize>(out: &mut Vec<u8>, o: &Overlap<N>, shape: Shape) {
    if shape == Shape::Full {
        out.extend_from_slice(&o.a_id.to_ne_bytes());
    }
    out.extend_from_slice(&o.b_id.to_ne_bytes());
    for &w in &o.dat {
        write_word(out, w);
    }
}

fn decode_record<const N: usize>(bytes: &[u8], shape: Shape) -> Overlap<N> {
    let mut at = 0usize;
    let a_id = if shape == Shape::Full {
        let v = u32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap());
        at += 4;
        v
    } else {
        0
    };
    let b_id = u32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap());
    at += 4;

    let mut dat = [Word::default(); N];
    for slot in &mut dat {
        *slot = read_word(bytes, at);
        at += WORD_32BIT_UNITS * 4;
    }
    Overlap { a_id, b_id, dat }
}

/// A pluggable source for the "fetch from a remote object store into a
/// local temporary" behavior of opening a normal-shape file for reading.
/// [`LocalSource`] is the no-op default; a real object-store-backed
/// implementation lives outside this crate.
pub trait FetchSource {
    /// Return the local path to open, fetching `path` first if it is not
    /// already local. Implementations that fetch should return a
    /// freshly-created temporary path distinct from `path`.
    fn fetch(&self, path: &Path) -> Result<PathBuf>;
}

/// The default [`FetchSource`]: `path` is already local, nothing to do.
pub struct LocalSource;

impl FetchSource for LocalSource {
    fn fetch(&self, path: &Path) -> Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// An open overlap file: buffered record I/O over a fixed [`Shape`],
/// optionally block-compressed, with its sidecars.
pub struct OvFile<const N: usize> {
    mode: OvFileMode,
    shape: Shape,
    record_size: u64,
    file: File,
    path: PathBuf,
    temporary: bool,

    buf: Vec<u8>,
    buf_len: usize,
    buf_pos: usize,
    buf_max: usize,

    counts: Option<CountsSidecar>,
    counts_readonly: bool,
    histogram: Option<Histogram>,
}

impl<const N: usize> OvFile<N> {
    /// The buffer size (in bytes) [`Self::open_with_buffer`] will actually
    /// use for `requested_bytes`: the largest multiple of
    /// `lcm(normal_record_size, full_record_size)` not exceeding
    /// `requested_bytes` (never zero), so the buffer always holds a whole
    /// number of records of either shape.
    #[must_use]
    pub fn buffer_capacity(requested_bytes: u64) -> u64 {
        let unit = lcm(Shape::Normal.record_size::<N>(), Shape::Full.record_size::<N>());
        buffer_size(requested_bytes, unit)
    }

    /// Open `path` in `mode`, with the default buffer size.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    ///
    /// # Panics
    /// Panics if `mode` is [`OvFileMode::FullCounts`] — that mode never
    /// opens the main file; use [`Self::open_counts`] instead.
    pub fn open(path: impl AsRef<Path>, mode: OvFileMode) -> Result<Self> {
        Self::open_with_buffer(path, mode, DEFAULT_BUFFER_BYTES)
    }

    /// Open `path` in `mode`, requesting a buffer of at least
    /// `requested_bytes` (rounded to a whole number of record groups).
    ///
    /// # Panics
    /// Panics if `mode` is [`OvFileMode::FullCounts`].
    pub fn open_with_buffer(path: impl AsRef<Path>, mode: OvFileMode, requested_bytes: u64) -> Result<Self> {
        assert!(mode != OvFileMode::FullCounts, "FullCounts never opens the main file; call OvFile::open_counts instead");

        let path = path.as_ref().to_path_buf();
        let shape = mode.shape();
        let record_size = shape.record_size::<N>();
        let buf_max = Self::buffer_capacity(requested_bytes) as usize;

        log::info!("opening overlap file '{}' (mode={mode:?}, record_size={record_size}, buffer={buf_max})", path.display());

        let file = if mode.is_write() {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .map_err(|e| io_err(path.clone(), e))?
        } else {
            OpenOptions::new().read(true).open(&path).map_err(|e| io_err(path.clone(), e))?
        };

        let counts = if mode.wants_counts() {
            Some(if mode.counts_readonly() {
                let cp = counts_path(&path);
                CountsSidecar::load(&cp).map_err(|e| io_err(cp, e))?
            } else {
                CountsSidecar::new()
            })
        } else {
            None
        };

        let histogram = if mode.wants_histogram() { Some(Histogram::new()) } else { None };

        Ok(Self {
            mode,
            shape,
            record_size,
            file,
            path,
            temporary: false,
            buf: Vec::with_capacity(buf_max),
            buf_len: 0,
            buf_pos: 0,
            buf_max,
            counts,
            counts_readonly: mode.counts_readonly(),
            histogram,
        })
    }

    /// Open `path` for reading, routing it through `source` first. If
    /// `source` returns a path different from `path` (it fetched a
    /// temporary copy), that copy is unlinked on close.
    ///
    /// # Panics
    /// Panics if `mode` is a write mode or [`OvFileMode::FullCounts`] —
    /// fetching only makes sense for a read-only open.
    pub fn open_fetched(path: impl AsRef<Path>, mode: OvFileMode, source: &impl FetchSource) -> Result<Self> {
        assert!(!mode.is_write(), "open_fetched is only for read modes");
        let original = path.as_ref();
        let local = source.fetch(original)?;
        let mut file = Self::open_with_buffer(&local, mode, DEFAULT_BUFFER_BYTES)?;
        if local != original {
            file.mark_temporary();
        }
        Ok(file)
    }

    /// Mark this file as fetched from a remote object store into a local
    /// temporary: it will be unlinked on close.
    pub fn mark_temporary(&mut self) {
        self.temporary = true;
    }

    /// Drop the in-memory histogram without persisting it, for callers
    /// that never want it written at close.
    pub fn remove_histogram(&mut self) {
        self.histogram = None;
    }

    /// The accumulated histogram, if this mode carries one.
    #[must_use]
    pub fn histogram(&self) -> Option<&Histogram> {
        self.histogram.as_ref()
    }

    /// Read only the counts sidecar for `path`, without opening `path`
    /// itself (`FullCounts` mode, §6).
    pub fn open_counts(path: impl AsRef<Path>) -> Result<CountsSidecar> {
        let cp = counts_path(path.as_ref());
        CountsSidecar::load(&cp).map_err(|e| io_err(cp, e))
    }

    /// `a_id`/`b_id`/payload record count this file holds per I/O unit.
    #[must_use]
    pub fn record_size(&self) -> u64 {
        self.record_size
    }

    // ---- write path --------------------------------------------------

    /// Append one record, flushing the buffer if it is full.
    ///
    /// # Panics
    /// Panics if this file was not opened for writing.
    pub fn write_overlap(&mut self, o: &Overlap<N>) -> Result<()> {
        assert!(self.mode.is_write(), "write_overlap on a file not opened for writing");

        encode_record(&mut self.buf, o, self.shape);
        self.buf_len = self.buf.len();

        if let Some(counts) = &mut self.counts {
            counts.add_overlap(o);
        }
        if let Some(hist) = &mut self.histogram {
            hist.add_overlap(o);
        }

        if self.buf_len >= self.buf_max {
            self.write_buffer(false)?;
        }
        Ok(())
    }

    /// Append every record in `os`.
    pub fn write_overlaps(&mut self, os: &[Overlap<N>]) -> Result<()> {
        for o in os {
            self.write_overlap(o)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk. Flushes unconditionally when `force` is
    /// true; otherwise only when the buffer is full. A call on an empty
    /// buffer is a no-op.
    pub fn write_buffer(&mut self, force: bool) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        if !force && self.buf.len() < self.buf_max {
            return Ok(());
        }

        let records = self.buf.len() as u64 / self.record_size;

        if self.mode.compressed() {
            write_block(&mut self.file, &self.buf).with_context(|| format!("writing compressed block to '{}'", self.path.display()))?;
            log::debug!("flushed {records} records ({} raw bytes, compressed) to '{}'", self.buf.len(), self.path.display());
        } else {
            self.file.write_all(&self.buf).map_err(|e| io_err(self.path.clone(), e))?;
            log::debug!("flushed {records} records ({} bytes) to '{}'", self.buf.len(), self.path.display());
        }

        self.buf.clear();
        self.buf_len = 0;
        Ok(())
    }

    // ---- read path -----------------------------------------------------

    /// Read the next record into `o`. Returns `true` on end-of-stream
    /// (leaving `o` untouched), `false` if a record was read.
    ///
    /// # Panics
    /// Panics if this file was opened for writing.
    pub fn read_overlap(&mut self, o: &mut Overlap<N>) -> Result<bool> {
        assert!(!self.mode.is_write(), "read_overlap on a file opened for writing");

        if self.buf_pos >= self.buf_len {
            self.read_buffer()?;
            if self.buf_len == 0 {
                return Ok(true);
            }
        }

        let rs = self.record_size as usize;
        *o = decode_record(&self.buf[self.buf_pos..self.buf_pos + rs], self.shape);
        self.buf_pos += rs;
        Ok(false)
    }

    /// Read up to `os.len()` records, returning the count actually
    /// loaded (fewer than requested only at end-of-stream).
    pub fn read_overlaps(&mut self, os: &mut [Overlap<N>]) -> Result<usize> {
        let mut n = 0;
        for slot in os.iter_mut() {
            if self.read_overlap(slot)? {
                break;
            }
            n += 1;
        }
        Ok(n)
    }

    /// Refill the buffer. For uncompressed files, a short read exactly at
    /// a record boundary is a clean end-of-stream; a partial trailing
    /// record is fatal corruption (§7.2). For compressed files, EOF at
    /// the block's length prefix is clean; anything else short is fatal.
    fn read_buffer(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf_pos = 0;

        if self.mode.compressed() {
            match read_block(&mut self.file, &self.path.display().to_string())? {
                BlockRead::Block(bytes) => self.buf = bytes,
                BlockRead::Eof => {
                    self.buf_len = 0;
                    log::debug!("reached end of stream reading '{}'", self.path.display());
                    return Ok(());
                }
            }
        } else {
            let mut raw = vec![0u8; self.buf_max];
            let mut filled = 0usize;
            loop {
                match self.file.read(&mut raw[filled..]).map_err(|e| io_err(self.path.clone(), e))? {
                    0 => break,
                    n => filled += n,
                }
                if filled == raw.len() {
                    break;
                }
            }
            raw.truncate(filled);

            let rs = self.record_size as usize;
            if rs > 0 && raw.len() % rs != 0 {
                let file_len = self.file.metadata().map_err(|e| io_err(self.path.clone(), e))?.len();
                return Err(OvError::MisalignedFile { path: self.path.clone(), file_len, record_size: rs as u64 }.into());
            }
            self.buf = raw;
        }

        self.buf_len = self.buf.len();
        if self.buf_len == 0 {
            log::debug!("reached end of stream reading '{}'", self.path.display());
        } else {
            log::debug!(
                "refilled buffer with {} records ({} bytes) from '{}'",
                self.buf_len as u64 / self.record_size,
                self.buf_len,
                self.path.display()
            );
        }
        Ok(())
    }

    /// Position the file at record `i` and invalidate the buffer.
    /// Defined only for uncompressed files.
    ///
    /// # Panics
    /// Panics if this file is compressed (programmer error, §7.1).
    pub fn seek_overlap(&mut self, i: u64) -> Result<()> {
        assert!(self.mode.seekable(), "seek_overlap on a compressed file");

        let offset = i * self.record_size;
        self.file.seek(SeekFrom::Start(offset)).map_err(|e| io_err(self.path.clone(), e))?;
        self.buf.clear();
        self.buf_len = 0;
        self.buf_pos = 0;
        log::debug!("seeked '{}' to record {i} (offset {offset})", self.path.display());
        Ok(())
    }

    /// Flush (if writing), persist the histogram (if present), unlink the
    /// file (if temporary), and consume `self`. Prefer this over relying
    /// on [`Drop`] when the caller can handle the error.
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.mode.is_write() {
            self.write_buffer(true)?;
        }
        if self.mode.is_write() {
            if let Some(hist) = &self.histogram {
                let prefix = strip_extension(&self.path);
                hist.save_histogram(&prefix).map_err(|e| io_err(prefix.clone(), e))?;
                log::info!("saved histogram sidecar '{}'", prefix.display());
            }
        }
        if self.mode.is_write() {
            if let Some(counts) = &self.counts {
                if !self.counts_readonly {
                    let cp = counts_path(&self.path);
                    counts.save(&cp).map_err(|e| io_err(cp.clone(), e))?;
                    log::info!("saved counts sidecar '{}'", cp.display());
                }
            }
        }
        if self.temporary {
            std::fs::remove_file(&self.path).map_err(|e| io_err(self.path.clone(), e))?;
            log::info!("unlinked temporary file '{}'", self.path.display());
        }
        log::info!("closed overlap file '{}'", self.path.display());
        Ok(())
    }
}

impl<const N: usize> Drop for OvFile<N> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::error!("error closing overlap file '{}': {e:#}", self.path.display());
        }
    }
}
