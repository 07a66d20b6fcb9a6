//! Counts and histogram sidecars (component G), ported from Canu's
//! `ovFileOCW`/`ovFileOCR` (counts) and `ovStoreHistogram` (histogram).
//!
//! Both observe every record written through [`crate::ov_file::OvFile`]
//! and are owned exclusively by the file: they are created on demand for
//! output modes and destroyed with the file (Rust's `Drop` does this for
//! us without an explicit destructor).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::record::{Overlap, Word};

fn write_u64(w: &mut impl Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_ne_bytes())
}
fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_ne_bytes())
}
fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_ne_bytes(b))
}
fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_ne_bytes(b))
}

/// Per-file record counts, keyed by `a_id`. Observes every record written
/// by the owning file; separate on disk from the main file, read by the
/// `FullCounts` open mode without opening the main file at all.
#[derive(Debug, Default, Clone)]
pub struct CountsSidecar {
    per_id: BTreeMap<u32, u64>,
    total: u64,
}

impl CountsSidecar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one more written record.
    pub fn add_overlap<const N: usize>(&mut self, o: &Overlap<N>) {
        *self.per_id.entry(o.a_id).or_insert(0) += 1;
        self.total += 1;
    }

    /// Total number of records observed.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of records observed for a given `a_id`.
    #[must_use]
    pub fn count_for(&self, a_id: u32) -> u64 {
        self.per_id.get(&a_id).copied().unwrap_or(0)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        write_u64(&mut w, self.total)?;
        write_u64(&mut w, self.per_id.len() as u64)?;
        for (&id, &count) in &self.per_id {
            write_u32(&mut w, id)?;
            write_u64(&mut w, count)?;
        }
        w.flush()
    }

    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut r = BufReader::new(File::open(path)?);
        let total = read_u64(&mut r)?;
        let n = read_u64(&mut r)?;
        let mut per_id = BTreeMap::new();
        for _ in 0..n {
            let id = read_u32(&mut r)?;
            let count = read_u64(&mut r)?;
            per_id.insert(id, count);
        }
        Ok(Self { per_id, total })
    }
}

/// A sequence-identifier-keyed summary of record statistics: per `a_id`,
/// the number of overlaps and the sum of the first payload word (a stand-in
/// for whatever alignment-length statistic the caller's payload encodes —
/// the payload's bit layout is opaque to this store, per §3).
#[derive(Debug, Default, Clone)]
pub struct Histogram {
    per_id: BTreeMap<u32, (u64, u64)>,
}

impl Histogram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_overlap<const N: usize>(&mut self, o: &Overlap<N>)
    where
        Word: Into<u64> + Copy,
    {
        let stat: u64 = o.dat.first().copied().map(Word::into).unwrap_or(0);
        let entry = self.per_id.entry(o.a_id).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += stat;
    }

    /// Number of overlaps observed for `a_id`.
    #[must_use]
    pub fn count_for(&self, a_id: u32) -> u64 {
        self.per_id.get(&a_id).map(|e| e.0).unwrap_or(0)
    }

    /// Sum of the tracked statistic observed for `a_id`.
    #[must_use]
    pub fn sum_for(&self, a_id: u32) -> u64 {
        self.per_id.get(&a_id).map(|e| e.1).unwrap_or(0)
    }

    /// Persist under `<prefix>` (the file path with its extension
    /// stripped, per [`crate::path_layout::strip_extension`]).
    pub fn save_histogram(&self, prefix: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(prefix)?);
        write_u64(&mut w, self.per_id.len() as u64)?;
        for (&id, &(count, sum)) in &self.per_id {
            write_u32(&mut w, id)?;
            write_u64(&mut w, count)?;
            write_u64(&mut w, sum)?;
        }
        w.flush()
    }

    pub fn load(prefix: impl AsRef<Path>) -> io::Result<Self> {
        let mut r = BufReader::new(File::open(prefix)?);
        let n = read_u64(&mut r)?;
        let mut per_id = BTreeMap::new();
        for _ in 0..n {
            let id = read_u32(&mut r)?;
            let count = read_u64(&mut r)?;
            let sum = read_u64(&mut r)?;
            per_id.insert(id, (count, sum));
        }
        Ok(Self { per_id })
    }
}
