//! The `Overlap` record: two sequence identifiers plus a fixed-width
//! payload of `N` [`Word`]s, serialised in one of two on-disk shapes.

/// The payload word width, fixed at build time for the whole format by the
/// mutually exclusive `word32`/`word64` Cargo features — Rust's analogue
/// of the original's `ovOverlapWORDSZ` preprocessor switch.
#[cfg(feature = "word64")]
pub type Word = u64;
#[cfg(feature = "word32")]
pub type Word = u32;

/// Number of 32-bit units one [`Word`] serialises to on disk.
pub(crate) const WORD_32BIT_UNITS: usize = std::mem::size_of::<Word>() / 4;

/// A fixed-shape overlap record: two sequence identifiers plus `N` words
/// of bit-packed alignment payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overlap<const N: usize> {
    /// Identifier of sequence A. Present in memory always; on disk only
    /// under [`Shape::Full`] (see [`Shape::Normal`]'s doc).
    pub a_id: u32,
    /// Identifier of sequence B.
    pub b_id: u32,
    /// Bit-packed alignment coordinates and flags.
    pub dat: [Word; N],
}

impl<const N: usize> Overlap<N> {
    /// A zeroed record.
    #[must_use]
    pub fn zero() -> Self {
        Self { a_id: 0, b_id: 0, dat: [Default::default(); N] }
    }
}

/// The two on-disk record shapes. A writer and reader of the same file
/// must agree on the shape; opening a file with the wrong shape produces
/// garbage (detection is out of scope — a programmer error, not a
/// file-format error, per §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Serialises `b_id` then `dat`. `a_id` is not stored; it is supplied
    /// by context (the slice/piece the file belongs to).
    Normal,
    /// Serialises `a_id`, `b_id`, then `dat`.
    Full,
}

impl Shape {
    /// Record size in bytes for `N` payload words of [`Word`].
    #[must_use]
    pub const fn record_size<const N: usize>(self) -> u64 {
        let dat_bytes = (N * WORD_32BIT_UNITS * 4) as u64;
        match self {
            Shape::Normal => 4 + dat_bytes,
            Shape::Full => 8 + dat_bytes,
        }
    }
}
