#![deny(unconditional_recursion)]
#![deny(unreachable_patterns)]
#![deny(trivial_casts)]

//! On-disk record store and bit-packed data layer for a whole-genome
//! overlap store.
//!
//! Three containers carry the engineering here, leaves first:
//!
//! - [`bits`] / [`bit_array`] / [`word_array`]: dense bit flags and
//!   fixed-width integer packing, O(1) random access across 64-bit words.
//! - [`stuffed_bits`]: a sequential bit-stream with unary, fixed-width,
//!   Elias-gamma, Elias-delta and Zeckendorf codings, chained over
//!   fixed-capacity blocks.
//! - [`ov_file`]: an append-only file of fixed-shape `Overlap` records,
//!   either uncompressed with byte-offset seek or block-compressed and
//!   streamed, plus its counts/histogram sidecars ([`sidecar`]).

#[cfg(all(feature = "word32", feature = "word64"))]
compile_error!("features \"word32\" and \"word64\" are mutually exclusive");

#[cfg(not(any(feature = "word32", feature = "word64")))]
compile_error!("exactly one of features \"word32\" or \"word64\" must be enabled");

pub mod bits;
pub mod bit_array;
pub mod word_array;
pub mod stuffed_bits;
pub mod codec;
pub mod record;
pub mod sidecar;
pub mod path_layout;
pub mod error;
pub mod ov_file;

pub mod prelude {
    pub use crate::bit_array::BitArray;
    pub use crate::error::OvError;
    pub use crate::ov_file::{FetchSource, LocalSource, OvFile, OvFileMode};
    pub use crate::record::{Overlap, Shape, Word};
    pub use crate::sidecar::{CountsSidecar, Histogram};
    pub use crate::stuffed_bits::StuffedBits;
    pub use crate::word_array::WordArray;
}
