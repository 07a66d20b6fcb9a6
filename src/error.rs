//! The error taxonomy of §7: I/O failures, file-format corruption, and
//! end-of-stream are `Result` values; programmer contract violations
//! (§7.1) are asserts/panics instead, since recovering from them makes no
//! sense in a batch pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Typed errors this crate's file layer can return. Application code is
/// expected to propagate these (via `anyhow`) and let the process abort;
/// there is no recovery path at this layer (§7, "Propagation policy").
#[derive(Debug, Error)]
pub enum OvError {
    /// A short read discovered mid-record or mid-frame: the file is
    /// corrupt, not merely at EOF.
    #[error("short read on file '{path}': read {actual} bytes, expected {expected}")]
    ShortRead { path: PathBuf, expected: u64, actual: u64 },

    /// An uncompressed file's length is not a multiple of its record size.
    #[error("file '{path}' has length {file_len} bytes, not a multiple of the {record_size}-byte record size")]
    MisalignedFile { path: PathBuf, file_len: u64, record_size: u64 },

    /// Any other I/O failure, tagged with the path it happened on.
    #[error("I/O error on '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
}
