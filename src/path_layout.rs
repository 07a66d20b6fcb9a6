//! File path conventions: sliced store layout and the "prefix" (path with
//! its trailing extension stripped) used to locate sidecars, ported from
//! `ovFile::createDataName` / `AS_UTL_findBaseFileName`.

use std::path::{Path, PathBuf};

/// Build the path of a sliced store file: `<store>/<slice:04><piece:03>`,
/// with the angle brackets as literal characters.
#[must_use]
pub fn sliced_path(store: impl AsRef<Path>, slice: u32, piece: u32) -> PathBuf {
    store.as_ref().join(format!("{slice:04}<{piece:03}>"))
}

/// The path with any single trailing `.<ext>` removed, used to locate the
/// histogram sidecar.
#[must_use]
pub fn strip_extension(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match path.extension() {
        Some(_) => path.with_extension(""),
        None => path.to_path_buf(),
    }
}

/// The counts sidecar path, `<path>.counts`: a separate on-disk object
/// read by the `FullCounts` mode without ever opening `path` itself.
#[must_use]
pub fn counts_path(path: impl AsRef<Path>) -> PathBuf {
    let mut s = path.as_ref().as_os_str().to_owned();
    s.push(".counts");
    PathBuf::from(s)
}
