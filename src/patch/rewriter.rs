//! On-disk image rewriting.

use std::fs::OpenOptions;
use std::os::unix::fs::FileExt;
use std::path::Path;

use memmap2::MmapOptions;
use tracing::info;

use super::PatchReport;
use crate::error::{Error, Result};

/// Patches an executable file in place.
///
/// The file is mapped copy-on-write, edited in memory, and then written
/// back in a single `pwrite` of the full mapped length at offset 0. A short
/// write is fatal: the on-disk image must never be half patched.
pub fn patch_file(path: &Path) -> Result<PatchReport> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

    // map_copy gives a private, writable view; nothing reaches the file
    // until the explicit write-back below.
    let mut map = unsafe { MmapOptions::new().map_copy(&file) }.map_err(|source| {
        Error::MemoryMap {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let report = super::apply(&mut map)?;

    let written = file.write_at(&map, 0)?;
    if written < map.len() {
        return Err(Error::PartialWrite {
            written,
            expected: map.len(),
        });
    }

    info!(
        path = %path.display(),
        dependency_removed = report.dependency_removed,
        symbol = ?report.symbol,
        "patched"
    );

    Ok(report)
}
