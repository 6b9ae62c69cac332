//! Byte-exact lookups inside ELF string tables.

use memchr::memmem;

use crate::util::memchr_null;

/// A read-only view of an ELF string table section.
///
/// Records elsewhere in the image (symbol entries, version-requirement
/// nodes) refer to strings by byte offset into this table. `find` returns
/// such an offset, so callers match records by comparing their recorded
/// offset against the lookup result; a `None` result never matches any
/// record.
#[derive(Debug, Clone, Copy)]
pub struct StrTab<'a> {
    bytes: &'a [u8],
}

impl<'a> StrTab<'a> {
    /// Wraps a string table region.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Finds the offset of a byte-exact occurrence of `needle`, including
    /// its terminating NUL, anywhere in the table.
    ///
    /// The match may land mid-string: looking up a name that is the tail of
    /// a longer table entry is legitimate, the table shares suffixes that
    /// way.
    pub fn find(&self, needle: &str) -> Option<usize> {
        let mut pattern = Vec::with_capacity(needle.len() + 1);
        pattern.extend_from_slice(needle.as_bytes());
        pattern.push(0);
        memmem::find(self.bytes, &pattern)
    }

    /// Returns the NUL-terminated string starting at `offset`, without the
    /// terminator, or `None` if the offset is out of range.
    pub fn cstr_at(&self, offset: usize) -> Option<&'a [u8]> {
        if offset >= self.bytes.len() {
            return None;
        }
        let tail = &self.bytes[offset..];
        Some(&tail[..memchr_null(tail)])
    }
}
