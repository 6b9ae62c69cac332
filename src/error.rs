//! Error types for ELF patching and process bootstrap.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for patch and launch operations.
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open file '{path}': {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to memory map file '{path}': {source}")]
    MemoryMap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("partial write: wrote {written} of {expected} bytes")]
    PartialWrite { written: usize, expected: usize },

    // ==================== Image Format Errors ====================
    #[error("bad ELF magic: {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("not a 64-bit ELF image (class {0:#04x})")]
    NotElf64(u8),

    #[error("not a little-endian ELF image (data encoding {0:#04x})")]
    NotLittleEndian(u8),

    #[error("not an executable (e_type {0:#06x})")]
    NotExecutable(u16),

    #[error("not an x86_64 executable (e_machine {0:#06x})")]
    WrongMachine(u16),

    #[error("no section name table")]
    NoSectionNameTable,

    #[error("extended section name table index is unsupported")]
    ExtendedSectionIndex,

    #[error("required section '{name}' not found")]
    SectionNotFound { name: &'static str },

    #[error("section '{name}' at {offset:#x}+{size:#x} exceeds file size {file_size:#x}")]
    SectionOutOfBounds {
        name: String,
        offset: u64,
        size: u64,
        file_size: u64,
    },

    #[error("image truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    // ==================== Structural Errors ====================
    #[error("{name}: bad symbol kind {st_info:#04x}")]
    UnexpectedSymbolKind { name: String, st_info: u8 },

    #[error("version requirement chain escapes its section at offset {offset:#x}")]
    VerneedChainOutOfBounds { offset: usize },

    #[error("version auxiliary entries at offset {offset:#x} are not contiguous")]
    VernauxNotContiguous { offset: usize },

    // ==================== Bootstrap Errors ====================
    #[error("failed to read '{path}': {source}")]
    Procfs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("process {what} exceeds the budget of {limit}")]
    SnapshotBudget { what: &'static str, limit: usize },

    #[error("argument '{arg}' contains an interior NUL byte")]
    NulArgument { arg: String },

    #[error("failed to exec '{program}': {source}")]
    Exec {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for patch and launch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a truncated-image error.
    #[inline]
    pub fn truncated(needed: usize, available: usize) -> Self {
        Error::Truncated { needed, available }
    }

    /// Creates a section-out-of-bounds error.
    #[inline]
    pub fn section_out_of_bounds(
        name: impl Into<String>,
        offset: u64,
        size: u64,
        file_size: u64,
    ) -> Self {
        Error::SectionOutOfBounds {
            name: name.into(),
            offset,
            size,
            file_size,
        }
    }
}
