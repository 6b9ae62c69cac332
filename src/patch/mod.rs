//! Offline patch pipeline.
//!
//! Edits an already-linked executable in place: the `GLIBC_2.28` version
//! dependency on `libc.so.6` is spliced out of `.gnu.version_r`, and the
//! `fcntl64@@GLIBC_2.28` symbol is demoted from global to weak binding so
//! the loader accepts whatever definition is available at run time. Both
//! edits are no-ops on an already-patched image, so the pipeline is
//! idempotent.

pub mod rewriter;
pub mod strtab;
pub mod symtab;
pub mod verneed;

#[cfg(test)]
pub(crate) mod testimage;

pub use rewriter::patch_file;
pub use strtab::StrTab;
pub use symtab::{weaken_symbol, SymbolEdit};
pub use verneed::{list_requirements, remove_version_dependency};

use crate::elf::ElfImage;
use crate::error::Result;

/// Library whose version dependency gets removed.
pub const TARGET_LIBRARY: &str = "libc.so.6";

/// Version string removed from the requirement chain.
pub const TARGET_VERSION: &str = "GLIBC_2.28";

/// Symbol demoted to weak binding, with the version suffix exactly as
/// recorded in the symbol string table.
pub const TARGET_SYMBOL: &str = "fcntl64@@GLIBC_2.28";

/// What a patch pass actually changed.
#[derive(Debug, Clone, Copy)]
pub struct PatchReport {
    /// True if the version dependency was present and spliced out.
    pub dependency_removed: bool,
    /// Outcome of the symbol weakening pass.
    pub symbol: SymbolEdit,
}

impl PatchReport {
    /// Returns true if any byte of the image changed.
    pub fn changed(&self) -> bool {
        self.dependency_removed || self.symbol == SymbolEdit::Weakened
    }
}

/// Applies both edits to an in-memory image.
pub fn apply(data: &mut [u8]) -> Result<PatchReport> {
    let image = ElfImage::parse(data)?;

    let dependency_removed = remove_version_dependency(
        data,
        image.dynstr,
        image.verneed,
        TARGET_LIBRARY,
        TARGET_VERSION,
    )?;
    let symbol = weaken_symbol(data, image.strtab, image.symtab, TARGET_SYMBOL)?;

    Ok(PatchReport {
        dependency_removed,
        symbol,
    })
}
