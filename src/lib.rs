//! elfshim - patch away a glibc 2.28 version dependency and forward the
//! call at run time.
//!
//! Executables linked against glibc 2.28 record a `GLIBC_2.28` version
//! requirement on `libc.so.6` and call `fcntl64@@GLIBC_2.28`. Older hosts
//! refuse to load them even though, on x86_64, plain `fcntl` behaves
//! identically. This crate makes such binaries run anyway, in two
//! cooperating halves:
//!
//! - An offline patcher that splices the `GLIBC_2.28` requirement out of
//!   `.gnu.version_r` and demotes `fcntl64@@GLIBC_2.28` to weak binding,
//!   editing the mapped image in place and writing it back whole.
//! - A run-time shim (`libelfshim.so`, preloaded by the launcher) that
//!   re-exports `fcntl64@@GLIBC_2.28` as a trampoline forwarding to
//!   whichever versioned implementation the running host actually has.
//!
//! # Example
//!
//! ```no_run
//! fn main() -> elfshim::Result<()> {
//!     let report = elfshim::patch_file(std::path::Path::new("/opt/node/bin/node"))?;
//!     if report.changed() {
//!         println!("patched");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod elf;
pub mod error;
pub mod patch;
pub mod runtime;
pub mod util;

// Re-export main types
pub use elf::ElfImage;
pub use error::{Error, Result};
pub use patch::{patch_file, PatchReport};
