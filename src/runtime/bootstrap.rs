//! Process launch with the forwarding shim preloaded.
//!
//! The launcher rebuilds its environment from the kernel's own record of
//! the process rather than from libc's view, so the target inherits it
//! byte for byte as the kernel recorded it, plus one `LD_PRELOAD` entry
//! pointing at the shim. The exec argv comes from the parsed command: the
//! raw command line may still carry CLI framing (a `--` escape before
//! hyphen arguments) that must not reach the target.

use std::convert::Infallible;
use std::ffi::{c_char, CString, OsStr, OsString};
use std::fs;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Maximum number of entries accepted per string list.
pub const MAX_STRINGS: usize = 1 << 14;

/// Maximum byte size accepted per raw procfs buffer.
pub const MAX_BYTES: usize = 1 << 18;

/// The process's own argument list and environment, as recorded by the
/// kernel at exec time.
#[derive(Debug, Clone)]
pub struct ProcessSnapshot {
    /// NUL-split entries of `/proc/self/cmdline`.
    pub args: Vec<CString>,
    /// NUL-split entries of `/proc/self/environ`.
    pub env: Vec<CString>,
}

impl ProcessSnapshot {
    /// Captures the current process state from procfs.
    pub fn capture() -> Result<Self> {
        Ok(Self {
            args: read_string_list(Path::new("/proc/self/cmdline"), "argument list")?,
            env: read_string_list(Path::new("/proc/self/environ"), "environment")?,
        })
    }
}

/// Builds the exec argv from the parsed target command.
///
/// Rejects an interior NUL rather than silently truncating an argument at
/// exec time.
pub fn command_argv(program: &OsStr, args: &[OsString]) -> Result<Vec<CString>> {
    std::iter::once(program)
        .chain(args.iter().map(OsString::as_os_str))
        .map(|raw| {
            CString::new(raw.as_bytes()).map_err(|_| Error::NulArgument {
                arg: raw.to_string_lossy().into_owned(),
            })
        })
        .collect()
}

/// Reads a NUL-separated string list from procfs, enforcing the fixed
/// count and byte budgets.
fn read_string_list(path: &Path, what: &'static str) -> Result<Vec<CString>> {
    let raw = fs::read(path).map_err(|source| Error::Procfs {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.len() > MAX_BYTES {
        return Err(Error::SnapshotBudget {
            what,
            limit: MAX_BYTES,
        });
    }

    let mut out = Vec::new();
    for chunk in raw.split(|&b| b == 0) {
        if chunk.is_empty() {
            continue;
        }
        if out.len() >= MAX_STRINGS {
            return Err(Error::SnapshotBudget {
                what,
                limit: MAX_STRINGS,
            });
        }
        // Splitting on NUL cannot leave an interior NUL in the chunk.
        out.push(unsafe { CString::from_vec_unchecked(chunk.to_vec()) });
    }
    debug!(path = %path.display(), entries = out.len(), "captured");
    Ok(out)
}

/// Resolves the shim shared object to preload.
///
/// Defaults to `libelfshim.so` next to the launcher executable; the path is
/// made absolute because the loader resolves a relative `LD_PRELOAD`
/// against the target's working directory.
pub fn resolve_shim_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let mut path = std::env::current_exe()?;
            path.set_file_name("libelfshim.so");
            path
        }
    };
    Ok(fs::canonicalize(&path).map_err(|source| Error::FileOpen { path, source })?)
}

/// Replaces the current process image with `argv`, carrying `env` plus an
/// `LD_PRELOAD` entry for the shim.
///
/// On success this never returns; a returning exec is a fatal error.
pub fn launch(argv: &[CString], env: &[CString], shim: &Path) -> Result<Infallible> {
    let Some(program) = argv.first().map(|arg| arg.to_string_lossy().into_owned()) else {
        return Err(Error::Exec {
            program: String::new(),
            source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
        });
    };

    let mut preload = OsString::from("LD_PRELOAD=");
    preload.push(shim.as_os_str());
    // Unix paths cannot contain NUL.
    let preload = unsafe { CString::from_vec_unchecked(preload.into_vec()) };

    info!(program, shim = %shim.display(), "launching with shim preloaded");

    let mut envp: Vec<*const c_char> = env.iter().map(|entry| entry.as_ptr()).collect();
    envp.push(preload.as_ptr());
    envp.push(std::ptr::null());

    let mut argp: Vec<*const c_char> = argv.iter().map(|arg| arg.as_ptr()).collect();
    argp.push(std::ptr::null());

    // Only returns on failure.
    unsafe { libc::execvpe(argp[0], argp.as_ptr(), envp.as_ptr()) };

    Err(Error::Exec {
        program,
        source: std::io::Error::last_os_error(),
    })
}
