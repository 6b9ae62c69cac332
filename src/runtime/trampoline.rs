//! Run-time forwarding for `fcntl64@@GLIBC_2.28`.
//!
//! When the shim is preloaded into a patched executable, the weakened
//! `fcntl64` reference binds to the definition exported here. At load time
//! a `.init_array` constructor resolves both candidate implementations from
//! the components behind this shim in load order; per call, the trampoline
//! dispatches to `fcntl64@GLIBC_2.28` when the host libc has it and falls
//! back to `fcntl@GLIBC_2.2.5` otherwise. On x86_64 the two are
//! interchangeable at the ABI level.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

/// `fcntl64@GLIBC_2.28` from the next component in load order, or null if
/// the host libc predates it. Written once at load time.
static ELFSHIM_NEXT_FCNTL64: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());

/// `fcntl@GLIBC_2.2.5` from the next component in load order, or null.
/// Written once at load time.
static ELFSHIM_NEXT_FCNTL: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());

/// Resolves the two forwarding slots.
///
/// Runs before the target program's entry point; both lookups may
/// independently fail without being fatal here, the trampoline simply
/// dispatches to whichever slot is populated.
unsafe extern "C" fn resolve_forwarding_targets() {
    let newer = libc::dlvsym(libc::RTLD_NEXT, c"fcntl64".as_ptr(), c"GLIBC_2.28".as_ptr());
    let older = libc::dlvsym(libc::RTLD_NEXT, c"fcntl".as_ptr(), c"GLIBC_2.2.5".as_ptr());
    ELFSHIM_NEXT_FCNTL64.store(newer, Ordering::Relaxed);
    ELFSHIM_NEXT_FCNTL.store(older, Ordering::Relaxed);
}

#[used]
#[link_section = ".init_array"]
static ELFSHIM_INIT: unsafe extern "C" fn() = resolve_forwarding_targets;

// The exported entry point must be indistinguishable from a native
// `fcntl64` definition: variadic, so every argument register (including
// %al's vector count) has to reach the real implementation untouched. No
// Rust prologue may run, hence a bare assembly trampoline. %r15 is
// callee-saved and restored around the indirect call.
//
// The `GLIBC_2.28` version node named by `.symver` comes from
// libelfshim.map, which build.rs hands to the linker; rustc links shared
// objects with `--no-undefined-version`, so an undeclared node fails the
// cdylib link.
std::arch::global_asm!(
    r#"
    .globl elfshim_fcntl64
    .type elfshim_fcntl64, @function
    .symver elfshim_fcntl64, fcntl64@@GLIBC_2.28
elfshim_fcntl64:
    endbr64
    push r15
    mov r15, qword ptr [rip + {newer}]
    test r15, r15
    cmovz r15, qword ptr [rip + {older}]
    call r15
    pop r15
    ret
    .size elfshim_fcntl64, . - elfshim_fcntl64
"#,
    newer = sym ELFSHIM_NEXT_FCNTL64,
    older = sym ELFSHIM_NEXT_FCNTL,
);
