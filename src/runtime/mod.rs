//! Run-time half of the shim: process launch with preload injection, and
//! the load-time forwarding trampoline exported by the cdylib.

#[cfg(target_os = "linux")]
pub mod bootstrap;

#[cfg(all(target_os = "linux", target_arch = "x86_64", target_env = "gnu"))]
pub mod trampoline;
