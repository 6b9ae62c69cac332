//! Links the shim cdylib against the symbol version script.
//!
//! The trampoline's `.symver` directive references a `GLIBC_2.28` version
//! node, and rustc links shared objects with `--no-undefined-version`, so
//! the node has to be declared to the linker or `libelfshim.so` fails to
//! link.

use std::env;
use std::path::PathBuf;

fn main() {
    let script = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap()).join("libelfshim.map");
    println!("cargo:rerun-if-changed={}", script.display());
    println!(
        "cargo:rustc-cdylib-link-arg=-Wl,--version-script={}",
        script.display()
    );
}
