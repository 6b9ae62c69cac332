//! ELF image parsing.
//!
//! Just enough of the 64-bit little-endian ELF format to locate the four
//! sections the patcher edits. This is not a general ELF reader.

pub mod constants;
pub mod image;
pub mod structs;

pub use constants::*;
pub use image::{ElfImage, SectionRef};
pub use structs::*;
