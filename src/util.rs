//! Helpers for reading and writing fixed-layout fields inside a flat byte
//! buffer.
//!
//! All on-disk structures handled by this crate are little-endian. The
//! byteorder crate compiles these down to single unaligned load/store
//! instructions on x86-64.

use byteorder::{ByteOrder, LittleEndian};

/// Reads a little-endian u16 from a byte slice at the given offset.
///
/// # Panics
///
/// Panics if `offset + 2 > data.len()`.
#[inline(always)]
pub fn read_u16_le_at(data: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&data[offset..])
}

/// Reads a little-endian u32 from a byte slice at the given offset.
///
/// # Panics
///
/// Panics if `offset + 4 > data.len()`.
#[inline(always)]
pub fn read_u32_le_at(data: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&data[offset..])
}

/// Reads a little-endian u64 from a byte slice at the given offset.
///
/// # Panics
///
/// Panics if `offset + 8 > data.len()`.
#[inline(always)]
pub fn read_u64_le_at(data: &[u8], offset: usize) -> u64 {
    LittleEndian::read_u64(&data[offset..])
}

/// Writes a little-endian u16 into a byte slice at the given offset.
///
/// # Panics
///
/// Panics if `offset + 2 > data.len()`.
#[inline(always)]
pub fn write_u16_le_at(data: &mut [u8], offset: usize, value: u16) {
    LittleEndian::write_u16(&mut data[offset..], value);
}

/// Writes a little-endian u32 into a byte slice at the given offset.
///
/// # Panics
///
/// Panics if `offset + 4 > data.len()`.
#[inline(always)]
pub fn write_u32_le_at(data: &mut [u8], offset: usize, value: u32) {
    LittleEndian::write_u32(&mut data[offset..], value);
}

/// Finds the position of the first null byte in a slice.
///
/// Returns `data.len()` if the slice contains no null byte.
#[inline(always)]
pub fn memchr_null(data: &[u8]) -> usize {
    memchr::memchr(0, data).unwrap_or(data.len())
}
