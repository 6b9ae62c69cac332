//! ELF image validation and section lookup.

use tracing::debug;
use zerocopy::FromBytes;

use super::constants::*;
use super::structs::*;
use crate::error::{Error, Result};
use crate::util::memchr_null;

// =============================================================================
// Section Reference
// =============================================================================

/// An (offset, size) pair referencing a sub-range of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRef {
    /// File offset of the section data.
    pub offset: usize,
    /// Size of the section data in bytes.
    pub size: usize,
}

impl SectionRef {
    /// Returns the section bytes within `data`.
    ///
    /// Bounds were validated at parse time, so this indexes directly.
    #[inline]
    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.offset..self.offset + self.size]
    }

    /// Returns true if `range` (relative to the section start) lies within
    /// the section.
    #[inline]
    pub fn contains(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.size)
    }
}

// =============================================================================
// Image
// =============================================================================

/// A validated 64-bit x86_64 ELF executable with the four sections the
/// patcher needs located.
#[derive(Debug, Clone)]
pub struct ElfImage {
    /// The file header.
    pub header: Ehdr64,
    /// Dynamic string table (`.dynstr`).
    pub dynstr: SectionRef,
    /// Version requirement table (`.gnu.version_r`).
    pub verneed: SectionRef,
    /// Symbol table (`.symtab`).
    pub symtab: SectionRef,
    /// Symbol name string table (`.strtab`).
    pub strtab: SectionRef,
}

impl ElfImage {
    /// Parses and validates an executable image.
    ///
    /// Checks the magic, class, data encoding, file type and machine before
    /// touching the section header table, then resolves each section name
    /// through the section name table and captures the four required
    /// sections. Every captured range is bounds-checked against the file
    /// length so later editing can index without overflowing.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Self::parse_header(data)?;

        let shoff = header.e_shoff as usize;
        let shnum = header.e_shnum as usize;
        let sh_end = shoff
            .checked_add(shnum * Shdr64::SIZE)
            .ok_or_else(|| Error::truncated(usize::MAX, data.len()))?;
        if sh_end > data.len() {
            return Err(Error::truncated(sh_end, data.len()));
        }

        if header.e_shstrndx == 0 {
            return Err(Error::NoSectionNameTable);
        }
        if header.e_shstrndx == SHN_XINDEX {
            return Err(Error::ExtendedSectionIndex);
        }
        let shstrndx = header.e_shstrndx as usize;
        if shstrndx >= shnum {
            return Err(Error::NoSectionNameTable);
        }

        let shdr_at = |index: usize| -> Result<Shdr64> {
            let off = shoff + index * Shdr64::SIZE;
            let (shdr, _) = Shdr64::read_from_prefix(&data[off..])
                .map_err(|_| Error::truncated(off + Shdr64::SIZE, data.len()))?;
            Ok(shdr)
        };

        let shstrtab = section_ref(data, &shdr_at(shstrndx)?, ".shstrtab")?;
        let shstr_bytes = shstrtab.bytes(data);

        let mut dynstr = None;
        let mut verneed = None;
        let mut symtab = None;
        let mut strtab = None;

        for i in 0..shnum {
            let shdr = shdr_at(i)?;
            let name = section_name(shstr_bytes, shdr.sh_name as usize);
            debug!(index = i, name, size = shdr.sh_size, "section");

            let slot = match name {
                SECTION_DYNSTR => &mut dynstr,
                SECTION_VERNEED => &mut verneed,
                SECTION_SYMTAB => &mut symtab,
                SECTION_STRTAB => &mut strtab,
                _ => continue,
            };
            *slot = Some(section_ref(data, &shdr, name)?);
        }

        let missing = |name: &'static str| Error::SectionNotFound { name };
        Ok(Self {
            header,
            dynstr: dynstr.ok_or_else(|| missing(SECTION_DYNSTR))?,
            verneed: verneed.ok_or_else(|| missing(SECTION_VERNEED))?,
            symtab: symtab.ok_or_else(|| missing(SECTION_SYMTAB))?,
            strtab: strtab.ok_or_else(|| missing(SECTION_STRTAB))?,
        })
    }

    fn parse_header(data: &[u8]) -> Result<Ehdr64> {
        if data.len() < 4 {
            return Err(Error::truncated(Ehdr64::SIZE, data.len()));
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != ELF_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        if data.len() < Ehdr64::SIZE {
            return Err(Error::truncated(Ehdr64::SIZE, data.len()));
        }

        let (header, _) = Ehdr64::read_from_prefix(data)
            .map_err(|_| Error::truncated(Ehdr64::SIZE, data.len()))?;

        if header.e_ident[EI_CLASS] != ELFCLASS64 {
            return Err(Error::NotElf64(header.e_ident[EI_CLASS]));
        }
        if header.e_ident[EI_DATA] != ELFDATA2LSB {
            return Err(Error::NotLittleEndian(header.e_ident[EI_DATA]));
        }
        if header.e_type != ET_EXEC {
            return Err(Error::NotExecutable(header.e_type));
        }
        if header.e_machine != EM_X86_64 {
            return Err(Error::WrongMachine(header.e_machine));
        }

        Ok(header)
    }
}

/// Converts a section header into a bounds-checked [`SectionRef`].
fn section_ref(data: &[u8], shdr: &Shdr64, name: &str) -> Result<SectionRef> {
    let end = shdr.sh_offset.checked_add(shdr.sh_size);
    if end.is_none() || end.unwrap() > data.len() as u64 {
        return Err(Error::section_out_of_bounds(
            name,
            shdr.sh_offset,
            shdr.sh_size,
            data.len() as u64,
        ));
    }
    Ok(SectionRef {
        offset: shdr.sh_offset as usize,
        size: shdr.sh_size as usize,
    })
}

/// Resolves a section name from the section name table.
///
/// An out-of-range or unterminated name resolves to an empty string, which
/// simply never matches any of the required names.
fn section_name(shstrtab: &[u8], offset: usize) -> &str {
    if offset >= shstrtab.len() {
        return "";
    }
    let tail = &shstrtab[offset..];
    let end = memchr_null(tail);
    std::str::from_utf8(&tail[..end]).unwrap_or("")
}
