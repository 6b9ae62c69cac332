//! ELF format constants.
//!
//! Only the subset needed to validate an image and edit its symbol and
//! version-requirement tables.

// =============================================================================
// Identification
// =============================================================================

/// The four magic bytes at the start of every ELF file.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Offset of the file class byte within e_ident.
pub const EI_CLASS: usize = 4;

/// Offset of the data encoding byte within e_ident.
pub const EI_DATA: usize = 5;

/// 64-bit file class.
pub const ELFCLASS64: u8 = 2;

/// Two's complement, little-endian data encoding.
pub const ELFDATA2LSB: u8 = 1;

// =============================================================================
// Header Fields
// =============================================================================

/// Executable file type.
pub const ET_EXEC: u16 = 2;

/// AMD x86-64 architecture.
pub const EM_X86_64: u16 = 62;

/// Reserved e_shstrndx value meaning the real index lives elsewhere.
pub const SHN_XINDEX: u16 = 0xffff;

// =============================================================================
// Symbol Info
// =============================================================================

/// st_info for a globally bound function (STB_GLOBAL << 4 | STT_FUNC).
pub const SYM_GLOBAL_FUNC: u8 = 0x12;

/// st_info for a weakly bound function (STB_WEAK << 4 | STT_FUNC).
pub const SYM_WEAK_FUNC: u8 = 0x22;

// =============================================================================
// Section Names
// =============================================================================

/// Dynamic string table.
pub const SECTION_DYNSTR: &str = ".dynstr";

/// Version requirement table.
pub const SECTION_VERNEED: &str = ".gnu.version_r";

/// Symbol table.
pub const SECTION_SYMTAB: &str = ".symtab";

/// Symbol name string table.
pub const SECTION_STRTAB: &str = ".strtab";
