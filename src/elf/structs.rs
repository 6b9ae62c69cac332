//! ELF binary structures.
//!
//! These structures match the on-disk format of 64-bit little-endian ELF
//! files. They are read by value with zerocopy so the backing buffer needs
//! no particular alignment; field mutations go back through explicit
//! little-endian writes at the documented field offsets.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

// =============================================================================
// File Header
// =============================================================================

/// 64-bit ELF file header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Ehdr64 {
    /// Identification bytes (magic, class, data encoding, ...)
    pub e_ident: [u8; 16],
    /// Object file type
    pub e_type: u16,
    /// Target architecture
    pub e_machine: u16,
    /// Object file version
    pub e_version: u32,
    /// Entry point virtual address
    pub e_entry: u64,
    /// Program header table file offset
    pub e_phoff: u64,
    /// Section header table file offset
    pub e_shoff: u64,
    /// Processor-specific flags
    pub e_flags: u32,
    /// ELF header size
    pub e_ehsize: u16,
    /// Program header entry size
    pub e_phentsize: u16,
    /// Number of program header entries
    pub e_phnum: u16,
    /// Section header entry size
    pub e_shentsize: u16,
    /// Number of section header entries
    pub e_shnum: u16,
    /// Section name string table index
    pub e_shstrndx: u16,
}

impl Ehdr64 {
    /// Size of the header in bytes.
    pub const SIZE: usize = 64;
}

// =============================================================================
// Section Header
// =============================================================================

/// 64-bit ELF section header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Shdr64 {
    /// Section name (offset into the section name table)
    pub sh_name: u32,
    /// Section type
    pub sh_type: u32,
    /// Section flags
    pub sh_flags: u64,
    /// Virtual address at execution
    pub sh_addr: u64,
    /// File offset of section data
    pub sh_offset: u64,
    /// Size of section data in bytes
    pub sh_size: u64,
    /// Link to another section
    pub sh_link: u32,
    /// Additional section information
    pub sh_info: u32,
    /// Section alignment
    pub sh_addralign: u64,
    /// Entry size for table sections
    pub sh_entsize: u64,
}

impl Shdr64 {
    /// Size of a section header entry in bytes.
    pub const SIZE: usize = 64;
}

// =============================================================================
// Symbol Table Entry
// =============================================================================

/// 64-bit ELF symbol table entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Sym64 {
    /// Symbol name (offset into the symbol string table)
    pub st_name: u32,
    /// Binding and type
    pub st_info: u8,
    /// Visibility
    pub st_other: u8,
    /// Defining section index
    pub st_shndx: u16,
    /// Symbol value
    pub st_value: u64,
    /// Symbol size
    pub st_size: u64,
}

impl Sym64 {
    /// Size of a symbol table entry in bytes.
    pub const SIZE: usize = 24;

    /// Byte offset of the st_info field within the entry.
    pub const INFO_OFFSET: usize = 4;
}

// =============================================================================
// Version Requirement Records
// =============================================================================

/// Version requirement node, one per required external library.
///
/// Nodes form a singly linked list threaded by `vn_next` byte offsets; each
/// node owns a nested chain of [`Vernaux`] entries starting at `vn_aux`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Verneed {
    /// Version of this structure (1)
    pub vn_version: u16,
    /// Number of auxiliary entries
    pub vn_cnt: u16,
    /// Library file name (offset into the dynamic string table)
    pub vn_file: u32,
    /// Byte offset from this node to its first auxiliary entry
    pub vn_aux: u32,
    /// Byte offset from this node to the next sibling node (0 = last)
    pub vn_next: u32,
}

impl Verneed {
    /// Size of a version requirement node in bytes.
    pub const SIZE: usize = 16;

    /// Byte offset of the vn_cnt field within the node.
    pub const CNT_OFFSET: usize = 2;

    /// Byte offset of the vn_aux field within the node.
    pub const AUX_OFFSET: usize = 8;
}

/// Version requirement auxiliary entry, one per required version string.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Vernaux {
    /// Hash of the version name
    pub vna_hash: u32,
    /// Flags
    pub vna_flags: u16,
    /// Version index used in the .gnu.version table
    pub vna_other: u16,
    /// Version name (offset into the dynamic string table)
    pub vna_name: u32,
    /// Byte offset from this entry to the next auxiliary entry (0 = last)
    pub vna_next: u32,
}

impl Vernaux {
    /// Size of a version auxiliary entry in bytes.
    pub const SIZE: usize = 16;

    /// Byte offset of the vna_next field within the entry.
    pub const NEXT_OFFSET: usize = 12;
}
