//! Synthetic ELF images for tests.
//!
//! Builds a minimal but well-formed x86_64 executable containing the four
//! sections the patcher edits, with configurable version-requirement chains
//! and symbol table entries.

use zerocopy::IntoBytes;

use crate::elf::constants::*;
use crate::elf::structs::*;

/// Builder for synthetic test executables.
pub struct TestImage {
    /// (library name, version strings) per version-requirement node.
    pub libraries: Vec<(String, Vec<String>)>,
    /// (symbol name, st_info) per symbol table entry after the null entry.
    pub symbols: Vec<(String, u8)>,
}

impl Default for TestImage {
    fn default() -> Self {
        Self {
            libraries: vec![
                (
                    "ld-linux-x86-64.so.2".to_string(),
                    vec!["GLIBC_2.3".to_string()],
                ),
                (
                    "libc.so.6".to_string(),
                    vec!["GLIBC_2.17".to_string(), "GLIBC_2.28".to_string()],
                ),
            ],
            symbols: vec![
                ("main".to_string(), SYM_GLOBAL_FUNC),
                ("fcntl64@@GLIBC_2.28".to_string(), SYM_GLOBAL_FUNC),
            ],
        }
    }
}

impl TestImage {
    /// Serializes the image into a byte buffer.
    pub fn build(&self) -> Vec<u8> {
        // Dynamic string table: library names and version strings. Repeated
        // strings share one offset, the way real linkers deduplicate the
        // table.
        let mut dynstr = vec![0u8];
        let mut dynstr_off = |s: &str| -> u32 {
            let mut pattern = s.as_bytes().to_vec();
            pattern.push(0);
            if let Some(off) = memchr::memmem::find(&dynstr, &pattern) {
                return off as u32;
            }
            let off = dynstr.len() as u32;
            dynstr.extend_from_slice(&pattern);
            off
        };

        let lib_offsets: Vec<(u32, Vec<u32>)> = self
            .libraries
            .iter()
            .map(|(lib, versions)| {
                let lib_off = dynstr_off(lib);
                let ver_offs = versions.iter().map(|v| dynstr_off(v)).collect();
                (lib_off, ver_offs)
            })
            .collect();

        // Version requirement table: each node immediately followed by its
        // contiguous auxiliary entries, the way glibc's linker lays them out.
        let mut verneed = Vec::new();
        for (i, (lib_off, ver_offs)) in lib_offsets.iter().enumerate() {
            let aux_bytes = ver_offs.len() * Vernaux::SIZE;
            let node = Verneed {
                vn_version: 1,
                vn_cnt: ver_offs.len() as u16,
                vn_file: *lib_off,
                vn_aux: Verneed::SIZE as u32,
                vn_next: if i + 1 == lib_offsets.len() {
                    0
                } else {
                    (Verneed::SIZE + aux_bytes) as u32
                },
            };
            verneed.extend_from_slice(node.as_bytes());
            for (j, ver_off) in ver_offs.iter().enumerate() {
                let aux = Vernaux {
                    vna_hash: 0x0d696910 + j as u32,
                    vna_flags: 0,
                    vna_other: 2 + (i + j) as u16,
                    vna_name: *ver_off,
                    vna_next: if j + 1 == ver_offs.len() {
                        0
                    } else {
                        Vernaux::SIZE as u32
                    },
                };
                verneed.extend_from_slice(aux.as_bytes());
            }
        }

        // Symbol string table and symbol table (null entry first).
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; Sym64::SIZE];
        for (name, st_info) in &self.symbols {
            let st_name = strtab.len() as u32;
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
            let sym = Sym64 {
                st_name,
                st_info: *st_info,
                st_other: 0,
                st_shndx: 1,
                st_value: 0x401000,
                st_size: 0,
            };
            symtab.extend_from_slice(sym.as_bytes());
        }

        // Section name table.
        let names = [
            "",
            SECTION_DYNSTR,
            SECTION_VERNEED,
            SECTION_SYMTAB,
            SECTION_STRTAB,
            ".shstrtab",
        ];
        let mut shstrtab = Vec::new();
        let name_offsets: Vec<u32> = names
            .iter()
            .map(|name| {
                let off = shstrtab.len() as u32;
                shstrtab.extend_from_slice(name.as_bytes());
                shstrtab.push(0);
                off
            })
            .collect();

        // Lay the sections out back to back after the file header.
        let mut data = vec![0u8; Ehdr64::SIZE];
        let mut place = |bytes: &[u8]| -> (u64, u64) {
            let off = data.len() as u64;
            data.extend_from_slice(bytes);
            (off, bytes.len() as u64)
        };
        let (dynstr_pos, dynstr_len) = place(&dynstr);
        let (verneed_pos, verneed_len) = place(&verneed);
        let (symtab_pos, symtab_len) = place(&symtab);
        let (strtab_pos, strtab_len) = place(&strtab);
        let (shstr_pos, shstr_len) = place(&shstrtab);

        let shoff = data.len() as u64;
        let sections = [
            (0, 0u32, 0u64, 0u64, 0u64),
            (1, 3, dynstr_pos, dynstr_len, 0), // SHT_STRTAB
            (2, 0x6ffffffe, verneed_pos, verneed_len, 0), // SHT_GNU_verneed
            (3, 2, symtab_pos, symtab_len, Sym64::SIZE as u64), // SHT_SYMTAB
            (4, 3, strtab_pos, strtab_len, 0),
            (5, 3, shstr_pos, shstr_len, 0),
        ];
        for (i, sh_type, sh_offset, sh_size, sh_entsize) in sections {
            let shdr = Shdr64 {
                sh_name: name_offsets[i],
                sh_type,
                sh_flags: 0,
                sh_addr: 0,
                sh_offset,
                sh_size,
                sh_link: 0,
                sh_info: 0,
                sh_addralign: 1,
                sh_entsize,
            };
            data.extend_from_slice(shdr.as_bytes());
        }

        let header = Ehdr64 {
            e_ident: {
                let mut ident = [0u8; 16];
                ident[..4].copy_from_slice(&ELF_MAGIC);
                ident[EI_CLASS] = ELFCLASS64;
                ident[EI_DATA] = ELFDATA2LSB;
                ident[6] = 1; // EV_CURRENT
                ident
            },
            e_type: ET_EXEC,
            e_machine: EM_X86_64,
            e_version: 1,
            e_entry: 0x401000,
            e_phoff: 0,
            e_shoff: shoff,
            e_flags: 0,
            e_ehsize: Ehdr64::SIZE as u16,
            e_phentsize: 0,
            e_phnum: 0,
            e_shentsize: Shdr64::SIZE as u16,
            e_shnum: 6,
            e_shstrndx: 5,
        };
        data[..Ehdr64::SIZE].copy_from_slice(header.as_bytes());

        data
    }
}

/// Builds the default test executable: two version-requirement nodes, with
/// the `libc.so.6` node carrying `GLIBC_2.17` and `GLIBC_2.28`, plus a
/// global `fcntl64@@GLIBC_2.28` symbol.
pub fn build_minimal_elf() -> Vec<u8> {
    TestImage::default().build()
}
