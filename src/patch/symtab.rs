//! Symbol linkage editing.

use tracing::debug;
use zerocopy::FromBytes;

use super::strtab::StrTab;
use crate::elf::constants::{SYM_GLOBAL_FUNC, SYM_WEAK_FUNC};
use crate::elf::image::SectionRef;
use crate::elf::structs::Sym64;
use crate::error::{Error, Result};

/// Outcome of a symbol weakening pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolEdit {
    /// The symbol is not present in the table. Benign: the image may never
    /// have referenced it, or may use a build without it.
    NotFound,
    /// The symbol is already weak, nothing to change. Keeps a second patch
    /// run a no-op.
    AlreadyWeak,
    /// The symbol's binding was rewritten from global to weak.
    Weakened,
}

/// Promotes a function symbol from global to weak binding.
///
/// `name` carries the version suffix exactly as recorded in the string
/// table (e.g. `fcntl64@@GLIBC_2.28`). The symbol table is scanned entry by
/// entry, matching each `st_name` against the resolved string offset; the
/// first match is edited. Only the binding half of `st_info` changes, never
/// the type: anything other than a global or weak function is rejected.
pub fn weaken_symbol(
    data: &mut [u8],
    strtab: SectionRef,
    symtab: SectionRef,
    name: &str,
) -> Result<SymbolEdit> {
    let name_offset = match StrTab::new(strtab.bytes(data)).find(name) {
        Some(offset) => offset,
        None => {
            debug!(name, "symbol name not in string table");
            return Ok(SymbolEdit::NotFound);
        }
    };

    let count = symtab.size / Sym64::SIZE;
    for i in 0..count {
        let entry_offset = symtab.offset + i * Sym64::SIZE;
        let (sym, _) = Sym64::read_from_prefix(&data[entry_offset..])
            .map_err(|_| Error::truncated(entry_offset + Sym64::SIZE, data.len()))?;
        if sym.st_name as usize != name_offset {
            continue;
        }

        return match sym.st_info {
            SYM_WEAK_FUNC => Ok(SymbolEdit::AlreadyWeak),
            SYM_GLOBAL_FUNC => {
                data[entry_offset + Sym64::INFO_OFFSET] = SYM_WEAK_FUNC;
                Ok(SymbolEdit::Weakened)
            }
            st_info => Err(Error::UnexpectedSymbolKind {
                name: name.to_string(),
                st_info,
            }),
        };
    }

    Ok(SymbolEdit::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::image::ElfImage;
    use crate::patch::testimage::TestImage;
    use crate::patch::TARGET_SYMBOL;

    fn build_with_symbol(st_info: u8) -> Vec<u8> {
        let mut image = TestImage::default();
        image.symbols = vec![
            ("main".to_string(), SYM_GLOBAL_FUNC),
            (TARGET_SYMBOL.to_string(), st_info),
        ];
        image.build()
    }

    #[test]
    fn test_weakens_global_function() {
        let mut data = build_with_symbol(SYM_GLOBAL_FUNC);
        let before = data.clone();
        let image = ElfImage::parse(&data).unwrap();

        let edit = weaken_symbol(&mut data, image.strtab, image.symtab, TARGET_SYMBOL).unwrap();
        assert_eq!(edit, SymbolEdit::Weakened);

        // Exactly one byte changed, and it reads weak now.
        let diffs: Vec<usize> = (0..data.len()).filter(|&i| data[i] != before[i]).collect();
        assert_eq!(diffs.len(), 1);
        assert_eq!(data[diffs[0]], SYM_WEAK_FUNC);
        assert_eq!(before[diffs[0]], SYM_GLOBAL_FUNC);
    }

    #[test]
    fn test_accepts_already_weak() {
        let mut data = build_with_symbol(SYM_WEAK_FUNC);
        let before = data.clone();
        let image = ElfImage::parse(&data).unwrap();

        let edit = weaken_symbol(&mut data, image.strtab, image.symtab, TARGET_SYMBOL).unwrap();
        assert_eq!(edit, SymbolEdit::AlreadyWeak);
        assert_eq!(data, before);
    }

    #[test]
    fn test_rejects_other_kinds() {
        // 0x11 = STB_GLOBAL | STT_OBJECT
        let mut data = build_with_symbol(0x11);
        let image = ElfImage::parse(&data).unwrap();

        match weaken_symbol(&mut data, image.strtab, image.symtab, TARGET_SYMBOL) {
            Err(Error::UnexpectedSymbolKind { name, st_info }) => {
                assert_eq!(name, TARGET_SYMBOL);
                assert_eq!(st_info, 0x11);
            }
            other => panic!("expected UnexpectedSymbolKind, got {other:?}"),
        }
    }

    #[test]
    fn test_absent_symbol_is_noop() {
        let mut image = TestImage::default();
        image.symbols = vec![("main".to_string(), SYM_GLOBAL_FUNC)];
        let mut data = image.build();
        let before = data.clone();
        let parsed = ElfImage::parse(&data).unwrap();

        let edit = weaken_symbol(&mut data, parsed.strtab, parsed.symtab, TARGET_SYMBOL).unwrap();
        assert_eq!(edit, SymbolEdit::NotFound);
        assert_eq!(data, before);
    }

    #[test]
    fn test_other_symbols_untouched() {
        let mut data = build_with_symbol(SYM_GLOBAL_FUNC);
        let image = ElfImage::parse(&data).unwrap();
        weaken_symbol(&mut data, image.strtab, image.symtab, TARGET_SYMBOL).unwrap();

        // "main" keeps its global binding.
        let first = image.symtab.offset + Sym64::SIZE;
        let (main_sym, _) = Sym64::read_from_prefix(&data[first..]).unwrap();
        assert_eq!(main_sym.st_info, SYM_GLOBAL_FUNC);
    }
}
