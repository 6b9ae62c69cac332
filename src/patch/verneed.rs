//! Version requirement editing.
//!
//! The `.gnu.version_r` section is a two-level singly linked list embedded
//! directly in file bytes: one `Verneed` node per required library, each
//! owning a chain of `Vernaux` entries, one per required version string.
//! All "pointers" are byte offsets relative to the holding node, so editing
//! the list means moving byte ranges and rewriting neighboring offset
//! fields, never rewiring real pointers.

use tracing::debug;
use zerocopy::FromBytes;

use super::strtab::StrTab;
use crate::elf::image::SectionRef;
use crate::elf::structs::{Vernaux, Verneed};
use crate::error::{Error, Result};

/// Removes one (library, version) pair from the version requirement table.
///
/// Returns `Ok(true)` if an auxiliary entry was spliced out, `Ok(false)` if
/// the library or the version is not present (benign, keeps the operation
/// idempotent). When duplicates exist the last matching entry is removed.
/// Sibling requirement nodes and unrelated auxiliary entries are preserved
/// byte for byte.
pub fn remove_version_dependency(
    data: &mut [u8],
    dynstr: SectionRef,
    verneed: SectionRef,
    libname: &str,
    version: &str,
) -> Result<bool> {
    let strings = StrTab::new(dynstr.bytes(data));
    let (lib_offset, ver_offset) = match (strings.find(libname), strings.find(version)) {
        (Some(lib), Some(ver)) => (lib, ver),
        // A name missing from the string table cannot be referenced by any
        // record, so the dependency cannot be present.
        _ => return Ok(false),
    };

    let node_offset = match find_library_node(data, verneed, lib_offset)? {
        Some(offset) => offset,
        None => {
            debug!(libname, "no version requirement node");
            return Ok(false);
        }
    };

    let node = read_verneed(data, verneed, node_offset)?;
    let aux = collect_aux_entries(data, verneed, node_offset, node.vn_aux)?;

    let matched = aux
        .iter()
        .rposition(|(_, entry)| entry.vna_name as usize == ver_offset);
    let matched = match matched {
        Some(index) => index,
        None => {
            debug!(libname, version, "version not in requirement chain");
            return Ok(false);
        }
    };

    // The splice moves later entries backward by one slot, which is only
    // meaningful when the entries form a contiguous array. glibc's linker
    // always lays them out that way; refuse anything else rather than
    // corrupt the table.
    for window in aux.windows(2) {
        let (off_a, _) = window[0];
        let (off_b, _) = window[1];
        if off_b != off_a + Vernaux::SIZE {
            return Err(Error::VernauxNotContiguous {
                offset: verneed.offset + off_a,
            });
        }
    }

    let base = verneed.offset;
    let (last_offset, _) = aux[aux.len() - 1];
    let removed_at = aux[matched].0;
    let chain_end = base + last_offset + Vernaux::SIZE;

    if matched + 1 < aux.len() {
        // Overlapping move of every later entry down by one slot. The
        // shifted block carries the old terminal entry (vna_next = 0), so
        // the chain stays terminated.
        data.copy_within(base + removed_at + Vernaux::SIZE..chain_end, base + removed_at);
    } else if aux.len() >= 2 {
        // Removed the terminal entry: its predecessor becomes the new end
        // of the chain.
        let (prev_offset, _) = aux[matched - 1];
        crate::util::write_u32_le_at(data, base + prev_offset + Vernaux::NEXT_OFFSET, 0);
    } else {
        // The chain is now empty; drop the node's auxiliary offset so
        // nothing dangles.
        crate::util::write_u32_le_at(data, base + node_offset + Verneed::AUX_OFFSET, 0);
    }

    let cnt_at = base + node_offset + Verneed::CNT_OFFSET;
    let cnt = crate::util::read_u16_le_at(data, cnt_at);
    crate::util::write_u16_le_at(data, cnt_at, cnt.saturating_sub(1));

    Ok(true)
}

/// Lists every requirement node as (library name, version strings), for
/// read-only inspection.
pub fn list_requirements(
    data: &[u8],
    dynstr: SectionRef,
    verneed: SectionRef,
) -> Result<Vec<(String, Vec<String>)>> {
    let strings = StrTab::new(dynstr.bytes(data));
    let name_of = |offset: u32| -> String {
        strings
            .cstr_at(offset as usize)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .unwrap_or_else(|| format!("<bad offset {offset:#x}>"))
    };

    let mut out = Vec::new();
    for node_offset in node_offsets(data, verneed)? {
        let node = read_verneed(data, verneed, node_offset)?;
        let versions = collect_aux_entries(data, verneed, node_offset, node.vn_aux)?
            .into_iter()
            .map(|(_, entry)| name_of(entry.vna_name))
            .collect();
        out.push((name_of(node.vn_file), versions));
    }
    Ok(out)
}

/// Walks the sibling chain looking for the node whose `vn_file` matches the
/// resolved library name offset.
fn find_library_node(
    data: &[u8],
    verneed: SectionRef,
    lib_offset: usize,
) -> Result<Option<usize>> {
    for node_offset in node_offsets(data, verneed)? {
        let node = read_verneed(data, verneed, node_offset)?;
        if node.vn_file as usize == lib_offset {
            return Ok(Some(node_offset));
        }
    }
    Ok(None)
}

/// Collects the section-relative offsets of every sibling node.
fn node_offsets(data: &[u8], verneed: SectionRef) -> Result<Vec<usize>> {
    let mut offsets = Vec::new();
    // An empty section has no nodes; only a non-empty one that ends
    // mid-chain is malformed.
    if verneed.size == 0 {
        return Ok(offsets);
    }
    let mut offset = 0usize;
    // A well-formed chain cannot hold more nodes than fit in the section.
    let max_nodes = verneed.size / Verneed::SIZE + 1;

    loop {
        let node = read_verneed(data, verneed, offset)?;
        offsets.push(offset);
        if node.vn_next == 0 {
            return Ok(offsets);
        }
        offset = offset
            .checked_add(node.vn_next as usize)
            .ok_or(Error::VerneedChainOutOfBounds { offset })?;
        if offsets.len() >= max_nodes {
            return Err(Error::VerneedChainOutOfBounds { offset });
        }
    }
}

/// Collects (section-relative offset, entry) for every auxiliary entry of a
/// node, in chain order.
fn collect_aux_entries(
    data: &[u8],
    verneed: SectionRef,
    node_offset: usize,
    vn_aux: u32,
) -> Result<Vec<(usize, Vernaux)>> {
    let mut entries = Vec::new();
    if vn_aux == 0 {
        return Ok(entries);
    }

    let mut offset = node_offset
        .checked_add(vn_aux as usize)
        .ok_or(Error::VerneedChainOutOfBounds {
            offset: node_offset,
        })?;
    let max_entries = verneed.size / Vernaux::SIZE + 1;

    loop {
        let entry = read_vernaux(data, verneed, offset)?;
        let next = entry.vna_next;
        entries.push((offset, entry));
        if next == 0 {
            return Ok(entries);
        }
        offset = offset
            .checked_add(next as usize)
            .ok_or(Error::VerneedChainOutOfBounds { offset })?;
        if entries.len() >= max_entries {
            return Err(Error::VerneedChainOutOfBounds { offset });
        }
    }
}

fn read_verneed(data: &[u8], verneed: SectionRef, offset: usize) -> Result<Verneed> {
    if !verneed.contains(offset, Verneed::SIZE) {
        return Err(Error::VerneedChainOutOfBounds { offset });
    }
    let absolute = verneed.offset + offset;
    let (node, _) = Verneed::read_from_prefix(&data[absolute..])
        .map_err(|_| Error::VerneedChainOutOfBounds { offset })?;
    Ok(node)
}

fn read_vernaux(data: &[u8], verneed: SectionRef, offset: usize) -> Result<Vernaux> {
    if !verneed.contains(offset, Vernaux::SIZE) {
        return Err(Error::VerneedChainOutOfBounds { offset });
    }
    let absolute = verneed.offset + offset;
    let (entry, _) = Vernaux::read_from_prefix(&data[absolute..])
        .map_err(|_| Error::VerneedChainOutOfBounds { offset })?;
    Ok(entry)
}
