//! Import and export directory listings.
//!
//! Malformed tables yield partial listings plus a warning; nothing here
//! fails the whole parse.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::pe::PeLayout;
use super::read::{ascii_or_invalid, ReadExt};
use super::ImageLayout;

/// Stop walking descriptors after this many DLLs.
pub const MAX_IMPORT_DLLS: usize = 1024;
/// Total imported symbols across all DLLs.
pub const MAX_IMPORTS: usize = 10_000;
pub const MAX_EXPORTS: usize = 10_000;

const IMPORT_DESCRIPTOR_SIZE: usize = 20;
const EXPORT_DIRECTORY_SIZE: usize = 40;
const MAX_NAME_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImportedSymbol {
    Name { name: String, hint: u16 },
    Ordinal(u16),
}

impl fmt::Display for ImportedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportedSymbol::Name { name, .. } => f.write_str(name),
            ImportedSymbol::Ordinal(ord) => write!(f, "#{}", ord),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedDll {
    pub name: String,
    pub symbols: Vec<ImportedSymbol>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportListing {
    pub dlls: Vec<ImportedDll>,
}

impl ImportListing {
    pub fn count(&self) -> usize {
        self.dlls.iter().map(|d| d.symbols.len()).sum()
    }

    /// Import hash: MD5 over the comma-joined `dll.symbol` entries in table order.
    ///
    /// DLL names lose a `.dll`, `.ocx` or `.sys` extension; ordinal imports
    /// appear as `ord<N>`; everything is lowercased.
    pub fn imphash(&self) -> String {
        let mut entries = Vec::with_capacity(self.count());
        for dll in &self.dlls {
            let lower = dll.name.to_ascii_lowercase();
            let lib = match lower.rsplit_once('.') {
                Some((stem, ext)) if matches!(ext, "dll" | "ocx" | "sys") => stem,
                _ => lower.as_str(),
            };
            for symbol in &dll.symbols {
                let func = match symbol {
                    ImportedSymbol::Name { name, .. } => name.to_ascii_lowercase(),
                    ImportedSymbol::Ordinal(ord) => format!("ord{}", ord),
                };
                entries.push(format!("{}.{}", lib, func));
            }
        }
        format!("{:032x}", md5::compute(entries.join(",").as_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedSymbol {
    pub name: Option<String>,
    pub ordinal: u32,
    pub rva: u32,
}

impl fmt::Display for ExportedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "#{}", self.ordinal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportListing {
    pub name: Option<String>,
    pub timestamp: u32,
    pub symbols: Vec<ExportedSymbol>,
}

pub(crate) fn parse_imports(data: &[u8], layout: &PeLayout, dir_rva: u32) -> ImportListing {
    let mut listing = ImportListing { dlls: Vec::new() };
    let Some(mut offset) = layout.rva_to_offset(dir_rva) else {
        warn!(rva = dir_rva, "import directory does not map into the file");
        return listing;
    };

    let mut total = 0;
    while listing.dlls.len() < MAX_IMPORT_DLLS && total < MAX_IMPORTS {
        let Some(desc) = data.get(offset..offset + IMPORT_DESCRIPTOR_SIZE) else {
            warn!(offset, "import descriptor table runs past end of file");
            break;
        };
        if desc.iter().all(|&b| b == 0) {
            break;
        }

        let original_first_thunk = desc.read_u32_le_at(0).unwrap_or(0);
        let name_rva = desc.read_u32_le_at(12).unwrap_or(0);
        let first_thunk = desc.read_u32_le_at(16).unwrap_or(0);
        offset += IMPORT_DESCRIPTOR_SIZE;

        if name_rva == 0 {
            continue;
        }
        let name = layout
            .rva_to_offset(name_rva)
            .and_then(|o| data.read_cstring_at(o, 256))
            .map(ascii_or_invalid)
            .unwrap_or_else(|| "(invalid)".to_string());

        let thunk_rva = if original_first_thunk != 0 {
            original_first_thunk
        } else {
            first_thunk
        };
        let symbols = parse_thunks(data, layout, thunk_rva, MAX_IMPORTS - total);
        total += symbols.len();
        listing.dlls.push(ImportedDll { name, symbols });
    }
    listing
}

fn parse_thunks(data: &[u8], layout: &PeLayout, thunk_rva: u32, max: usize) -> Vec<ImportedSymbol> {
    let mut symbols = Vec::new();
    if thunk_rva == 0 {
        return symbols;
    }
    let Some(mut offset) = layout.rva_to_offset(thunk_rva) else {
        warn!(rva = thunk_rva, "import thunks do not map into the file");
        return symbols;
    };

    let width = layout.bitness().pointer_size();
    let ordinal_flag = 1u64 << (width * 8 - 1);
    while symbols.len() < max {
        let value = if width == 8 {
            data.read_u64_le_at(offset)
        } else {
            data.read_u32_le_at(offset).map(u64::from)
        };
        let Some(value) = value else {
            warn!(offset, "import thunk table runs past end of file");
            break;
        };
        if value == 0 {
            break;
        }
        offset += width;

        if value & ordinal_flag != 0 {
            symbols.push(ImportedSymbol::Ordinal((value & 0xFFFF) as u16));
            continue;
        }

        let hint_rva = (value & 0x7FFF_FFFF) as u32;
        let entry = layout.rva_to_offset(hint_rva).and_then(|o| {
            let hint = data.read_u16_le_at(o)?;
            let name = data.read_cstring_at(o + 2, MAX_NAME_LEN)?;
            Some(ImportedSymbol::Name {
                name: ascii_or_invalid(name),
                hint,
            })
        });
        match entry {
            Some(symbol) => symbols.push(symbol),
            None => warn!(rva = hint_rva, "import name does not map into the file"),
        }
    }
    symbols
}

pub(crate) fn parse_exports(data: &[u8], layout: &PeLayout, dir_rva: u32) -> Option<ExportListing> {
    let Some(dir) = layout
        .rva_to_offset(dir_rva)
        .and_then(|o| data.get(o..o.checked_add(EXPORT_DIRECTORY_SIZE)?))
    else {
        warn!(rva = dir_rva, "export directory does not map into the file");
        return None;
    };

    let read = |at: usize| dir.read_u32_le_at(at).unwrap_or(0);
    let timestamp = read(4);
    let name_rva = read(12);
    let base = read(16);
    let function_count = (read(20) as usize).min(MAX_EXPORTS);
    let name_count = (read(24) as usize).min(MAX_EXPORTS);
    let functions_rva = read(28);
    let names_rva = read(32);
    let ordinals_rva = read(36);

    let cstring_at = |rva: u32| {
        layout
            .rva_to_offset(rva)
            .and_then(|o| data.read_cstring_at(o, MAX_NAME_LEN))
            .map(ascii_or_invalid)
    };

    let name = if name_rva != 0 { cstring_at(name_rva) } else { None };

    // ordinal index -> name
    let mut names: Vec<Option<String>> = vec![None; function_count];
    if let (Some(names_off), Some(ords_off)) =
        (layout.rva_to_offset(names_rva), layout.rva_to_offset(ordinals_rva))
    {
        for i in 0..name_count {
            let (Some(rva), Some(index)) = (
                data.read_u32_le_at(names_off + i * 4),
                data.read_u16_le_at(ords_off + i * 2),
            ) else {
                warn!(index = i, "export name table runs past end of file");
                break;
            };
            if let Some(slot) = names.get_mut(index as usize) {
                *slot = cstring_at(rva);
            }
        }
    }

    let mut symbols = Vec::new();
    if let Some(functions_off) = layout.rva_to_offset(functions_rva) {
        for (i, name) in names.into_iter().enumerate() {
            let Some(rva) = data.read_u32_le_at(functions_off + i * 4) else {
                warn!(index = i, "export address table runs past end of file");
                break;
            };
            if rva == 0 {
                continue;
            }
            symbols.push(ExportedSymbol {
                name,
                ordinal: base.wrapping_add(i as u32),
                rva,
            });
        }
    }

    Some(ExportListing {
        name,
        timestamp,
        symbols,
    })
}
