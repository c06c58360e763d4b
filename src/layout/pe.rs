//! PE header walk built on the structure catalog.

use serde::Serialize;
use tracing::{debug, warn};

use super::directories::{self, ExportListing, ImportListing};
use super::read::ascii_or_invalid;
use super::{Bitness, ImageLayout};
use crate::buffer::Buffer;
use crate::error::{MzError, Result};
use crate::regions::{SectionInfo, StructureRef};
use crate::structures::{pe, DecodedStructure, FieldValue, StructureCatalog};

const MZ_SIGNATURE: u64 = 0x5A4D;
const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";
/// Raw section offsets are rounded down to this when FileAlignment is at least as large.
const FILE_ALIGNMENT_HARDCODED: u64 = 0x200;

pub const DIRECTORY_EXPORT: usize = 0;
pub const DIRECTORY_IMPORT: usize = 1;

/// One optional header data directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataDirectory {
    pub index: usize,
    /// Symbolic entry name, when the index is a known one
    pub name: Option<&'static str>,
    pub virtual_address: u32,
    pub size: u32,
}

impl DataDirectory {
    pub fn is_present(&self) -> bool {
        self.virtual_address != 0 && self.size != 0
    }
}

/// Headers, sections and structure occurrences of a PE image.
#[derive(Debug, Clone)]
pub struct PeLayout {
    bitness: Bitness,
    image_base: u64,
    dos_header: DecodedStructure,
    file_header: DecodedStructure,
    optional_header: DecodedStructure,
    data_directories: Vec<DataDirectory>,
    sections: Vec<SectionInfo>,
    structures: Vec<StructureRef>,
    warnings: Vec<String>,
}

fn truncated(what: &str, e: impl std::fmt::Display) -> MzError {
    MzError::InvalidFormat(format!("{}: {}", what, e))
}

fn field(s: &DecodedStructure, name: &str) -> Result<u64> {
    s.u64_of(name)
        .ok_or_else(|| MzError::InvalidFormat(format!("{}.{} missing", s.type_name, name)))
}

impl PeLayout {
    /// Walk the DOS, NT and section headers of `buf`.
    ///
    /// Fails with [`MzError::InvalidFormat`] when the signatures are missing
    /// or a required header is cut off, and with [`MzError::UnknownBitness`]
    /// for machine types other than i386 and AMD64.
    pub fn parse(buf: &Buffer, catalog: &StructureCatalog) -> Result<Self> {
        let data = buf.as_slice();

        let dos_header = catalog
            .decode_at(pe::IMAGE_DOS_HEADER, data, 0)
            .map_err(|e| truncated("DOS header", e))?;
        if field(&dos_header, "e_magic")? != MZ_SIGNATURE {
            return Err(MzError::InvalidFormat("missing MZ signature".to_string()));
        }

        let nt_offset = field(&dos_header, "e_lfanew")? as usize;
        if buf.get(nt_offset..nt_offset.saturating_add(4)) != Some(&PE_SIGNATURE[..]) {
            return Err(MzError::InvalidFormat(format!(
                "missing PE signature at {:#x}",
                nt_offset
            )));
        }

        let file_header_offset = nt_offset + 4;
        let file_header = catalog
            .decode_at(pe::IMAGE_FILE_HEADER, data, file_header_offset)
            .map_err(|e| truncated("file header", e))?;
        let machine = field(&file_header, "Machine")? as u16;
        let bitness = Bitness::from_machine(machine)?;

        let optional_header_offset = file_header_offset + 20;
        let optional_type = match bitness {
            Bitness::Bits32 => pe::IMAGE_OPTIONAL_HEADER32,
            Bitness::Bits64 => pe::IMAGE_OPTIONAL_HEADER64,
        };
        let optional_header = catalog
            .decode_at(optional_type, data, optional_header_offset)
            .map_err(|e| truncated("optional header", e))?;
        let image_base = field(&optional_header, "ImageBase")?;
        let file_alignment = field(&optional_header, "FileAlignment")?;

        let data_directories = read_data_directories(catalog, &optional_header);

        let section_table_offset =
            optional_header_offset + field(&file_header, "SizeOfOptionalHeader")? as usize;
        let section_count = field(&file_header, "NumberOfSections")? as usize;
        let header_size = catalog
            .size_of(pe::IMAGE_SECTION_HEADER)
            .ok_or_else(|| MzError::Catalog("IMAGE_SECTION_HEADER missing".to_string()))?;

        let mut structures = vec![
            StructureRef::new(0, pe::IMAGE_DOS_HEADER),
            StructureRef::new(file_header_offset as u64, pe::IMAGE_FILE_HEADER),
            StructureRef::new(optional_header_offset as u64, optional_type),
        ];

        let mut warnings = Vec::new();
        let mut sections = Vec::with_capacity(section_count);
        for i in 0..section_count {
            let offset = section_table_offset + i * header_size;
            let header = match catalog.decode_at(pe::IMAGE_SECTION_HEADER, data, offset) {
                Ok(h) => h,
                Err(e) => {
                    warn!(index = i, offset, error = %e, "section table is truncated");
                    warnings.push(format!(
                        "section table truncated after {} of {} entries",
                        i, section_count
                    ));
                    break;
                }
            };
            sections.push(section_info(&header, file_alignment)?);
            structures.push(StructureRef::new(offset as u64, pe::IMAGE_SECTION_HEADER));
        }

        let mut layout = Self {
            bitness,
            image_base,
            dos_header,
            file_header,
            optional_header,
            data_directories,
            sections,
            structures,
            warnings,
        };

        for (index, type_name) in [
            (DIRECTORY_EXPORT, pe::IMAGE_EXPORT_DIRECTORY),
            (DIRECTORY_IMPORT, pe::IMAGE_IMPORT_DESCRIPTOR),
        ] {
            let Some(dir) = layout.data_directory(index).filter(|d| d.is_present()) else {
                continue;
            };
            match layout.rva_to_offset(dir.virtual_address) {
                Some(offset) if offset < data.len() => {
                    layout
                        .structures
                        .push(StructureRef::new(offset as u64, type_name));
                }
                _ => {
                    let name = dir.name.unwrap_or("?");
                    warn!(
                        directory = name,
                        rva = dir.virtual_address,
                        "data directory does not map into the file"
                    );
                    layout.warnings.push(format!(
                        "{} at RVA {:#x} does not map into the file",
                        name, dir.virtual_address
                    ));
                }
            }
        }

        debug!(
            bits = layout.bitness.bits(),
            sections = layout.sections.len(),
            structures = layout.structures.len(),
            "parsed PE headers"
        );
        Ok(layout)
    }

    pub fn dos_header(&self) -> &DecodedStructure {
        &self.dos_header
    }

    pub fn file_header(&self) -> &DecodedStructure {
        &self.file_header
    }

    pub fn optional_header(&self) -> &DecodedStructure {
        &self.optional_header
    }

    /// Problems found while walking the headers.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn data_directories(&self) -> &[DataDirectory] {
        &self.data_directories
    }

    pub fn data_directory(&self, index: usize) -> Option<DataDirectory> {
        self.data_directories.get(index).copied()
    }

    /// Map an RVA to a file offset through the section table.
    ///
    /// RVAs below the first section map to the same offset in the headers.
    pub fn rva_to_offset(&self, rva: u32) -> Option<usize> {
        let rva = u64::from(rva);
        let hit = self.sections.iter().find(|s| {
            let size = s.virtual_size.max(s.raw_size);
            s.virtual_address <= rva && rva < s.virtual_address + size
        });
        match hit {
            Some(s) => usize::try_from(s.raw_offset + (rva - s.virtual_address)).ok(),
            None => {
                let first = self.sections.iter().map(|s| s.virtual_address).min();
                match first {
                    Some(va) if rva >= va => None,
                    _ => usize::try_from(rva).ok(),
                }
            }
        }
    }

    /// Imported DLLs and symbols, if the image has an import directory.
    pub fn imports(&self, buf: &Buffer) -> Option<ImportListing> {
        let dir = self
            .data_directory(DIRECTORY_IMPORT)
            .filter(|d| d.is_present())?;
        Some(directories::parse_imports(
            buf.as_slice(),
            self,
            dir.virtual_address,
        ))
    }

    /// Exported symbols, if the image has an export directory.
    pub fn exports(&self, buf: &Buffer) -> Option<ExportListing> {
        let dir = self
            .data_directory(DIRECTORY_EXPORT)
            .filter(|d| d.is_present())?;
        directories::parse_exports(buf.as_slice(), self, dir.virtual_address)
    }
}

impl ImageLayout for PeLayout {
    fn bitness(&self) -> Bitness {
        self.bitness
    }

    fn image_base(&self) -> u64 {
        self.image_base
    }

    fn sections(&self) -> &[SectionInfo] {
        &self.sections
    }

    fn structures(&self) -> &[StructureRef] {
        &self.structures
    }
}

fn read_data_directories(
    catalog: &StructureCatalog,
    optional_header: &DecodedStructure,
) -> Vec<DataDirectory> {
    let count = optional_header
        .u64_of("NumberOfRvaAndSizes")
        .unwrap_or(0)
        .min(pe::IMAGE_NUMBEROF_DIRECTORY_ENTRIES as u64) as usize;
    let names = catalog.enum_type(pe::IMAGE_DIRECTORY_ENTRY);

    optional_header
        .get("DataDirectory")
        .and_then(FieldValue::as_array)
        .unwrap_or_default()
        .iter()
        .take(count)
        .enumerate()
        .filter_map(|(index, entry)| {
            let entry = entry.as_struct()?;
            Some(DataDirectory {
                index,
                name: names.and_then(|e| e.name_of(index as u64)),
                virtual_address: entry.u64_of("VirtualAddress")? as u32,
                size: entry.u64_of("Size")? as u32,
            })
        })
        .collect()
}

fn section_info(header: &DecodedStructure, file_alignment: u64) -> Result<SectionInfo> {
    let name = header
        .get("Name")
        .and_then(FieldValue::as_bytes)
        .map(|raw| {
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            ascii_or_invalid(&raw[..end])
        })
        .unwrap_or_default();

    let pointer = field(header, "PointerToRawData")?;
    let raw_offset = if file_alignment < FILE_ALIGNMENT_HARDCODED {
        pointer
    } else {
        pointer / FILE_ALIGNMENT_HARDCODED * FILE_ALIGNMENT_HARDCODED
    };

    Ok(SectionInfo {
        name,
        raw_offset,
        raw_size: field(header, "SizeOfRawData")?,
        virtual_address: field(header, "VirtualAddress")?,
        virtual_size: field(header, "VirtualSize")?,
        characteristics: field(header, "Characteristics")? as u32,
    })
}
