//! Format collaborators: the source of sections and structure occurrences.
//!
//! The region computation only needs an [`ImageLayout`]. [`PeLayout`]
//! provides one for PE images by decoding the headers through the
//! structure catalog.

pub mod directories;
pub mod pe;
mod read;

pub use directories::{ExportListing, ExportedSymbol, ImportListing, ImportedDll, ImportedSymbol};
pub use pe::{DataDirectory, PeLayout};

use serde::Serialize;

use crate::error::{MzError, Result};
use crate::regions::{SectionInfo, StructureRef};

pub const IMAGE_FILE_MACHINE_I386: u16 = 0x14c;
pub const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;

/// Pointer width of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    /// Derive bitness from a COFF machine type.
    pub fn from_machine(machine: u16) -> Result<Self> {
        match machine {
            IMAGE_FILE_MACHINE_I386 => Ok(Bitness::Bits32),
            IMAGE_FILE_MACHINE_AMD64 => Ok(Bitness::Bits64),
            other => Err(MzError::UnknownBitness(other)),
        }
    }

    pub fn bits(&self) -> u32 {
        match self {
            Bitness::Bits32 => 32,
            Bitness::Bits64 => 64,
        }
    }

    /// Size of one import thunk.
    pub fn pointer_size(&self) -> usize {
        match self {
            Bitness::Bits32 => 4,
            Bitness::Bits64 => 8,
        }
    }
}

/// What the region computation consumes from a format parser.
pub trait ImageLayout {
    fn bitness(&self) -> Bitness;

    /// Preferred load address; section virtual addresses are relative to it
    fn image_base(&self) -> u64;

    /// Sections in table order
    fn sections(&self) -> &[SectionInfo];

    /// Structure occurrences, all within the buffer
    fn structures(&self) -> &[StructureRef];
}
