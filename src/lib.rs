//! Layout engine for MZ/PE images.
//!
//! Partitions a binary into sections and the segments between them,
//! attaches decoded header structures, extracts strings, and lays out hex
//! rows. [`Document`] ties the pieces together for a single file.

/// Immutable byte buffer and bounded file loading
pub mod buffer;
pub mod config;
pub mod document;
pub mod entropy;
pub mod error;
/// Hex row layout
pub mod hexview;
/// Format collaborators (PE header walk, import/export listings)
pub mod layout;
pub mod logging;
pub mod regions;
/// Field and structure rendering
pub mod render;
pub mod strings;
/// Structure catalog and decoder
pub mod structures;
pub mod view;

pub use buffer::Buffer;
pub use config::LayoutConfig;
pub use document::{Document, Report, SectionSummary};
pub use error::{DecodeError, MzError, Result};
pub use hexview::{HexRow, HexRows};
pub use layout::{Bitness, ImageLayout, PeLayout};
pub use regions::{compute_regions, Region, RegionKind, SectionInfo, SegmentKind, StructureRef};
pub use render::{render_structure, FieldRenderer, RenderedRow, RenderedStructure};
pub use strings::{extract_strings, ExtractedString, StringFlavor};
pub use structures::{DecodedStructure, FieldValue, StructureCatalog};
pub use view::{StructureViewState, ViewStateStore};
