//! Loading context for one binary.
//!
//! A [`Document`] owns the [`Buffer`], the parsed [`PeLayout`], the computed
//! region partition and the string list. Everything a viewer needs is
//! answered from it without re-reading the file.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, info_span, warn};

use crate::buffer::Buffer;
use crate::config::LayoutConfig;
use crate::entropy::trimmed_entropy;
use crate::error::Result;
use crate::hexview::{self, HexRows};
use crate::layout::{ExportListing, ImageLayout, ImportListing, PeLayout};
use crate::regions::{compute_regions, Region, StructureRef};
use crate::render::{self, flags, FieldRenderer, RenderedStructure};
use crate::strings::{extract_strings, strings_in_range, ExtractedString};
use crate::structures::{pe, StructureCatalog};
use crate::view::ViewStateStore;

/// Name used for buffers that did not come from a file.
pub const MEMORY_NAME: &str = "[memory]";

/// Presentation summary of a section region.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSummary {
    /// Image base plus the section RVA
    pub virtual_address: u64,
    pub virtual_size: u64,
    /// Entropy of the raw data without trailing zero padding
    pub entropy: f64,
    /// Characteristics flag names joined by `" |\n"`
    pub characteristics: String,
}

#[derive(Debug)]
pub struct Document {
    name: String,
    buffer: Buffer,
    config: LayoutConfig,
    catalog: &'static StructureCatalog,
    renderer: FieldRenderer,
    layout: PeLayout,
    regions: Vec<Region>,
    strings: Vec<ExtractedString>,
}

impl Document {
    /// Parse `buffer`, partition it into regions and extract its strings.
    pub fn from_buffer(buffer: Buffer, config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        let span = info_span!("load", size_bytes = buffer.len());
        let _guard = span.enter();
        let catalog = StructureCatalog::builtin();

        let layout = PeLayout::parse(&buffer, catalog)?;
        let regions = compute_regions(buffer.as_slice(), layout.sections(), layout.structures())?;
        let strings = extract_strings(buffer.as_slice(), &config.strings);

        debug!(
            size = buffer.len(),
            regions = regions.len(),
            strings = strings.len(),
            "document loaded"
        );

        Ok(Self {
            name: MEMORY_NAME.to_string(),
            buffer,
            config,
            catalog,
            renderer: FieldRenderer::builtin(),
            layout,
            regions,
            strings,
        })
    }

    /// Load the file at `path`, bounded by `config.io.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, config: LayoutConfig) -> Result<Self> {
        let path = path.as_ref();
        let buffer = Buffer::open(path, &config.io)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| MEMORY_NAME.to_string());
        let doc = Self::from_buffer(buffer, config)?.with_name(name);
        info!(name = %doc.name, size = doc.buffer.len(), "opened document");
        Ok(doc)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the field renderer used for structure output.
    pub fn with_renderer(mut self, renderer: FieldRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn catalog(&self) -> &'static StructureCatalog {
        self.catalog
    }

    pub fn renderer(&self) -> &FieldRenderer {
        &self.renderer
    }

    pub fn layout(&self) -> &PeLayout {
        &self.layout
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn strings(&self) -> &[ExtractedString] {
        &self.strings
    }

    /// Every structure occurrence across all regions.
    pub fn structures(&self) -> impl Iterator<Item = &StructureRef> + '_ {
        self.regions.iter().flat_map(|r| r.children.iter())
    }

    pub fn strings_in(&self, address: u64, length: u64) -> &[ExtractedString] {
        strings_in_range(&self.strings, address, length)
    }

    /// Hex rows for a range, using the configured row length.
    ///
    /// `length` is clamped to the end of the buffer; an `address` past the
    /// end is an error.
    pub fn hex_rows(&self, address: u64, length: u64) -> Result<HexRows<'_>> {
        let data = self.buffer.as_slice();
        let address = usize::try_from(address).unwrap_or(usize::MAX);
        let available = data.len().saturating_sub(address);
        let length = usize::try_from(length).unwrap_or(usize::MAX).min(available);
        hexview::render(data, address, length, self.config.hex.row_length)
    }

    pub fn render_structure(&self, sref: &StructureRef, states: &ViewStateStore) -> RenderedStructure {
        render::render_structure(
            self.catalog,
            &self.renderer,
            states.get(sref),
            self.buffer.as_slice(),
            sref,
        )
    }

    /// Regions to display: all of them unless zero-filled segments are hidden.
    pub fn visible_regions(&self) -> impl Iterator<Item = &Region> + '_ {
        let hide = self.config.regions.hide_zero_segments;
        self.regions.iter().filter(move |r| !(hide && r.suppressible))
    }

    /// `None` for segments.
    pub fn section_summary(&self, region: &Region) -> Option<SectionSummary> {
        let section = region.section()?;
        let start = usize::try_from(region.address).ok()?;
        let end = usize::try_from(region.end()).ok()?;
        let data = self.buffer.get(start..end).unwrap_or_default();
        Some(SectionSummary {
            virtual_address: self.layout.image_base().wrapping_add(section.virtual_address),
            virtual_size: section.virtual_size,
            entropy: trimmed_entropy(data),
            characteristics: render::bitflags(
                flags::SECTION_CHARACTERISTICS,
                u64::from(section.characteristics),
            ),
        })
    }

    pub fn imports(&self) -> Option<ImportListing> {
        self.layout.imports(&self.buffer)
    }

    pub fn exports(&self) -> Option<ExportListing> {
        self.layout.exports(&self.buffer)
    }

    /// Navigation listing: one line per visible region, children indented.
    pub fn outline(&self) -> Vec<String> {
        let mut lines = vec!["metadata".to_string()];
        for region in self.visible_regions() {
            lines.push(format!("{} {}", region.name(), region.kind_label()));
            for child in &region.children {
                lines.push(format!("  {}", outline_label(child.type_name)));
            }
        }
        lines
    }

    /// Plain-text rendering of the whole file.
    pub fn report(&self, states: &ViewStateStore) -> String {
        self.display_report(states).to_string()
    }

    /// [`fmt::Display`] adapter over [`Document::write_report`].
    pub fn display_report<'a>(&'a self, states: &'a ViewStateStore) -> Report<'a> {
        Report { doc: self, states }
    }

    pub fn write_report<W: fmt::Write + ?Sized>(
        &self,
        out: &mut W,
        states: &ViewStateStore,
    ) -> fmt::Result {
        self.write_metadata(out)?;

        for region in self.visible_regions() {
            writeln!(out)?;
            writeln!(
                out,
                "{} {} @ {:08x}-{:08x}:",
                region.name(),
                region.kind_label(),
                region.address,
                region.end()
            )?;

            if let Some(summary) = self.section_summary(region) {
                write_summary(out, &summary)?;
            }

            for sref in &region.children {
                let rendered = self.render_structure(sref, states);
                push_indented(out, &rendered.to_string(), "  ")?;
                match sref.type_name {
                    pe::IMAGE_IMPORT_DESCRIPTOR => {
                        if let Some(imports) = self.imports() {
                            push_indented(out, &ImportView(&imports).to_string(), "  ")?;
                        }
                    }
                    pe::IMAGE_EXPORT_DIRECTORY => {
                        if let Some(exports) = self.exports() {
                            push_indented(out, &ExportView(&exports).to_string(), "  ")?;
                        }
                    }
                    _ => {}
                }
            }

            writeln!(out, "  strings:")?;
            let strings = self.strings_in(region.address, region.length);
            if strings.is_empty() {
                writeln!(out, "    (none)")?;
            }
            for s in strings {
                writeln!(out, "    {:08x}: {}: {}", s.offset, s.flavor.label(), s.text)?;
            }

            writeln!(out, "  hex:")?;
            // Regions are clamped to the buffer, so every region range is valid.
            let rows = self.hex_rows(region.address, region.length);
            debug_assert!(rows.is_ok(), "region {} outside the buffer", region.name());
            match rows {
                Ok(rows) => {
                    for row in rows {
                        writeln!(out, "    {}", row)?;
                    }
                }
                Err(err) => warn!(%err, region = region.name(), "no hex rows for region"),
            }
        }
        Ok(())
    }

    fn write_metadata<W: fmt::Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "metadata:")?;
        writeln!(out, "  name: {}", self.name)?;
        writeln!(out, "  size: {:#x}", self.buffer.len())?;
        let warnings = self.layout.warnings();
        if !warnings.is_empty() {
            writeln!(out, "  warnings:")?;
            for w in warnings {
                writeln!(out, "    - {}", w)?;
            }
        }
        Ok(())
    }
}

/// Report of a [`Document`] under a set of view states.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    doc: &'a Document,
    states: &'a ViewStateStore,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.doc.write_report(f, self.states)
    }
}

fn outline_label(type_name: &str) -> String {
    match type_name {
        pe::IMAGE_IMPORT_DESCRIPTOR => "import table".to_string(),
        pe::IMAGE_EXPORT_DIRECTORY => "export table".to_string(),
        other => other.strip_prefix("IMAGE_").unwrap_or(other).to_string(),
    }
}

fn write_summary<W: fmt::Write + ?Sized>(out: &mut W, summary: &SectionSummary) -> fmt::Result {
    writeln!(out, "  virtual address: {:08x}", summary.virtual_address)?;
    writeln!(out, "  virtual size: {:#x}", summary.virtual_size)?;
    writeln!(out, "  entropy: {:.2}", summary.entropy)?;
    let label = "  characteristics: ";
    let value = summary
        .characteristics
        .replace('\n', &format!("\n{}", " ".repeat(label.len())));
    writeln!(out, "{}{}", label, value)
}

/// Import directory listing as a text block.
pub struct ImportView<'a>(pub &'a ImportListing);

impl fmt::Display for ImportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "import directory table:")?;
        writeln!(f, "  imphash: {}", self.0.imphash())?;
        for dll in &self.0.dlls {
            writeln!(f, "  {}:", dll.name)?;
            for symbol in &dll.symbols {
                writeln!(f, "    {}", symbol)?;
            }
        }
        Ok(())
    }
}

pub struct ExportView<'a>(pub &'a ExportListing);

impl fmt::Display for ExportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exports = self.0;
        writeln!(f, "export directory table:")?;
        writeln!(f, "  name:      {}", exports.name.as_deref().unwrap_or("(none)"))?;
        writeln!(
            f,
            "  timestamp: {}",
            render::timestamp(u64::from(exports.timestamp))
        )?;
        writeln!(f, "  symbols:")?;
        if exports.symbols.is_empty() {
            writeln!(f, "    (empty)")?;
        }
        for symbol in &exports.symbols {
            writeln!(f, "    {}", symbol)?;
        }
        Ok(())
    }
}

/// Text block for an import listing.
pub fn import_view(imports: &ImportListing) -> String {
    ImportView(imports).to_string()
}

/// Text block for an export listing.
pub fn export_view(exports: &ExportListing) -> String {
    ExportView(exports).to_string()
}

fn push_indented<W: fmt::Write + ?Sized>(out: &mut W, text: &str, prefix: &str) -> fmt::Result {
    for line in text.lines() {
        if line.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, "{}{}", prefix, line)?;
        }
    }
    Ok(())
}
