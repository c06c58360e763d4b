//! Field rendering.
//!
//! A [`FieldRenderer`] resolves the display string of a decoded field:
//! first an exact `"TYPE.field"` registry match, then the default
//! conversion for its kind (hex for integers, the member name for enums).
//! A registry entry may also [`Rendered::Suppress`] a field, hiding it
//! from the structure view entirely.

pub mod flags;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use serde::Serialize;
use tracing::warn;

use crate::regions::StructureRef;
use crate::structures::{pe, DecodedStructure, FieldValue, StructureCatalog};
use crate::view::StructureViewState;

use flags::FlagTable;

/// Result of a custom field renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    /// Hide the field
    Suppress,
}

/// A custom renderer for one field.
pub type RenderFn = Arc<dyn Fn(&FieldValue) -> Rendered + Send + Sync>;

/// Registry of custom renderers and per-type key fields.
#[derive(Clone, Default)]
pub struct FieldRenderer {
    renderers: HashMap<String, RenderFn>,
    key_fields: HashMap<String, HashSet<String>>,
}

impl fmt::Debug for FieldRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.renderers.keys().collect();
        keys.sort();
        f.debug_struct("FieldRenderer")
            .field("renderers", &keys)
            .field("key_fields", &self.key_fields)
            .finish()
    }
}

fn registry_key(type_name: &str, field: &str) -> String {
    format!("{}.{}", type_name, field)
}

impl FieldRenderer {
    /// An empty registry: every field takes the default conversion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderers and key fields for the built-in PE catalog.
    pub fn builtin() -> Self {
        let mut r = Self::new();

        r.register(pe::IMAGE_FILE_HEADER, "TimeDateStamp", render_timestamp);
        r.register(pe::IMAGE_FILE_HEADER, "Characteristics", |v| {
            render_flags(flags::FILE_CHARACTERISTICS, v)
        });
        for opt in [pe::IMAGE_OPTIONAL_HEADER32, pe::IMAGE_OPTIONAL_HEADER64] {
            r.register(opt, "DllCharacteristics", |v| {
                render_flags(flags::DLL_CHARACTERISTICS, v)
            });
            r.register(opt, "CheckSum", |v| match v.as_u64() {
                Some(n) => Rendered::Text(hex32(n)),
                None => Rendered::Text(default_render(v)),
            });
            // listed per entry elsewhere
            r.suppress(opt, "DataDirectory");
        }
        r.register(pe::IMAGE_SECTION_HEADER, "Characteristics", |v| {
            render_flags(flags::SECTION_CHARACTERISTICS, v)
        });
        r.register(pe::IMAGE_EXPORT_DIRECTORY, "TimeDateStamp", render_timestamp);
        r.register(pe::IMAGE_IMPORT_DESCRIPTOR, "TimeDateStamp", render_timestamp);

        r.set_key_fields(
            pe::IMAGE_FILE_HEADER,
            ["Machine", "TimeDateStamp", "Characteristics"],
        );
        for opt in [pe::IMAGE_OPTIONAL_HEADER32, pe::IMAGE_OPTIONAL_HEADER64] {
            r.set_key_fields(opt, ["ImageBase", "Subsystem", "CheckSum", "DllCharacteristics"]);
        }
        r.set_key_fields(pe::IMAGE_DATA_DIRECTORY, ["VirtualAddress", "Size"]);
        r.set_key_fields(
            pe::IMAGE_SECTION_HEADER,
            ["Name", "VirtualAddress", "SizeOfRawData", "PointerToRawData"],
        );
        r.set_key_fields(
            pe::IMAGE_EXPORT_DIRECTORY,
            ["Name", "NumberOfFunctions", "NumberOfNames"],
        );
        r.set_key_fields(pe::IMAGE_IMPORT_DESCRIPTOR, ["Name", "FirstThunk"]);

        r
    }

    /// Register a custom renderer for `type_name.field`, replacing any previous one.
    pub fn register<F>(&mut self, type_name: &str, field: &str, f: F)
    where
        F: Fn(&FieldValue) -> Rendered + Send + Sync + 'static,
    {
        self.renderers
            .insert(registry_key(type_name, field), Arc::new(f));
    }

    /// Hide `type_name.field` from structure views.
    pub fn suppress(&mut self, type_name: &str, field: &str) {
        self.register(type_name, field, |_| Rendered::Suppress);
    }

    pub fn set_key_fields<I, S>(&mut self, type_name: &str, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields.insert(
            type_name.to_string(),
            fields.into_iter().map(Into::into).collect(),
        );
    }

    pub fn key_fields(&self, type_name: &str) -> Option<&HashSet<String>> {
        self.key_fields.get(type_name)
    }

    pub fn is_key_field(&self, type_name: &str, field: &str) -> bool {
        self.key_fields
            .get(type_name)
            .is_some_and(|set| set.contains(field))
    }

    pub fn has_renderer(&self, type_name: &str, field: &str) -> bool {
        self.renderers.contains_key(&registry_key(type_name, field))
    }

    /// Resolve the display form of one field.
    pub fn render_value(&self, type_name: &str, field: &str, value: &FieldValue) -> Rendered {
        match self.renderers.get(&registry_key(type_name, field)) {
            Some(f) => f(value),
            None => Rendered::Text(default_render(value)),
        }
    }
}

/// Default conversion for a value with no custom renderer.
pub fn default_render(value: &FieldValue) -> String {
    match value {
        FieldValue::Uint(v) => format!("{:#x}", v),
        FieldValue::Enum {
            name: Some(name), ..
        } => name.to_string(),
        FieldValue::Enum { value, name: None } => format!("{:#x}", value),
        FieldValue::Bytes(bytes) => {
            let escaped: String = bytes
                .iter()
                .flat_map(|&b| std::ascii::escape_default(b))
                .map(char::from)
                .collect();
            format!("b\"{}\"", escaped)
        }
        FieldValue::Array(items) => {
            let inner: Vec<String> = items.iter().map(default_render).collect();
            format!("[{}]", inner.join(", "))
        }
        FieldValue::Struct(s) => render_inline(s),
    }
}

fn render_inline(s: &DecodedStructure) -> String {
    let inner: Vec<String> = s
        .fields
        .iter()
        .map(|f| format!("{}={}", f.name, default_render(&f.value)))
        .collect();
    format!("{}({})", s.type_name, inner.join(", "))
}

/// Epoch seconds as ISO-8601 UTC, or `(invalid)` out of range.
pub fn timestamp(v: u64) -> String {
    i64::try_from(v)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| "(invalid)".to_string())
}

/// Names of the flags set in `v`, in table order, one per line.
pub fn bitflags(table: FlagTable, v: u64) -> String {
    if v == 0 {
        return "(empty)".to_string();
    }
    table
        .iter()
        .filter(|(_, bit)| v & bit == *bit)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(" |\n")
}

/// Eight hex digits, no prefix.
pub fn hex32(v: u64) -> String {
    format!("{:08x}", v)
}

fn render_timestamp(v: &FieldValue) -> Rendered {
    match v.as_u64() {
        Some(n) => Rendered::Text(timestamp(n)),
        None => Rendered::Text(default_render(v)),
    }
}

fn render_flags(table: FlagTable, v: &FieldValue) -> Rendered {
    match v.as_u64() {
        Some(n) => Rendered::Text(bitflags(table, n)),
        None => Rendered::Text(default_render(v)),
    }
}

/// One row of a rendered structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RenderedRow {
    Field {
        name: &'static str,
        value: String,
        offset: usize,
    },
    /// Stands in for the fields hidden while minimized
    Ellipsis,
    /// The structure runs past the end of the buffer
    Truncated,
}

/// A structure occurrence ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedStructure {
    pub type_name: &'static str,
    pub address: u64,
    pub rows: Vec<RenderedRow>,
    pub truncated: bool,
}

impl RenderedStructure {
    /// `(name, value, offset)` of every visible field.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str, usize)> + '_ {
        self.rows.iter().filter_map(|row| match row {
            RenderedRow::Field {
                name,
                value,
                offset,
            } => Some((*name, value.as_str(), *offset)),
            _ => None,
        })
    }

    pub fn has_ellipsis(&self) -> bool {
        self.rows.iter().any(|r| matches!(r, RenderedRow::Ellipsis))
    }
}

impl fmt::Display for RenderedStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "struct {} @ {:08x}:", self.type_name, self.address)?;

        let width = self
            .rows
            .iter()
            .map(|row| match row {
                RenderedRow::Field { name, .. } => name.len(),
                _ => 3,
            })
            .max()
            .unwrap_or(0);

        for row in &self.rows {
            match row {
                RenderedRow::Field {
                    name,
                    value,
                    offset,
                } => {
                    let indent = " ".repeat(2 + width + 3);
                    let value = value.replace('\n', &format!("\n{}", indent));
                    writeln!(f, "  {:<width$} = {} @ +{:#x}", name, value, offset)?;
                }
                RenderedRow::Ellipsis => writeln!(f, "  {:<width$}   ...", "...")?,
                RenderedRow::Truncated => writeln!(f, "  (truncated)")?,
            }
        }
        Ok(())
    }
}

/// Decode and render one structure occurrence.
///
/// A decode failure becomes a single [`RenderedRow::Truncated`] row so one
/// malformed structure never prevents rendering the rest of the file.
pub fn render_structure(
    catalog: &StructureCatalog,
    renderer: &FieldRenderer,
    state: StructureViewState,
    data: &[u8],
    sref: &StructureRef,
) -> RenderedStructure {
    let address = sref.address;
    // An address beyond usize cannot be in the buffer; decode_at clamps it.
    let offset = usize::try_from(address).unwrap_or(usize::MAX);

    let structure = match catalog.decode_at(sref.type_name, data, offset) {
        Ok(s) => s,
        Err(e) => {
            warn!(type_name = sref.type_name, address, error = %e, "structure not decodable");
            return RenderedStructure {
                type_name: sref.type_name,
                address,
                rows: vec![RenderedRow::Truncated],
                truncated: true,
            };
        }
    };

    let mut rows = Vec::with_capacity(structure.fields.len() + 1);
    let mut has_hidden = false;
    for field in &structure.fields {
        if state.is_minimized && !renderer.is_key_field(structure.type_name, field.name) {
            has_hidden = true;
            continue;
        }
        match renderer.render_value(structure.type_name, field.name, &field.value) {
            Rendered::Text(value) => rows.push(RenderedRow::Field {
                name: field.name,
                value,
                offset: field.offset,
            }),
            Rendered::Suppress => {}
        }
    }
    if state.is_minimized && has_hidden {
        rows.push(RenderedRow::Ellipsis);
    }

    RenderedStructure {
        type_name: structure.type_name,
        address,
        rows,
        truncated: false,
    }
}
