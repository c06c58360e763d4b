//! Structure catalog: a versioned, data-driven schema of fixed-layout
//! records and a generic little-endian decoder over it.
//!
//! The catalog is validated once when it is built. A definition defect
//! (overlapping fields, dangling type references) is a bug in the static
//! tables and is reported as [`MzError::Catalog`]; the built-in catalog
//! panics on such a defect the first time it is touched.

pub mod pe;
pub mod schema;
mod value;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::trace;

pub use schema::{EnumType, FieldDescriptor, FieldKind, StructureType};
pub use value::{DecodedField, DecodedStructure, FieldValue};

use crate::error::{DecodeError, MzError, Result};

/// Version of the built-in PE tables.
pub const CATALOG_VERSION: u32 = 1;

static BUILTIN: Lazy<StructureCatalog> = Lazy::new(|| {
    StructureCatalog::new(CATALOG_VERSION, pe::TYPES, pe::ENUMS)
        .expect("built-in structure catalog is well-formed")
});

/// A validated set of record types and enumerations.
#[derive(Debug, Clone)]
pub struct StructureCatalog {
    version: u32,
    types: HashMap<&'static str, &'static StructureType>,
    enums: HashMap<&'static str, &'static EnumType>,
    order: Vec<&'static str>,
}

impl StructureCatalog {
    /// The built-in PE catalog.
    pub fn builtin() -> &'static StructureCatalog {
        &BUILTIN
    }

    /// Validate and index the given tables.
    ///
    /// A type may only nest types declared before it.
    pub fn new(
        version: u32,
        types: &'static [StructureType],
        enums: &'static [EnumType],
    ) -> Result<Self> {
        let mut catalog = Self {
            version,
            types: HashMap::with_capacity(types.len()),
            enums: HashMap::with_capacity(enums.len()),
            order: Vec::with_capacity(types.len()),
        };

        for e in enums {
            if !matches!(e.width, 1 | 2 | 4 | 8) {
                return Err(catalog_error(format!(
                    "enum {} has unsupported width {}",
                    e.name, e.width
                )));
            }
            if catalog.enums.insert(e.name, e).is_some() {
                return Err(catalog_error(format!("duplicate enum {}", e.name)));
            }
        }

        for t in types {
            catalog.check_type(t)?;
            if catalog.types.insert(t.name, t).is_some() {
                return Err(catalog_error(format!("duplicate type {}", t.name)));
            }
            catalog.order.push(t.name);
        }

        Ok(catalog)
    }

    fn check_type(&self, t: &StructureType) -> Result<()> {
        let mut fields: Vec<&FieldDescriptor> = t.fields.iter().collect();

        for (i, f) in t.fields.iter().enumerate() {
            if t.fields[..i].iter().any(|g| g.name == f.name) {
                return Err(catalog_error(format!("{}.{} declared twice", t.name, f.name)));
            }
            if f.count == 0 || f.size == 0 || f.size % f.count != 0 {
                return Err(catalog_error(format!(
                    "{}.{}: size {} is not a positive multiple of count {}",
                    t.name, f.name, f.size, f.count
                )));
            }
            if f.end() > t.size {
                return Err(catalog_error(format!(
                    "{}.{} ends at {} beyond declared size {}",
                    t.name,
                    f.name,
                    f.end(),
                    t.size
                )));
            }
            match f.kind {
                FieldKind::Uint => check_width(t, f)?,
                FieldKind::Enum(enum_name) => {
                    check_width(t, f)?;
                    if !self.enums.contains_key(enum_name) {
                        return Err(catalog_error(format!(
                            "{}.{} references unknown enum {}",
                            t.name, f.name, enum_name
                        )));
                    }
                }
                FieldKind::Bytes => {}
                FieldKind::Nested(type_name) => {
                    let nested = self.types.get(type_name).ok_or_else(|| {
                        catalog_error(format!(
                            "{}.{} references undeclared type {}",
                            t.name, f.name, type_name
                        ))
                    })?;
                    if nested.size != f.element_size() {
                        return Err(catalog_error(format!(
                            "{}.{}: element size {} does not match {} size {}",
                            t.name,
                            f.name,
                            f.element_size(),
                            type_name,
                            nested.size
                        )));
                    }
                }
            }
        }

        fields.sort_by_key(|f| f.offset);
        for pair in fields.windows(2) {
            if pair[0].end() > pair[1].offset {
                return Err(catalog_error(format!(
                    "{}.{} overlaps {}.{}",
                    t.name, pair[0].name, t.name, pair[1].name
                )));
            }
        }
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn get(&self, type_name: &str) -> Option<&'static StructureType> {
        self.types.get(type_name).copied()
    }

    pub fn enum_type(&self, name: &str) -> Option<&'static EnumType> {
        self.enums.get(name).copied()
    }

    /// Declared size of a type.
    pub fn size_of(&self, type_name: &str) -> Option<usize> {
        self.get(type_name).map(|t| t.size)
    }

    /// Type names in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }

    /// Decode `raw` as `type_name`.
    ///
    /// Bytes past the declared size are ignored. A shorter input fails with
    /// [`DecodeError::Truncated`] naming the first field that does not fit.
    pub fn decode(
        &self,
        type_name: &str,
        raw: &[u8],
    ) -> std::result::Result<DecodedStructure, DecodeError> {
        let t = self
            .get(type_name)
            .ok_or_else(|| DecodeError::UnknownType(type_name.to_string()))?;

        if raw.len() < t.size {
            let field = t
                .fields
                .iter()
                .find(|f| f.end() > raw.len())
                .map(|f| f.name)
                .unwrap_or(t.name);
            trace!(type_name = t.name, field, available = raw.len(), "truncated structure");
            return Err(DecodeError::Truncated {
                type_name: t.name.to_string(),
                field: field.to_string(),
                needed: t.size,
                available: raw.len(),
            });
        }

        Ok(self.decode_type(t, raw))
    }

    /// Decode the occurrence of `type_name` at `address` within `data`.
    pub fn decode_at(
        &self,
        type_name: &str,
        data: &[u8],
        address: usize,
    ) -> std::result::Result<DecodedStructure, DecodeError> {
        let size = self
            .size_of(type_name)
            .ok_or_else(|| DecodeError::UnknownType(type_name.to_string()))?;
        let start = address.min(data.len());
        let end = address.saturating_add(size).min(data.len());
        self.decode(type_name, &data[start..end])
    }

    // `raw` is at least `t.size` bytes and `t` passed validation.
    fn decode_type(&self, t: &'static StructureType, raw: &[u8]) -> DecodedStructure {
        let fields = t
            .fields
            .iter()
            .map(|f| DecodedField {
                name: f.name,
                offset: f.offset,
                value: self.decode_field(f, &raw[f.offset..f.end()]),
            })
            .collect();
        DecodedStructure {
            type_name: t.name,
            fields,
        }
    }

    fn decode_field(&self, f: &FieldDescriptor, raw: &[u8]) -> FieldValue {
        if matches!(f.kind, FieldKind::Bytes) {
            return FieldValue::Bytes(raw.to_vec());
        }
        let width = f.element_size();
        let mut items: Vec<FieldValue> = raw
            .chunks_exact(width)
            .map(|chunk| self.decode_element(f.kind, chunk))
            .collect();
        if f.count == 1 {
            items.pop().unwrap_or(FieldValue::Bytes(Vec::new()))
        } else {
            FieldValue::Array(items)
        }
    }

    fn decode_element(&self, kind: FieldKind, raw: &[u8]) -> FieldValue {
        match kind {
            FieldKind::Uint => FieldValue::Uint(read_le(raw)),
            FieldKind::Enum(enum_name) => {
                let value = read_le(raw);
                let name = self.enum_type(enum_name).and_then(|e| e.name_of(value));
                FieldValue::Enum { value, name }
            }
            FieldKind::Bytes => FieldValue::Bytes(raw.to_vec()),
            FieldKind::Nested(type_name) => match self.get(type_name) {
                Some(nested) => FieldValue::Struct(self.decode_type(nested, raw)),
                None => FieldValue::Bytes(raw.to_vec()),
            },
        }
    }
}

fn catalog_error(msg: String) -> MzError {
    MzError::Catalog(msg)
}

fn check_width(t: &StructureType, f: &FieldDescriptor) -> Result<()> {
    if matches!(f.element_size(), 1 | 2 | 4 | 8) {
        Ok(())
    } else {
        Err(catalog_error(format!(
            "{}.{}: unsupported integer width {}",
            t.name,
            f.name,
            f.element_size()
        )))
    }
}

fn read_le(raw: &[u8]) -> u64 {
    raw.iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
