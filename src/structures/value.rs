//! Decoded field values.

use serde::Serialize;

/// The raw value of one decoded field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldValue {
    Uint(u64),
    /// `name` is `None` when the value matches no member
    Enum {
        value: u64,
        name: Option<&'static str>,
    },
    Bytes(Vec<u8>),
    Array(Vec<FieldValue>),
    Struct(DecodedStructure),
}

impl FieldValue {
    /// Integer value of a `Uint` or `Enum`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Uint(v) | FieldValue::Enum { value: v, .. } => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&DecodedStructure> {
        match self {
            FieldValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// One field of a decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedField {
    pub name: &'static str,
    pub offset: usize,
    pub value: FieldValue,
}

/// A decoded record, fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedStructure {
    pub type_name: &'static str,
    pub fields: Vec<DecodedField>,
}

impl DecodedStructure {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Integer value of the named field.
    pub fn u64_of(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(FieldValue::as_u64)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecodedField> {
        self.fields.iter()
    }
}
