//! Static schema types for fixed-layout records.
//!
//! Schemas are plain `'static` tables; nothing here is built per instance.

use serde::Serialize;

/// How the bytes of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    /// Little-endian unsigned integer of 1, 2, 4 or 8 bytes per element
    Uint,
    /// Integer with symbolic names from the named enum
    Enum(&'static str),
    /// Verbatim bytes
    Bytes,
    /// Another record type from the same catalog
    Nested(&'static str),
}

/// One field of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Offset from the start of the record
    pub offset: usize,
    /// Total size in bytes, over all elements
    pub size: usize,
    pub kind: FieldKind,
    /// Element count, 1 for scalars
    pub count: usize,
}

impl FieldDescriptor {
    pub const fn uint(name: &'static str, offset: usize, size: usize) -> Self {
        Self {
            name,
            offset,
            size,
            kind: FieldKind::Uint,
            count: 1,
        }
    }

    pub const fn uint_array(name: &'static str, offset: usize, width: usize, count: usize) -> Self {
        Self {
            name,
            offset,
            size: width * count,
            kind: FieldKind::Uint,
            count,
        }
    }

    pub const fn enumerated(
        name: &'static str,
        offset: usize,
        size: usize,
        enum_name: &'static str,
    ) -> Self {
        Self {
            name,
            offset,
            size,
            kind: FieldKind::Enum(enum_name),
            count: 1,
        }
    }

    pub const fn bytes(name: &'static str, offset: usize, size: usize) -> Self {
        Self {
            name,
            offset,
            size,
            kind: FieldKind::Bytes,
            count: 1,
        }
    }

    pub const fn nested(
        name: &'static str,
        offset: usize,
        type_name: &'static str,
        element_size: usize,
        count: usize,
    ) -> Self {
        Self {
            name,
            offset,
            size: element_size * count,
            kind: FieldKind::Nested(type_name),
            count,
        }
    }

    /// Offset one past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    pub fn element_size(&self) -> usize {
        if self.count == 0 {
            0
        } else {
            self.size / self.count
        }
    }
}

/// A named record type: an ordered field list and a declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StructureType {
    pub name: &'static str,
    pub size: usize,
    pub fields: &'static [FieldDescriptor],
}

impl StructureType {
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named integer enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnumType {
    pub name: &'static str,
    /// Declared width in bytes
    pub width: usize,
    /// Members in declaration order
    pub members: &'static [(&'static str, u64)],
}

impl EnumType {
    /// First member declared with `value`.
    pub fn name_of(&self, value: u64) -> Option<&'static str> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| *name)
    }

    pub fn value_of(&self, name: &str) -> Option<u64> {
        self.members
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLORS: EnumType = EnumType {
        name: "COLOR",
        width: 1,
        members: &[("COLOR_RED", 1), ("COLOR_GREEN", 2), ("COLOR_CRIMSON", 1)],
    };

    #[test]
    fn enum_lookup_prefers_declaration_order() {
        assert_eq!(COLORS.name_of(1), Some("COLOR_RED"));
        assert_eq!(COLORS.name_of(2), Some("COLOR_GREEN"));
        assert_eq!(COLORS.name_of(3), None);
        assert_eq!(COLORS.value_of("COLOR_CRIMSON"), Some(1));
    }

    #[test]
    fn descriptor_constructors() {
        let f = FieldDescriptor::uint_array("e_res", 28, 2, 4);
        assert_eq!(f.size, 8);
        assert_eq!(f.element_size(), 2);
        assert_eq!(f.end(), 36);

        let f = FieldDescriptor::nested("DataDirectory", 96, "IMAGE_DATA_DIRECTORY", 8, 16);
        assert_eq!(f.size, 128);
        assert_eq!(f.kind, FieldKind::Nested("IMAGE_DATA_DIRECTORY"));
    }
}
