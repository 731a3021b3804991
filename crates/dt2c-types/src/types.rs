//! Field tree representation.
//!
//! This module defines the normalized tree a `dt` dump is grouped into:
//! flat members (simple, array, bitfield) and the two anonymous layout
//! containers (union and pack) that the grouping engine infers from
//! repeated offsets.

use serde::{Deserialize, Serialize};

/// A field of a dumped structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Field {
    /// Plain member: `ULONG Count;`
    Simple(Member),

    /// Fixed-length array member: `UCHAR Name[16];`
    Array(ArrayMember),

    /// Bit-field member, stored in the narrowest unsigned type that fits.
    Bitfield(BitfieldMember),

    /// Anonymous union of alternatives starting at the same offset.
    Union(Group),

    /// Anonymous struct embedded in a union.
    Pack(Group),
}

impl Field {
    /// Byte offset reported by the dump.
    ///
    /// For unions and packs this is the offset of the first member.
    pub fn offset(&self) -> u64 {
        match self {
            Field::Simple(m) => m.offset,
            Field::Array(a) => a.offset,
            Field::Bitfield(b) => b.offset,
            Field::Union(g) | Field::Pack(g) => g.offset,
        }
    }

    /// Member name, `None` for the anonymous containers.
    pub fn name(&self) -> Option<&str> {
        match self {
            Field::Simple(m) => Some(&m.name),
            Field::Array(a) => Some(&a.name),
            Field::Bitfield(b) => Some(&b.name),
            Field::Union(_) | Field::Pack(_) => None,
        }
    }

    /// Resolved C type name, `None` for the anonymous containers.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Field::Simple(m) => Some(&m.type_name),
            Field::Array(a) => Some(&a.type_name),
            Field::Bitfield(b) => Some(b.storage.type_name()),
            Field::Union(_) | Field::Pack(_) => None,
        }
    }

    /// Child fields of a union or pack; empty for flat members.
    pub fn members(&self) -> &[Field] {
        match self {
            Field::Union(g) | Field::Pack(g) => &g.members,
            _ => &[],
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Field::Union(_))
    }

    pub fn is_pack(&self) -> bool {
        matches!(self, Field::Pack(_))
    }

    pub fn is_bitfield(&self) -> bool {
        matches!(self, Field::Bitfield(_))
    }

    /// Number of flat members in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Field::Union(g) | Field::Pack(g) => g.members.iter().map(Field::leaf_count).sum(),
            _ => 1,
        }
    }
}

/// A plain named member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub type_name: String,
    pub offset: u64,
}

/// A named fixed-length array member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayMember {
    pub name: String,
    /// Element type.
    pub type_name: String,
    pub offset: u64,
    pub length: u64,
}

/// A named bit-field member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitfieldMember {
    pub name: String,
    pub offset: u64,
    /// First bit within the storage unit.
    pub bit_position: u32,
    /// Number of bits.
    pub bit_length: u32,
    /// Storage unit inferred from `bit_length`.
    pub storage: BitfieldStorage,
}

impl BitfieldMember {
    pub fn new(name: impl Into<String>, offset: u64, bit_position: u32, bit_length: u32) -> Self {
        Self {
            name: name.into(),
            offset,
            bit_position,
            bit_length,
            storage: BitfieldStorage::for_width(bit_length),
        }
    }
}

/// Unsigned storage unit of a bit-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitfieldStorage {
    Byte,
    Word,
    Dword,
    Qword,
}

impl BitfieldStorage {
    /// Narrowest storage that holds `bits` bits.
    pub fn for_width(bits: u32) -> Self {
        match bits {
            0..=8 => Self::Byte,
            9..=16 => Self::Word,
            17..=32 => Self::Dword,
            _ => Self::Qword,
        }
    }

    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Dword => 4,
            Self::Qword => 8,
        }
    }

    /// Windows type name of the storage unit.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Byte => "UCHAR",
            Self::Word => "USHORT",
            Self::Dword => "ULONG",
            Self::Qword => "ULONGLONG",
        }
    }
}

/// Members of an anonymous union or pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Offset shared by the group's first member.
    pub offset: u64,
    /// Members in source order.
    pub members: Vec<Field>,
}

impl Group {
    pub fn new(offset: u64) -> Self {
        Self {
            offset,
            members: Vec::new(),
        }
    }

    pub fn push(&mut self, field: Field) {
        self.members.push(field);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A dumped structure: the header name plus its top-level fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Structure {
    /// Type name with one leading underscore stripped (`_PEB` becomes `PEB`).
    /// `None` when the dump had no `module!Type` header.
    pub name: Option<String>,
    /// Top-level fields in source order.
    pub fields: Vec<Field>,
}

impl Structure {
    /// Find a flat member anywhere in the tree by name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        fn find<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
            fields.iter().find_map(|f| match f {
                Field::Union(g) | Field::Pack(g) => find(&g.members, name),
                _ if f.name() == Some(name) => Some(f),
                _ => None,
            })
        }
        find(&self.fields, name)
    }

    /// Top-level fields starting at `offset`.
    pub fn fields_at_offset(&self, offset: u64) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.offset() == offset)
    }

    /// Number of flat members in the whole tree.
    pub fn leaf_count(&self) -> usize {
        self.fields.iter().map(Field::leaf_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitfield_storage_boundaries() {
        assert_eq!(BitfieldStorage::for_width(1), BitfieldStorage::Byte);
        assert_eq!(BitfieldStorage::for_width(8), BitfieldStorage::Byte);
        assert_eq!(BitfieldStorage::for_width(9), BitfieldStorage::Word);
        assert_eq!(BitfieldStorage::for_width(16), BitfieldStorage::Word);
        assert_eq!(BitfieldStorage::for_width(17), BitfieldStorage::Dword);
        assert_eq!(BitfieldStorage::for_width(32), BitfieldStorage::Dword);
        assert_eq!(BitfieldStorage::for_width(33), BitfieldStorage::Qword);
        assert_eq!(BitfieldStorage::for_width(64), BitfieldStorage::Qword);
    }

    #[test]
    fn test_bitfield_storage_names() {
        assert_eq!(BitfieldStorage::for_width(8).type_name(), "UCHAR");
        assert_eq!(BitfieldStorage::for_width(9).size(), 2);
        assert_eq!(BitfieldStorage::for_width(32).size(), 4);
        assert_eq!(BitfieldStorage::for_width(33).type_name(), "ULONGLONG");
    }

    #[test]
    fn test_field_accessors() {
        let flag = Field::Bitfield(BitfieldMember::new("Flag", 4, 3, 1));
        assert_eq!(flag.offset(), 4);
        assert_eq!(flag.name(), Some("Flag"));
        assert_eq!(flag.type_name(), Some("UCHAR"));
        assert!(flag.members().is_empty());

        let mut group = Group::new(4);
        group.push(flag.clone());
        group.push(Field::Simple(Member {
            name: "Raw".to_string(),
            type_name: "ULONG".to_string(),
            offset: 4,
        }));
        let union = Field::Union(group);
        assert!(union.is_union());
        assert_eq!(union.name(), None);
        assert_eq!(union.members().len(), 2);
        assert_eq!(union.leaf_count(), 2);
    }

    #[test]
    fn test_structure_lookup() {
        let mut pack = Group::new(0);
        pack.push(Field::Simple(Member {
            name: "Low".to_string(),
            type_name: "ULONG".to_string(),
            offset: 0,
        }));
        pack.push(Field::Simple(Member {
            name: "High".to_string(),
            type_name: "LONG".to_string(),
            offset: 4,
        }));
        let mut union = Group::new(0);
        union.push(Field::Pack(pack));
        union.push(Field::Simple(Member {
            name: "QuadPart".to_string(),
            type_name: "LONGLONG".to_string(),
            offset: 0,
        }));

        let s = Structure {
            name: Some("LARGE_INTEGER".to_string()),
            fields: vec![Field::Union(union)],
        };

        assert_eq!(s.leaf_count(), 3);
        assert_eq!(s.field_by_name("High").map(Field::offset), Some(4));
        assert!(s.field_by_name("Missing").is_none());
        assert_eq!(s.fields_at_offset(0).count(), 1);
    }
}
