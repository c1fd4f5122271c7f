//! Static field tables.
//!
//! Each object kind describes its fields once, as a `&'static` slice of
//! [`FieldDescriptor`]s. The same table drives both codecs: in the binary
//! form the order and kind select the bit code and the stream (data or
//! handle); in the tagged-text form the code is the tag and the kind selects
//! how the value is rendered.

use crate::io::dwg::reference_type::DwgReferenceType;
use crate::types::{Handle, ObjectType, Vector3};

/// How a field is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Subclass marker (code 100 in text files, nothing in binary).
    Subclass(&'static str),
    Bool,
    Int16,
    Int32,
    /// BLL where the revision supports it.
    Int64,
    /// BD
    Double,
    /// RD
    RawDouble,
    /// DD, relative to the value of the double field `default_code`.
    DoubleWithDefault { default_code: i32 },
    /// 3BD; tags `code`, `code + 10`, `code + 20` in text files.
    Point3,
    Text,
    Binary,
    /// A single handle in the handle stream.
    Handle(DwgReferenceType),
    /// BL count in the data stream, handles in the handle stream.
    HandleList(DwgReferenceType),
    /// A handle in binary files, the target's name in text files.
    NameReference { target: ObjectType },
    /// Number of entries in the list field `list_code`. Text files only.
    Count { list_code: i32 },
}

impl FieldKind {
    /// Whether the field holds handles that need pass 2.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            FieldKind::Handle(_) | FieldKind::HandleList(_) | FieldKind::NameReference { .. }
        )
    }
}

/// One entry of a kind's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub code: i32,
    pub kind: FieldKind,
    pub name: &'static str,
}

impl FieldDescriptor {
    pub const fn new(code: i32, kind: FieldKind, name: &'static str) -> Self {
        Self { code, kind, name }
    }
}

/// Find the descriptor for `code`.
pub fn descriptor_for(fields: &[FieldDescriptor], code: i32) -> Option<&FieldDescriptor> {
    fields
        .iter()
        .find(|f| f.code == code && !matches!(f.kind, FieldKind::Subclass(_)))
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Point(Vector3),
    Text(String),
    Binary(Vec<u8>),
    Handle(Handle),
    Handles(Vec<Handle>),
}

impl FieldValue {
    pub fn as_double(&self) -> Option<f64> {
        match self {
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            FieldValue::Handle(h) => Some(*h),
            _ => None,
        }
    }

    /// Every handle the value carries.
    pub fn handles(&self) -> Vec<Handle> {
        match self {
            FieldValue::Handle(h) if h.is_valid() => vec![*h],
            FieldValue::Handles(list) => list.iter().copied().filter(Handle::is_valid).collect(),
            _ => Vec::new(),
        }
    }

    /// Value written when an object does not report a field.
    pub fn default_for(kind: &FieldKind) -> Option<FieldValue> {
        Some(match kind {
            FieldKind::Subclass(_) | FieldKind::Count { .. } => return None,
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::Int16 => FieldValue::Int16(0),
            FieldKind::Int32 => FieldValue::Int32(0),
            FieldKind::Int64 => FieldValue::Int64(0),
            FieldKind::Double | FieldKind::RawDouble | FieldKind::DoubleWithDefault { .. } => {
                FieldValue::Double(0.0)
            }
            FieldKind::Point3 => FieldValue::Point(Vector3::zeros()),
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Binary => FieldValue::Binary(Vec::new()),
            FieldKind::Handle(_) | FieldKind::NameReference { .. } => FieldValue::Handle(Handle::NULL),
            FieldKind::HandleList(_) => FieldValue::Handles(Vec::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[FieldDescriptor] = &[
        FieldDescriptor::new(100, FieldKind::Subclass("AcDbSymbolTableRecord"), "subclass"),
        FieldDescriptor::new(2, FieldKind::Text, "name"),
        FieldDescriptor::new(340, FieldKind::Handle(DwgReferenceType::SoftPointer), "style"),
    ];

    #[test]
    fn test_descriptor_lookup_skips_subclass() {
        assert_eq!(descriptor_for(TABLE, 2).map(|d| d.name), Some("name"));
        assert!(descriptor_for(TABLE, 100).is_none());
        assert!(descriptor_for(TABLE, 340).unwrap().kind.is_reference());
    }

    #[test]
    fn test_handles_skip_null() {
        let v = FieldValue::Handles(vec![Handle::new(1), Handle::NULL, Handle::new(3)]);
        assert_eq!(v.handles(), vec![Handle::new(1), Handle::new(3)]);
        assert!(FieldValue::Handle(Handle::NULL).handles().is_empty());
    }
}
