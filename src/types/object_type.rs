//! Object kind tags.

use std::fmt;

/// The kind tag of a record, as stored in the OT/BS type field.
///
/// The numbering belongs to the object catalog; the codec only reserves
/// the two values below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectType(pub i16);

impl ObjectType {
    /// Slot 0, never written.
    pub const UNUSED: ObjectType = ObjectType(0);
    /// Placeholder for a type that could not be decoded.
    pub const INVALID: ObjectType = ObjectType(-1);

    /// Whether the value may be written to a record.
    pub fn is_writable(&self) -> bool {
        self.0 > 0
    }

    pub fn value(&self) -> i16 {
        self.0
    }
}

impl From<i16> for ObjectType {
    fn from(value: i16) -> Self {
        ObjectType(value)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.0)
    }
}
