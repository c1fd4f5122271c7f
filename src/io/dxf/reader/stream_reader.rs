//! DXF stream reader trait and common types

use crate::error::Result;
use crate::io::dxf::GroupCodeValueType;
use crate::types::Handle;

/// A DXF code/value pair
#[derive(Debug, Clone, PartialEq)]
pub struct DxfCodePair {
    /// The DXF group code
    pub code: i32,

    /// The value type
    pub value_type: GroupCodeValueType,

    /// String representation of the value
    pub value_string: String,

    /// Integer value (if applicable)
    pub value_int: Option<i64>,

    /// Floating-point value (if applicable)
    pub value_double: Option<f64>,
}

impl DxfCodePair {
    /// Create a new code/value pair, parsing the value by the code's type
    pub fn new(code: i32, value_string: String) -> Self {
        let value_type = GroupCodeValueType::from_code(code);

        let value_int = match value_type {
            GroupCodeValueType::Int16
            | GroupCodeValueType::Int32
            | GroupCodeValueType::Int64
            | GroupCodeValueType::Byte
            | GroupCodeValueType::Bool => value_string.trim().parse::<i64>().ok(),
            _ => None,
        };

        let value_double = match value_type {
            GroupCodeValueType::Double | GroupCodeValueType::Point3D => value_string.trim().parse::<f64>().ok(),
            _ => None,
        };

        Self {
            code,
            value_type,
            value_string,
            value_int,
            value_double,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value_string
    }

    pub fn as_int(&self) -> Option<i64> {
        self.value_int
    }

    pub fn as_i16(&self) -> Option<i16> {
        self.value_int.and_then(|v| i16::try_from(v).ok())
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.value_int.and_then(|v| i32::try_from(v).ok())
    }

    pub fn as_double(&self) -> Option<f64> {
        self.value_double
    }

    /// Non-zero integers are `true`.
    pub fn as_bool(&self) -> Option<bool> {
        self.value_int.map(|v| v != 0)
    }

    /// Value as a handle (hex string)
    pub fn as_handle(&self) -> Option<Handle> {
        Handle::from_hex(self.value_string.trim()).ok()
    }

    /// Whether this pair is `0 <name>`.
    pub fn is_start(&self, name: &str) -> bool {
        self.code == 0 && self.value_string == name
    }
}

/// Trait for reading DXF code/value pairs from a stream
pub trait DxfStreamReader {
    /// Read the next code/value pair; `None` at the end of the stream
    fn read_pair(&mut self) -> Result<Option<DxfCodePair>>;

    /// Peek at the next code without consuming it
    fn peek_code(&mut self) -> Result<Option<i32>>;

    /// Push a pair back to be read again on next read_pair call
    fn push_back(&mut self, pair: DxfCodePair);

    /// Line number (text) or byte offset (binary) of the last pair read
    fn position(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_parsed_by_code() {
        assert_eq!(DxfCodePair::new(70, " 42".into()).as_i16(), Some(42));
        assert_eq!(DxfCodePair::new(20, "1.25".into()).as_double(), Some(1.25));
        assert_eq!(DxfCodePair::new(290, "1".into()).as_bool(), Some(true));
        assert_eq!(DxfCodePair::new(5, "2A".into()).as_handle(), Some(Handle::new(0x2A)));
        assert_eq!(DxfCodePair::new(1, "42".into()).as_int(), None);
    }
}
