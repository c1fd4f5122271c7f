//! Group code value types.
//!
//! Every tag's wire type follows from its numeric range. The binary variant
//! of the tagged format has no per-value type marker, so readers and writers
//! both rely on this table.

/// Wire type of the value that follows a group code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupCodeValueType {
    /// No known type; read as a string.
    None,
    String,
    /// One component of a point (x, y or z).
    Point3D,
    Double,
    Byte,
    Int16,
    Int32,
    Int64,
    /// Hexadecimal handle string.
    Handle,
    Bool,
    /// Binary data, hex encoded in text files.
    Chunk,
    /// Comment string (999).
    Comment,
}

impl GroupCodeValueType {
    pub fn from_code(code: i32) -> Self {
        use GroupCodeValueType as T;
        match code {
            5 | 105 => T::Handle,
            0..=9 => T::String,
            10..=39 => T::Point3D,
            40..=59 => T::Double,
            60..=79 => T::Int16,
            90..=99 => T::Int32,
            100..=102 => T::String,
            110..=139 => T::Point3D,
            140..=149 => T::Double,
            160..=169 => T::Int64,
            170..=179 => T::Int16,
            210..=239 => T::Point3D,
            270..=279 => T::Int16,
            280..=289 => T::Byte,
            290..=299 => T::Bool,
            300..=309 => T::String,
            310..=319 => T::Chunk,
            320..=369 => T::Handle,
            370..=389 => T::Int16,
            390..=399 => T::Handle,
            400..=409 => T::Int16,
            410..=419 => T::String,
            420..=429 => T::Int32,
            430..=439 => T::String,
            440..=459 => T::Int32,
            460..=469 => T::Double,
            470..=479 => T::String,
            480..=481 => T::Handle,
            999 => T::Comment,
            1004 => T::Chunk,
            1000..=1009 => T::String,
            1010..=1059 => T::Double,
            1060..=1070 => T::Int16,
            1071 => T::Int32,
            _ => T::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_ranges() {
        assert_eq!(GroupCodeValueType::from_code(0), GroupCodeValueType::String);
        assert_eq!(GroupCodeValueType::from_code(5), GroupCodeValueType::Handle);
        assert_eq!(GroupCodeValueType::from_code(10), GroupCodeValueType::Point3D);
        assert_eq!(GroupCodeValueType::from_code(40), GroupCodeValueType::Double);
        assert_eq!(GroupCodeValueType::from_code(70), GroupCodeValueType::Int16);
        assert_eq!(GroupCodeValueType::from_code(90), GroupCodeValueType::Int32);
        assert_eq!(GroupCodeValueType::from_code(160), GroupCodeValueType::Int64);
        assert_eq!(GroupCodeValueType::from_code(280), GroupCodeValueType::Byte);
        assert_eq!(GroupCodeValueType::from_code(290), GroupCodeValueType::Bool);
        assert_eq!(GroupCodeValueType::from_code(310), GroupCodeValueType::Chunk);
        assert_eq!(GroupCodeValueType::from_code(330), GroupCodeValueType::Handle);
        assert_eq!(GroupCodeValueType::from_code(999), GroupCodeValueType::Comment);
        assert_eq!(GroupCodeValueType::from_code(1004), GroupCodeValueType::Chunk);
        assert_eq!(GroupCodeValueType::from_code(2000), GroupCodeValueType::None);
    }
}
