//! Binary DXF writer
//!
//! Binary values carry no type marker, so every integer is written with the
//! width the reader will expect for its code.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::stream_writer::DxfStreamWriter;
use crate::error::{DxfError, Result};
use crate::io::dxf::{GroupCodeValueType, BINARY_DXF_SENTINEL};
use crate::types::Handle;

/// Binary DXF stream writer
pub struct DxfBinaryWriter<W: Write> {
    writer: W,
}

impl<W: Write> DxfBinaryWriter<W> {
    /// Create a new binary DXF writer; the sentinel is written immediately.
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_all(BINARY_DXF_SENTINEL)?;
        Ok(Self { writer })
    }

    /// Write a DXF code as 16-bit little-endian
    fn write_code(&mut self, code: i32) -> Result<()> {
        let code = i16::try_from(code)
            .map_err(|_| DxfError::Encoding(format!("Group code {code} does not fit in 16 bits")))?;
        self.writer.write_i16::<LittleEndian>(code)?;
        Ok(())
    }

    fn write_null_string(&mut self, value: &str) -> Result<()> {
        self.writer.write_all(value.as_bytes())?;
        self.writer.write_u8(0)?;
        Ok(())
    }

    /// Write an integer with the width of the code's wire type.
    fn write_integer(&mut self, code: i32, value: i64) -> Result<()> {
        let value_type = GroupCodeValueType::from_code(code);
        let out_of_range = || DxfError::Encoding(format!("Value {value} does not fit group code {code}"));
        self.write_code(code)?;
        match value_type {
            GroupCodeValueType::Int16 | GroupCodeValueType::Byte => {
                let v = i16::try_from(value).map_err(|_| out_of_range())?;
                self.writer.write_i16::<LittleEndian>(v)?;
            }
            GroupCodeValueType::Int32 => {
                let v = i32::try_from(value).map_err(|_| out_of_range())?;
                self.writer.write_i32::<LittleEndian>(v)?;
            }
            GroupCodeValueType::Int64 => self.writer.write_i64::<LittleEndian>(value)?,
            GroupCodeValueType::Bool => {
                let v = u8::try_from(value).map_err(|_| out_of_range())?;
                self.writer.write_u8(v)?;
            }
            GroupCodeValueType::Double | GroupCodeValueType::Point3D => {
                self.writer.write_f64::<LittleEndian>(value as f64)?;
            }
            GroupCodeValueType::String
            | GroupCodeValueType::Handle
            | GroupCodeValueType::Comment
            | GroupCodeValueType::None => self.write_null_string(&value.to_string())?,
            GroupCodeValueType::Chunk => {
                return Err(DxfError::Encoding(format!("Group code {code} holds binary data, not a number")))
            }
        }
        Ok(())
    }

    /// Get the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DxfStreamWriter for DxfBinaryWriter<W> {
    fn write_string(&mut self, code: i32, value: &str) -> Result<()> {
        match GroupCodeValueType::from_code(code) {
            GroupCodeValueType::String
            | GroupCodeValueType::Handle
            | GroupCodeValueType::Comment
            | GroupCodeValueType::None => {
                self.write_code(code)?;
                self.write_null_string(value)
            }
            other => Err(DxfError::Encoding(format!(
                "Group code {code} expects {other:?}, got a string"
            ))),
        }
    }

    fn write_i16(&mut self, code: i32, value: i16) -> Result<()> {
        self.write_integer(code, value as i64)
    }

    fn write_i32(&mut self, code: i32, value: i32) -> Result<()> {
        self.write_integer(code, value as i64)
    }

    fn write_i64(&mut self, code: i32, value: i64) -> Result<()> {
        self.write_integer(code, value)
    }

    fn write_double(&mut self, code: i32, value: f64) -> Result<()> {
        match GroupCodeValueType::from_code(code) {
            GroupCodeValueType::Double | GroupCodeValueType::Point3D => {
                self.write_code(code)?;
                self.writer.write_f64::<LittleEndian>(value)?;
                Ok(())
            }
            other => Err(DxfError::Encoding(format!(
                "Group code {code} expects {other:?}, got a double"
            ))),
        }
    }

    fn write_bool(&mut self, code: i32, value: bool) -> Result<()> {
        self.write_integer(code, value as i64)
    }

    fn write_handle(&mut self, code: i32, handle: Handle) -> Result<()> {
        // Handles stay hex strings in binary files
        self.write_string(code, &handle.to_hex())
    }

    fn write_binary(&mut self, code: i32, data: &[u8]) -> Result<()> {
        let length = u8::try_from(data.len())
            .map_err(|_| DxfError::Encoding(format!("Binary chunk of {} bytes is too long", data.len())))?;
        self.write_code(code)?;
        self.writer.write_u8(length)?;
        self.writer.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: usize = BINARY_DXF_SENTINEL.len();

    #[test]
    fn test_binary_sentinel() {
        let mut buf = Vec::new();
        DxfBinaryWriter::new(&mut buf).unwrap();
        assert!(buf.starts_with(BINARY_DXF_SENTINEL));
    }

    #[test]
    fn test_write_string() {
        let mut buf = Vec::new();
        DxfBinaryWriter::new(&mut buf).unwrap().write_string(0, "LINE").unwrap();
        assert_eq!(buf[BASE..BASE + 2], [0, 0]);
        assert_eq!(&buf[BASE + 2..BASE + 6], b"LINE");
        assert_eq!(buf[BASE + 6], 0);
    }

    #[test]
    fn test_write_double() {
        let mut buf = Vec::new();
        DxfBinaryWriter::new(&mut buf).unwrap().write_double(10, 1.5).unwrap();
        assert_eq!(buf[BASE..BASE + 2], [10, 0]);
        assert_eq!(&buf[BASE + 2..BASE + 10], &1.5f64.to_le_bytes());
    }

    #[test]
    fn test_integers_use_wire_width() {
        let mut buf = Vec::new();
        {
            let mut writer = DxfBinaryWriter::new(&mut buf).unwrap();
            writer.write_i32(70, 7).unwrap();
            writer.write_i16(90, 7).unwrap();
            writer.write_bool(290, true).unwrap();
        }
        assert_eq!(buf[BASE..], [70, 0, 7, 0, 90, 0, 7, 0, 0, 0, 0x22, 1, 1]);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let mut buf = Vec::new();
        let mut writer = DxfBinaryWriter::new(&mut buf).unwrap();
        assert!(matches!(writer.write_double(70, 1.0), Err(DxfError::Encoding(_))));
        assert!(matches!(writer.write_string(40, "x"), Err(DxfError::Encoding(_))));
        assert!(matches!(writer.write_i16(70, 0).and(writer.write_i32(70, 70_000)), Err(DxfError::Encoding(_))));
    }
}
