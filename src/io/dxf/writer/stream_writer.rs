//! The pair-level writing surface shared by the ASCII and binary writers.

use crate::error::Result;
use crate::io::field::FieldValue;
use crate::types::{Handle, Vector3};

/// Longest chunk written per binary pair.
pub const BINARY_CHUNK: usize = 127;

/// Sink for code/value pairs. Each method renders one pair in the
/// writer's wire form.
pub trait DxfStreamWriter {
    fn write_string(&mut self, code: i32, value: &str) -> Result<()>;
    fn write_i16(&mut self, code: i32, value: i16) -> Result<()>;
    fn write_i32(&mut self, code: i32, value: i32) -> Result<()>;
    fn write_i64(&mut self, code: i32, value: i64) -> Result<()>;
    fn write_double(&mut self, code: i32, value: f64) -> Result<()>;
    fn write_bool(&mut self, code: i32, value: bool) -> Result<()>;

    /// Handles are written as upper-case hex.
    fn write_handle(&mut self, code: i32, handle: Handle) -> Result<()>;

    /// One chunk of at most [`BINARY_CHUNK`] bytes.
    fn write_binary(&mut self, code: i32, data: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// Composite writes built on [`DxfStreamWriter`].
pub trait DxfStreamWriterExt: DxfStreamWriter {
    /// `x_code`, `x_code + 10`, `x_code + 20`.
    fn write_point3d(&mut self, x_code: i32, point: Vector3) -> Result<()> {
        self.write_double(x_code, point.x)?;
        self.write_double(x_code + 10, point.y)?;
        self.write_double(x_code + 20, point.z)
    }

    fn write_subclass(&mut self, marker: &str) -> Result<()> {
        self.write_string(100, marker)
    }

    fn write_section_start(&mut self, name: &str) -> Result<()> {
        self.write_string(0, "SECTION")?;
        self.write_string(2, name)
    }

    fn write_section_end(&mut self) -> Result<()> {
        self.write_string(0, "ENDSEC")
    }

    fn write_eof(&mut self) -> Result<()> {
        self.write_string(0, "EOF")
    }

    /// Binary data split over as many pairs as needed; empty data still
    /// takes one pair.
    fn write_chunked(&mut self, code: i32, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return self.write_binary(code, data);
        }
        for chunk in data.chunks(BINARY_CHUNK) {
            self.write_binary(code, chunk)?;
        }
        Ok(())
    }

    /// Render a value by its own variant. Name references are resolved by
    /// the caller.
    fn write_value(&mut self, code: i32, value: &FieldValue) -> Result<()> {
        match value {
            FieldValue::Bool(v) => self.write_bool(code, *v)?,
            FieldValue::Int16(v) => self.write_i16(code, *v)?,
            FieldValue::Int32(v) => self.write_i32(code, *v)?,
            FieldValue::Int64(v) => self.write_i64(code, *v)?,
            FieldValue::Double(v) => self.write_double(code, *v)?,
            FieldValue::Point(p) => self.write_point3d(code, *p)?,
            FieldValue::Text(s) => self.write_string(code, s)?,
            FieldValue::Binary(data) => self.write_chunked(code, data)?,
            FieldValue::Handle(h) => self.write_handle(code, *h)?,
            FieldValue::Handles(list) => {
                for handle in list {
                    self.write_handle(code, *handle)?;
                }
            }
        }
        Ok(())
    }
}

impl<T: DxfStreamWriter + ?Sized> DxfStreamWriterExt for T {}
