//! ASCII DXF writer

use std::io::Write;

use super::stream_writer::DxfStreamWriter;
use crate::error::Result;
use crate::types::Handle;

/// ASCII DXF stream writer
pub struct DxfTextWriter<W: Write> {
    writer: W,
}

impl<W: Write> DxfTextWriter<W> {
    /// Create a new ASCII DXF writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a DXF code right-aligned in a 3-character field
    fn write_code(&mut self, code: i32) -> Result<()> {
        writeln!(self.writer, "{code:>3}")?;
        Ok(())
    }

    /// Get the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Encode line breaks, tabs and carets so a value stays on one line.
pub fn escape(value: &str) -> String {
    if !value.contains(['\n', '\r', '\t', '^']) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '\n' => out.push_str("^J"),
            '\r' => out.push_str("^M"),
            '\t' => out.push_str("^I"),
            '^' => out.push_str("^ "),
            c => out.push(c),
        }
    }
    out
}

/// Integral values keep one decimal; anything else uses the shortest form
/// that parses back to the same bits.
pub fn format_double(value: f64) -> String {
    if value == value.trunc() {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl<W: Write> DxfStreamWriter for DxfTextWriter<W> {
    fn write_string(&mut self, code: i32, value: &str) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{}", escape(value))?;
        Ok(())
    }

    fn write_i16(&mut self, code: i32, value: i16) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{value:>6}")?;
        Ok(())
    }

    fn write_i32(&mut self, code: i32, value: i32) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{value}")?;
        Ok(())
    }

    fn write_i64(&mut self, code: i32, value: i64) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{value}")?;
        Ok(())
    }

    fn write_double(&mut self, code: i32, value: f64) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{}", format_double(value))?;
        Ok(())
    }

    fn write_bool(&mut self, code: i32, value: bool) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{:>6}", u8::from(value))?;
        Ok(())
    }

    fn write_handle(&mut self, code: i32, handle: Handle) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{}", handle.to_hex())?;
        Ok(())
    }

    fn write_binary(&mut self, code: i32, data: &[u8]) -> Result<()> {
        self.write_code(code)?;
        for byte in data {
            write!(self.writer, "{byte:02X}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
