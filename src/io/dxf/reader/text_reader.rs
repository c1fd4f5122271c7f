//! DXF ASCII text reader

use std::io::BufRead;

use encoding_rs::Encoding;

use super::stream_reader::{DxfCodePair, DxfStreamReader};
use crate::error::{DxfError, Result};

/// DXF ASCII text file reader
pub struct DxfTextReader<R: BufRead> {
    reader: R,
    line_number: u64,
    peeked_pair: Option<DxfCodePair>,
    /// Fallback for lines that are not valid UTF-8.
    encoding: &'static Encoding,
}

impl<R: BufRead> DxfTextReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            peeked_pair: None,
            encoding: encoding_rs::WINDOWS_1252,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Read a line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut bytes = Vec::new();
        if self.reader.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        let line = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => self.encoding.decode(e.as_bytes()).0.into_owned(),
        };
        Ok(Some(line))
    }

    fn read_pair_internal(&mut self) -> Result<Option<DxfCodePair>> {
        let code_line = match self.read_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        if code_line.trim().is_empty() {
            return Ok(None);
        }

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::Parse(format!(
                "Invalid DXF code at line {}: '{}'",
                self.line_number, code_line
            ))
        })?;

        let value_line = self.read_line()?.ok_or_else(|| {
            DxfError::Parse(format!(
                "Unexpected EOF after code {} at line {}",
                code, self.line_number
            ))
        })?;

        Ok(Some(DxfCodePair::new(code, unescape(&value_line))))
    }
}

/// Decode `^J`, `^M`, `^I` and `^ ` sequences.
pub fn unescape(value: &str) -> String {
    if !value.contains('^') {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('J') => out.push('\n'),
            Some('M') => out.push('\r'),
            Some('I') => out.push('\t'),
            Some(' ') => out.push('^'),
            _ => {
                out.push('^');
                continue;
            }
        }
        chars.next();
    }
    out
}

impl<R: BufRead> DxfStreamReader for DxfTextReader<R> {
    fn read_pair(&mut self) -> Result<Option<DxfCodePair>> {
        if let Some(pair) = self.peeked_pair.take() {
            return Ok(Some(pair));
        }
        self.read_pair_internal()
    }

    fn peek_code(&mut self) -> Result<Option<i32>> {
        if let Some(ref pair) = self.peeked_pair {
            return Ok(Some(pair.code));
        }
        match self.read_pair_internal()? {
            Some(pair) => {
                let code = pair.code;
                self.peeked_pair = Some(pair);
                Ok(Some(code))
            }
            None => Ok(None),
        }
    }

    fn push_back(&mut self, pair: DxfCodePair) {
        self.peeked_pair = Some(pair);
    }

    fn position(&self) -> u64 {
        self.line_number
    }
}
