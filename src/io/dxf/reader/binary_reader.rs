//! Binary DXF reader

use std::io::{ErrorKind, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::stream_reader::{DxfCodePair, DxfStreamReader};
use crate::error::{DxfError, Result};
use crate::io::dxf::{GroupCodeValueType, BINARY_DXF_SENTINEL};

/// Binary DXF stream reader
pub struct DxfBinaryReader<R: Read> {
    reader: R,
    offset: u64,
    peeked_pair: Option<DxfCodePair>,
}

impl<R: Read> DxfBinaryReader<R> {
    /// Create a reader, consuming and checking the sentinel.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut sentinel = [0u8; BINARY_DXF_SENTINEL.len()];
        reader.read_exact(&mut sentinel).map_err(|_| {
            DxfError::InvalidSentinel("Stream is shorter than the binary DXF sentinel".into())
        })?;
        if sentinel != BINARY_DXF_SENTINEL {
            return Err(DxfError::InvalidSentinel("Binary DXF sentinel mismatch".into()));
        }
        Ok(Self {
            reader,
            offset: BINARY_DXF_SENTINEL.len() as u64,
            peeked_pair: None,
        })
    }

    fn eof(&self, what: &str) -> DxfError {
        DxfError::Parse(format!("Unexpected end of binary DXF reading {what} at byte {}", self.offset))
    }

    fn read_null_string(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let b = self.reader.read_u8().map_err(|_| self.eof("a string"))?;
            self.offset += 1;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => encoding_rs::WINDOWS_1252.decode(e.as_bytes()).0.into_owned(),
        })
    }

    fn read_pair_internal(&mut self) -> Result<Option<DxfCodePair>> {
        let code = match self.reader.read_i16::<LittleEndian>() {
            Ok(code) => code as i32,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        self.offset += 2;

        let value_type = GroupCodeValueType::from_code(code);
        let value = match value_type {
            GroupCodeValueType::Double | GroupCodeValueType::Point3D => {
                let v = self.reader.read_f64::<LittleEndian>().map_err(|_| self.eof("a double"))?;
                self.offset += 8;
                v.to_string()
            }
            GroupCodeValueType::Int16 | GroupCodeValueType::Byte => {
                let v = self.reader.read_i16::<LittleEndian>().map_err(|_| self.eof("a short"))?;
                self.offset += 2;
                v.to_string()
            }
            GroupCodeValueType::Int32 => {
                let v = self.reader.read_i32::<LittleEndian>().map_err(|_| self.eof("an int"))?;
                self.offset += 4;
                v.to_string()
            }
            GroupCodeValueType::Int64 => {
                let v = self.reader.read_i64::<LittleEndian>().map_err(|_| self.eof("a long"))?;
                self.offset += 8;
                v.to_string()
            }
            GroupCodeValueType::Bool => {
                let v = self.reader.read_u8().map_err(|_| self.eof("a bool"))?;
                self.offset += 1;
                v.to_string()
            }
            GroupCodeValueType::Chunk => {
                let length = self.reader.read_u8().map_err(|_| self.eof("a chunk length"))? as usize;
                let mut data = vec![0u8; length];
                self.reader.read_exact(&mut data).map_err(|_| self.eof("a chunk"))?;
                self.offset += 1 + length as u64;
                data.iter().map(|b| format!("{b:02X}")).collect()
            }
            GroupCodeValueType::String
            | GroupCodeValueType::Handle
            | GroupCodeValueType::Comment
            | GroupCodeValueType::None => self.read_null_string()?,
        };

        Ok(Some(DxfCodePair::new(code, value)))
    }
}

impl<R: Read> DxfStreamReader for DxfBinaryReader<R> {
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
        self.offset
    }
}
