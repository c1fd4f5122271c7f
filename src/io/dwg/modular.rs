//! Modular size encodings.
//!
//! * Modular short (MS): little-endian 2-byte groups carrying 15 value bits
//!   each; bit 7 of the high byte is the continuation flag.
//! * Modular char (MC): little-endian bytes carrying 7 value bits each;
//!   bit 7 is the continuation flag. The signed form stores the sign in
//!   bit 6 of the terminating byte.
//!
//! The decoders pull bytes from a closure so the same logic serves byte
//! slices and bit cursors.

use crate::error::{DxfError, Result};

/// Encode a modular short. Values below `0x8000` take 2 bytes, values below
/// `1 << 30` take 4 bytes, anything larger 6 bytes.
pub fn encode_modular_short(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    let mut rest = value;
    loop {
        let group = (rest & 0x7FFF) as u16;
        rest >>= 15;
        let hi = ((group >> 8) as u8) | if rest != 0 { 0x80 } else { 0 };
        out.push(group as u8);
        out.push(hi);
        if rest == 0 {
            return out;
        }
    }
}

/// Decode a modular short from a byte source.
pub fn read_modular_short_with(mut next: impl FnMut() -> Result<u8>) -> Result<u32> {
    let mut value: u64 = 0;
    let mut shift = 0;
    loop {
        let lo = next()?;
        let hi = next()?;
        value |= ((lo as u64) | (((hi & 0x7F) as u64) << 8)) << shift;
        if hi & 0x80 == 0 {
            break;
        }
        shift += 15;
        if shift > 30 {
            return Err(DxfError::Parse("Modular short exceeds 32 bits".into()));
        }
    }
    u32::try_from(value).map_err(|_| DxfError::Parse("Modular short exceeds 32 bits".into()))
}

/// Encode an unsigned modular char. Zero encodes as a single zero byte.
pub fn encode_modular_char(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    let mut rest = value;
    loop {
        let byte = (rest & 0x7F) as u8;
        rest >>= 7;
        if rest == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Decode an unsigned modular char from a byte source.
pub fn read_modular_char_with(mut next: impl FnMut() -> Result<u8>) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = next()?;
        if shift < 64 {
            value |= ((byte & 0x7F) as u64) << shift;
        }
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift >= 70 {
            return Err(DxfError::Parse("Modular char exceeds 64 bits".into()));
        }
    }
}

/// Encode a signed modular char (magnitude plus sign bit in the last byte).
pub fn encode_signed_modular_char(value: i64) -> Vec<u8> {
    let negative = value < 0;
    let mut rest = value.unsigned_abs();
    let mut out = Vec::with_capacity(5);
    loop {
        if rest < 0x40 {
            out.push(rest as u8 | if negative { 0x40 } else { 0 });
            return out;
        }
        out.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
}

/// Decode a signed modular char from a byte source.
pub fn read_signed_modular_char_with(mut next: impl FnMut() -> Result<u8>) -> Result<i64> {
    let mut magnitude: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = next()?;
        if byte & 0x80 == 0 {
            magnitude |= ((byte & 0x3F) as u64) << shift;
            let value = magnitude as i64;
            return Ok(if byte & 0x40 != 0 { -value } else { value });
        }
        magnitude |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if shift >= 63 {
            return Err(DxfError::Parse("Signed modular char exceeds 64 bits".into()));
        }
    }
}

/// Slice-backed byte source used by the decoders above.
pub(crate) struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn next(&mut self) -> Result<u8> {
        let byte = self.data.get(self.pos).copied().ok_or_else(|| {
            DxfError::truncated(self.pos as u64 * 8, 8, (self.data.len() as u64 * 8).saturating_sub(self.pos as u64 * 8))
        })?;
        self.pos += 1;
        Ok(byte)
    }
}

/// Decode a modular short at `pos`; returns the value and the bytes consumed.
pub fn decode_modular_short(data: &[u8], pos: usize) -> Result<(u32, usize)> {
    let mut src = SliceSource::new(data, pos);
    let value = read_modular_short_with(|| src.next())?;
    Ok((value, src.pos() - pos))
}

/// Decode an unsigned modular char at `pos`; returns the value and the bytes consumed.
pub fn decode_modular_char(data: &[u8], pos: usize) -> Result<(u64, usize)> {
    let mut src = SliceSource::new(data, pos);
    let value = read_modular_char_with(|| src.next())?;
    Ok((value, src.pos() - pos))
}

/// Decode a signed modular char at `pos`; returns the value and the bytes consumed.
pub fn decode_signed_modular_char(data: &[u8], pos: usize) -> Result<(i64, usize)> {
    let mut src = SliceSource::new(data, pos);
    let value = read_signed_modular_char_with(|| src.next())?;
    Ok((value, src.pos() - pos))
}
