//! Bit-level stream reader.
//!
//! Binary records are **bit-aligned**: every read advances a bit cursor by
//! a value-type-dependent number of bits. The bit codes are:
//!
//! - **B** bit, **BB** 2-bit code, **3B** 3-bit code
//! - **BS** BitShort, **BL** BitLong, **BLL** BitLongLong
//! - **BD** BitDouble, **DD** BitDouble with default, **3BD** three BDs
//! - **RC/RS/RL/RD** raw char/short/long/double (little-endian)
//! - **MC** modular char, **MS** modular short
//! - **H** handle reference, **TV** variable text, **OT** object type
//!
//! Implementors provide bit and byte access; every code above is a provided
//! method that consults [`VersionFeatures`] for revision-dependent rules.

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::Encoding;

use crate::error::{DxfError, Result};
use crate::io::dwg::modular;
use crate::io::dwg::reference_type::{DwgReferenceType, HandleReference};
use crate::io::dwg::version_features::VersionFeatures;
use crate::types::{Handle, ObjectType, Vector3};

/// Largest byte run a single read may request.
const MAX_READ_LENGTH: usize = 16 * 1024 * 1024;

/// Bit-level reader over a record or section.
pub trait DwgStreamReader {
    /// Layout rules of the revision being read.
    fn features(&self) -> VersionFeatures;

    /// Code page used for TV strings before Unicode revisions.
    fn encoding(&self) -> &'static Encoding;

    /// Cursor position in bits from the start of the buffer.
    fn position_in_bits(&self) -> u64;

    /// Move the cursor.
    fn set_position_in_bits(&mut self, position: u64) -> Result<()>;

    /// **B**
    fn read_bit(&mut self) -> Result<bool>;

    /// **RC** at the current bit position.
    fn read_byte(&mut self) -> Result<u8>;

    /// Raw handle reference (code + value), from the handle stream if the
    /// reader keeps one.
    fn read_handle_reference(&mut self) -> Result<HandleReference> {
        let form = self.read_byte()?;
        let code = form >> 4;
        let counter = (form & 0x0F) as usize;
        if counter > 8 {
            return Err(DxfError::Parse(format!(
                "Handle byte count {counter} exceeds maximum of 8"
            )));
        }
        let mut value = 0u64;
        for _ in 0..counter {
            value = (value << 8) | self.read_byte()? as u64;
        }
        Ok(HandleReference { code, value })
    }

    /// **H** resolved against `reference`.
    fn handle_reference_typed(&mut self, reference: Handle) -> Result<(Handle, DwgReferenceType)> {
        let raw = self.read_handle_reference()?;
        let kind = raw.reference_type().ok_or_else(|| {
            DxfError::Parse(format!("Invalid handle reference code: {:#X}", raw.code))
        })?;
        Ok((raw.resolve(reference)?, kind))
    }

    /// **H** with an absolute code.
    fn handle_reference(&mut self) -> Result<Handle> {
        Ok(self.handle_reference_typed(Handle::NULL)?.0)
    }

    /// **BB**
    fn read_2bits(&mut self) -> Result<u8> {
        let hi = self.read_bit()? as u8;
        let lo = self.read_bit()? as u8;
        Ok((hi << 1) | lo)
    }

    /// **3B**
    fn read_3bits(&mut self) -> Result<u8> {
        let mut value = 0u8;
        for _ in 0..3 {
            value = (value << 1) | self.read_bit()? as u8;
        }
        Ok(value)
    }

    fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        if length > MAX_READ_LENGTH {
            return Err(DxfError::Parse(format!(
                "Requested byte read of {length} exceeds sanity limit"
            )));
        }
        (0..length).map(|_| self.read_byte()).collect()
    }

    /// **RS**
    fn read_raw_short(&mut self) -> Result<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(LittleEndian::read_i16(&bytes))
    }

    /// **RL**
    fn read_raw_long(&mut self) -> Result<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(LittleEndian::read_i32(&bytes))
    }

    /// **RD**
    fn read_raw_double(&mut self) -> Result<f64> {
        let bytes = self.read_bytes(8)?;
        Ok(LittleEndian::read_f64(&bytes))
    }

    /// **BS**
    fn read_bit_short(&mut self) -> Result<i16> {
        match self.read_2bits()? {
            0 => self.read_raw_short(),
            1 => Ok(self.read_byte()? as i16),
            2 => Ok(0),
            _ => Ok(256),
        }
    }

    /// **BL**
    fn read_bit_long(&mut self) -> Result<i32> {
        match self.read_2bits()? {
            0 => self.read_raw_long(),
            1 => Ok(self.read_byte()? as i32),
            2 => Ok(0),
            _ => Err(DxfError::Parse("Invalid BitLong code 11".into())),
        }
    }

    /// **BLL**; eight raw bytes on revisions without it.
    fn read_bit_long_long(&mut self) -> Result<i64> {
        if !self.features().contains(VersionFeatures::BIT_LONG_LONG) {
            let bytes = self.read_bytes(8)?;
            return Ok(LittleEndian::read_i64(&bytes));
        }
        let size = self.read_3bits()?;
        let mut value = 0u64;
        for i in 0..size {
            value |= (self.read_byte()? as u64) << (i as u64 * 8);
        }
        Ok(value as i64)
    }

    /// **BD**
    fn read_bit_double(&mut self) -> Result<f64> {
        match self.read_2bits()? {
            0 => self.read_raw_double(),
            1 => Ok(1.0),
            2 => Ok(0.0),
            _ => Err(DxfError::Parse("Invalid BitDouble code 11".into())),
        }
    }

    /// **DD**: 00 keeps `default`, 01 patches bytes 0-3, 10 patches bytes
    /// 4-5 then 0-3, 11 reads a full RD.
    fn read_bit_double_with_default(&mut self, default: f64) -> Result<f64> {
        let mut arr = default.to_le_bytes();
        match self.read_2bits()? {
            0 => Ok(default),
            1 => {
                for slot in arr.iter_mut().take(4) {
                    *slot = self.read_byte()?;
                }
                Ok(f64::from_le_bytes(arr))
            }
            2 => {
                arr[4] = self.read_byte()?;
                arr[5] = self.read_byte()?;
                for slot in arr.iter_mut().take(4) {
                    *slot = self.read_byte()?;
                }
                Ok(f64::from_le_bytes(arr))
            }
            _ => self.read_raw_double(),
        }
    }

    /// **3BD**
    fn read_3bit_double(&mut self) -> Result<Vector3> {
        Ok(Vector3::new(
            self.read_bit_double()?,
            self.read_bit_double()?,
            self.read_bit_double()?,
        ))
    }

    /// **MC**
    fn read_modular_char(&mut self) -> Result<u64> {
        modular::read_modular_char_with(|| self.read_byte())
    }

    /// Signed **MC**
    fn read_signed_modular_char(&mut self) -> Result<i64> {
        modular::read_signed_modular_char_with(|| self.read_byte())
    }

    /// **MS**
    fn read_modular_short(&mut self) -> Result<u32> {
        modular::read_modular_short_with(|| self.read_byte())
    }

    /// **TV**: BS length, then UTF-16LE code units on Unicode revisions or
    /// code page bytes before them. NUL characters are terminators and are
    /// dropped, which is why the writer refuses text containing them.
    fn read_variable_text(&mut self) -> Result<String> {
        let length = self.read_bit_short()?;
        if length < 0 {
            return Err(DxfError::Parse(format!("Negative text length {length}")));
        }
        if length == 0 {
            return Ok(String::new());
        }
        let length = length as usize;
        let text = if self.features().contains(VersionFeatures::UNICODE_TEXT) {
            let bytes = self.read_bytes(length * 2)?;
            let (decoded, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(&bytes);
            decoded.into_owned()
        } else {
            let bytes = self.read_bytes(length)?;
            let (decoded, _, _) = self.encoding().decode(&bytes);
            decoded.into_owned()
        };
        Ok(text.replace('\0', ""))
    }

    /// **OT**: BS before R2010, two-bit-prefixed form from R2010.
    fn read_object_type(&mut self) -> Result<ObjectType> {
        if !self.features().contains(VersionFeatures::OBJECT_TYPE_OT) {
            return Ok(ObjectType(self.read_bit_short()?));
        }
        let value = match self.read_2bits()? {
            0 => self.read_byte()? as i16,
            1 => 0x1F0 + self.read_byte()? as i16,
            _ => self.read_raw_short()?,
        };
        Ok(ObjectType(value))
    }
}

/// Bit cursor over a borrowed byte buffer, bounded by an end position.
#[derive(Debug, Clone)]
pub struct DwgBitReader<'a> {
    data: &'a [u8],
    position: u64,
    end: u64,
    features: VersionFeatures,
    encoding: &'static Encoding,
}

impl<'a> DwgBitReader<'a> {
    pub fn new(data: &'a [u8], features: VersionFeatures) -> Self {
        Self {
            data,
            position: 0,
            end: data.len() as u64 * 8,
            features,
            encoding: encoding_rs::WINDOWS_1252,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Reads past `end` fail with `TruncatedStream`.
    pub fn set_end_in_bits(&mut self, end: u64) -> Result<()> {
        let limit = self.data.len() as u64 * 8;
        if end > limit {
            return Err(DxfError::truncated(
                self.position,
                end.saturating_sub(self.position),
                limit.saturating_sub(self.position),
            ));
        }
        self.end = end;
        Ok(())
    }

    pub fn end_in_bits(&self) -> u64 {
        self.end
    }

    pub fn remaining_bits(&self) -> u64 {
        self.end.saturating_sub(self.position)
    }

    fn ensure(&self, bits: u64) -> Result<()> {
        if self.position + bits > self.end {
            return Err(DxfError::truncated(self.position, bits, self.remaining_bits()));
        }
        Ok(())
    }
}

impl DwgStreamReader for DwgBitReader<'_> {
    fn features(&self) -> VersionFeatures {
        self.features
    }

    fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn position_in_bits(&self) -> u64 {
        self.position
    }

    fn set_position_in_bits(&mut self, position: u64) -> Result<()> {
        if position > self.end {
            return Err(DxfError::truncated(position, 0, 0));
        }
        self.position = position;
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.ensure(1)?;
        let byte = self.data[(self.position >> 3) as usize];
        let bit = (byte >> (7 - (self.position & 7))) & 1;
        self.position += 1;
        Ok(bit == 1)
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.ensure(8)?;
        let index = (self.position >> 3) as usize;
        let shift = (self.position & 7) as u32;
        let value = if shift == 0 {
            self.data[index]
        } else {
            (self.data[index] << shift) | (self.data[index + 1] >> (8 - shift))
        };
        self.position += 8;
        Ok(value)
    }
}

/// Reader that takes data fields from one cursor and handle references from
/// a second cursor over the record's handle stream.
#[derive(Debug, Clone)]
pub struct DwgMergedReader<'a> {
    main: DwgBitReader<'a>,
    handles: DwgBitReader<'a>,
}

impl<'a> DwgMergedReader<'a> {
    pub fn new(main: DwgBitReader<'a>, handles: DwgBitReader<'a>) -> Self {
        Self { main, handles }
    }

    pub fn main(&self) -> &DwgBitReader<'a> {
        &self.main
    }

    pub fn handles(&self) -> &DwgBitReader<'a> {
        &self.handles
    }
}

impl DwgStreamReader for DwgMergedReader<'_> {
    fn features(&self) -> VersionFeatures {
        self.main.features()
    }

    fn encoding(&self) -> &'static Encoding {
        self.main.encoding()
    }

    fn position_in_bits(&self) -> u64 {
        self.main.position_in_bits()
    }

    fn set_position_in_bits(&mut self, position: u64) -> Result<()> {
        self.main.set_position_in_bits(position)
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.main.read_bit()
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.main.read_byte()
    }

    fn read_handle_reference(&mut self) -> Result<HandleReference> {
        self.handles.read_handle_reference()
    }
}
