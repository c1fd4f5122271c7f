//! Bit-level stream writer.
//!
//! The mirror of [`DwgStreamReader`](super::stream_reader::DwgStreamReader):
//! implementors provide bit and byte output, every bit code is a provided
//! method. Encoders always choose the shortest form the code allows.

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::Encoding;

use crate::error::{DxfError, Result};
use crate::io::dwg::modular;
use crate::io::dwg::reference_type::{DwgReferenceType, HandleReference};
use crate::io::dwg::version_features::VersionFeatures;
use crate::types::{Handle, ObjectType, Vector3};

/// Bit-level writer for records and sections.
pub trait DwgStreamWriter {
    /// Layout rules of the revision being written.
    fn features(&self) -> VersionFeatures;

    /// Code page used for TV strings before Unicode revisions.
    fn encoding(&self) -> &'static Encoding;

    /// Number of bits written to the main stream so far.
    fn position_in_bits(&self) -> u64;

    /// **B**
    fn write_bit(&mut self, value: bool) -> Result<()>;

    /// **RC** at the current bit position.
    fn write_byte(&mut self, value: u8) -> Result<()>;

    /// Raw handle reference, to the handle stream if the writer keeps one.
    fn write_handle_reference(&mut self, reference: HandleReference) -> Result<()> {
        let counter = reference.counter();
        self.write_byte((reference.code << 4) | counter)?;
        for i in (0..counter).rev() {
            self.write_byte((reference.value >> (i as u32 * 8)) as u8)?;
        }
        Ok(())
    }

    /// **H**: `target` stored with code `kind`, relative codes measured from
    /// `reference`.
    fn handle_reference_typed(
        &mut self,
        kind: DwgReferenceType,
        target: Handle,
        reference: Handle,
    ) -> Result<()> {
        self.write_handle_reference(HandleReference::encode(kind, target, reference)?)
    }

    /// **H** with code 0.
    fn handle_reference(&mut self, target: Handle) -> Result<()> {
        self.handle_reference_typed(DwgReferenceType::Undefined, target, Handle::NULL)
    }

    /// **BB**
    fn write_2bits(&mut self, value: u8) -> Result<()> {
        self.write_bit(value & 2 != 0)?;
        self.write_bit(value & 1 != 0)
    }

    /// **3B**
    fn write_3bits(&mut self, value: u8) -> Result<()> {
        self.write_bit(value & 4 != 0)?;
        self.write_bit(value & 2 != 0)?;
        self.write_bit(value & 1 != 0)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        bytes.iter().try_for_each(|&b| self.write_byte(b))
    }

    /// **RS**
    fn write_raw_short(&mut self, value: i16) -> Result<()> {
        let mut buf = [0u8; 2];
        LittleEndian::write_i16(&mut buf, value);
        self.write_bytes(&buf)
    }

    /// **RL**
    fn write_raw_long(&mut self, value: i32) -> Result<()> {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.write_bytes(&buf)
    }

    /// **RD**
    fn write_raw_double(&mut self, value: f64) -> Result<()> {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, value);
        self.write_bytes(&buf)
    }

    /// **BS**
    fn write_bit_short(&mut self, value: i16) -> Result<()> {
        match value {
            0 => self.write_2bits(2),
            256 => self.write_2bits(3),
            1..=255 => {
                self.write_2bits(1)?;
                self.write_byte(value as u8)
            }
            _ => {
                self.write_2bits(0)?;
                self.write_raw_short(value)
            }
        }
    }

    /// **BL**
    fn write_bit_long(&mut self, value: i32) -> Result<()> {
        match value {
            0 => self.write_2bits(2),
            1..=255 => {
                self.write_2bits(1)?;
                self.write_byte(value as u8)
            }
            _ => {
                self.write_2bits(0)?;
                self.write_raw_long(value)
            }
        }
    }

    /// **BLL**; eight raw bytes on revisions without it. The 3-bit length
    /// limits BLL values to seven significant bytes.
    fn write_bit_long_long(&mut self, value: i64) -> Result<()> {
        if !self.features().contains(VersionFeatures::BIT_LONG_LONG) {
            let mut buf = [0u8; 8];
            LittleEndian::write_i64(&mut buf, value);
            return self.write_bytes(&buf);
        }
        let unsigned = value as u64;
        let size = (8 - unsigned.leading_zeros() / 8) as u8;
        if size > 7 {
            return Err(DxfError::Encoding(format!(
                "Value {value} does not fit a BitLongLong"
            )));
        }
        self.write_3bits(size)?;
        for i in 0..size {
            self.write_byte((unsigned >> (i as u32 * 8)) as u8)?;
        }
        Ok(())
    }

    /// **BD**
    fn write_bit_double(&mut self, value: f64) -> Result<()> {
        if value.to_bits() == 0f64.to_bits() {
            return self.write_2bits(2);
        }
        if value == 1.0 {
            return self.write_2bits(1);
        }
        self.write_2bits(0)?;
        self.write_raw_double(value)
    }

    /// **DD**: picks the shortest form by comparing the byte runs of
    /// `default` and `value` from the most significant byte down.
    fn write_bit_double_with_default(&mut self, default: f64, value: f64) -> Result<()> {
        if default.to_bits() == value.to_bits() {
            return self.write_2bits(0);
        }

        let def_bytes = default.to_le_bytes();
        let value_bytes = value.to_le_bytes();
        let shared = def_bytes
            .iter()
            .rev()
            .zip(value_bytes.iter().rev())
            .take_while(|(d, v)| d == v)
            .count();

        if shared >= 4 {
            self.write_2bits(1)?;
            self.write_bytes(&value_bytes[0..4])
        } else if shared >= 2 {
            self.write_2bits(2)?;
            self.write_bytes(&value_bytes[4..6])?;
            self.write_bytes(&value_bytes[0..4])
        } else {
            self.write_2bits(3)?;
            self.write_raw_double(value)
        }
    }

    /// **3BD**
    fn write_3bit_double(&mut self, value: Vector3) -> Result<()> {
        self.write_bit_double(value.x)?;
        self.write_bit_double(value.y)?;
        self.write_bit_double(value.z)
    }

    /// **MC**
    fn write_modular_char(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&modular::encode_modular_char(value))
    }

    /// Signed **MC**
    fn write_signed_modular_char(&mut self, value: i64) -> Result<()> {
        self.write_bytes(&modular::encode_signed_modular_char(value))
    }

    /// **MS**
    fn write_modular_short(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&modular::encode_modular_short(value))
    }

    /// **TV**. NUL cannot be stored; readers treat it as a terminator.
    fn write_variable_text(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return self.write_bit_short(0);
        }
        if value.contains('\0') {
            return Err(DxfError::Encoding(format!("Text {value:?} contains NUL")));
        }
        let (length, bytes) = if self.features().contains(VersionFeatures::UNICODE_TEXT) {
            let units: Vec<u16> = value.encode_utf16().collect();
            let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
            (units.len(), bytes)
        } else {
            let (encoded, _, unmappable) = self.encoding().encode(value);
            if unmappable {
                return Err(DxfError::Encoding(format!(
                    "Text {value:?} is not representable in {}",
                    self.encoding().name()
                )));
            }
            (encoded.len(), encoded.into_owned())
        };
        let length = i16::try_from(length)
            .map_err(|_| DxfError::Encoding(format!("Text of {length} units is too long")))?;
        self.write_bit_short(length)?;
        self.write_bytes(&bytes)
    }

    /// **OT**
    fn write_object_type(&mut self, value: ObjectType) -> Result<()> {
        let raw = value.value();
        if !self.features().contains(VersionFeatures::OBJECT_TYPE_OT) {
            return self.write_bit_short(raw);
        }
        match raw {
            0..=0xFF => {
                self.write_2bits(0)?;
                self.write_byte(raw as u8)
            }
            0x1F0..=0x2EF => {
                self.write_2bits(1)?;
                self.write_byte((raw - 0x1F0) as u8)
            }
            _ => {
                self.write_2bits(2)?;
                self.write_raw_short(raw)
            }
        }
    }
}

/// Bit cursor over a growable buffer. Bits past the cursor are preserved,
/// so the writer can seek back and patch earlier fields.
#[derive(Debug, Clone)]
pub struct DwgBitWriter {
    buffer: Vec<u8>,
    position: u64,
    length: u64,
    features: VersionFeatures,
    encoding: &'static Encoding,
}

impl DwgBitWriter {
    pub fn new(features: VersionFeatures) -> Self {
        Self {
            buffer: Vec::new(),
            position: 0,
            length: 0,
            features,
            encoding: encoding_rs::WINDOWS_1252,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Total bits written (the high-water mark, not the cursor).
    pub fn length_in_bits(&self) -> u64 {
        self.length
    }

    /// Move the cursor to an already written position.
    pub fn set_position_in_bits(&mut self, position: u64) -> Result<()> {
        if position > self.length {
            return Err(DxfError::Parse(format!(
                "Cannot seek to bit {position} past written length {}",
                self.length
            )));
        }
        self.position = position;
        Ok(())
    }

    /// Overwrite an **RL** at `position` and return to the end.
    pub fn patch_raw_long(&mut self, position: u64, value: i32) -> Result<()> {
        self.set_position_in_bits(position)?;
        self.write_raw_long(value)?;
        self.position = self.length;
        Ok(())
    }

    /// Append the first `bits` bits of `other`.
    pub fn append_bits(&mut self, other: &[u8], bits: u64) -> Result<()> {
        let whole = (bits / 8) as usize;
        self.write_bytes(&other[..whole.min(other.len())])?;
        for i in (whole as u64 * 8)..bits {
            let byte = other[(i >> 3) as usize];
            self.write_bit((byte >> (7 - (i & 7))) & 1 == 1)?;
        }
        Ok(())
    }

    /// The buffer, with the last partial byte zero padded.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl DwgStreamWriter for DwgBitWriter {
    fn features(&self) -> VersionFeatures {
        self.features
    }

    fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn position_in_bits(&self) -> u64 {
        self.position
    }

    fn write_bit(&mut self, value: bool) -> Result<()> {
        let index = (self.position >> 3) as usize;
        if index == self.buffer.len() {
            self.buffer.push(0);
        }
        let mask = 0x80u8 >> (self.position & 7);
        if value {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
        self.position += 1;
        self.length = self.length.max(self.position);
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<()> {
        if self.position & 7 == 0 && self.position == self.length {
            self.buffer.push(value);
            self.position += 8;
            self.length = self.position;
            return Ok(());
        }
        for i in (0..8).rev() {
            self.write_bit((value >> i) & 1 == 1)?;
        }
        Ok(())
    }
}

/// Writer that sends data fields to a main stream and handle references to
/// a separate handle stream, joined when the record is assembled.
#[derive(Debug, Clone)]
pub struct DwgMergedWriter {
    main: DwgBitWriter,
    handles: DwgBitWriter,
}

impl DwgMergedWriter {
    pub fn new(features: VersionFeatures, encoding: &'static Encoding) -> Self {
        Self {
            main: DwgBitWriter::new(features).with_encoding(encoding),
            handles: DwgBitWriter::new(features).with_encoding(encoding),
        }
    }

    pub fn main_mut(&mut self) -> &mut DwgBitWriter {
        &mut self.main
    }

    /// Split into `(main, handles)`.
    pub fn into_parts(self) -> (DwgBitWriter, DwgBitWriter) {
        (self.main, self.handles)
    }
}

impl DwgStreamWriter for DwgMergedWriter {
    fn features(&self) -> VersionFeatures {
        self.main.features()
    }

    fn encoding(&self) -> &'static Encoding {
        self.main.encoding()
    }

    fn position_in_bits(&self) -> u64 {
        self.main.position_in_bits()
    }

    fn write_bit(&mut self, value: bool) -> Result<()> {
        self.main.write_bit(value)
    }

    fn write_byte(&mut self, value: u8) -> Result<()> {
        self.main.write_byte(value)
    }

    fn write_handle_reference(&mut self, reference: HandleReference) -> Result<()> {
        self.handles.write_handle_reference(reference)
    }
}
