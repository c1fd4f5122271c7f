//! Object record writer.
//!
//! A record is laid out as a data stream followed by a handle stream:
//!
//! ```text
//! OT type | [RL data size in bits] | H own handle | BS 0 (no EED)
//!   | [B graphic present] | BL reactor count | [B no xdictionary] | [B data store]
//!   | data fields...
//! H owner | H reactors... | handle fields...
//! ```
//!
//! Field order and bit codes come from the kind's field table.

use ahash::AHashMap;
use encoding_rs::Encoding;

use crate::document::{CadObject, ObjectCatalog};
use crate::error::{DxfError, Result};
use crate::io::dwg::crc::OBJECT_SEED;
use crate::io::dwg::framing::frame;
use crate::io::dwg::reference_type::{DwgReferenceType, HandleReference};
use crate::io::dwg::stream_writer::{DwgMergedWriter, DwgStreamWriter};
use crate::io::dwg::version_features::VersionFeatures;
use crate::io::field::{FieldDescriptor, FieldKind, FieldValue};
use crate::types::Handle;

/// Serializes live objects into framed records.
pub struct DwgObjectWriter<'c> {
    catalog: &'c dyn ObjectCatalog,
    features: VersionFeatures,
    encoding: &'static Encoding,
}

impl<'c> DwgObjectWriter<'c> {
    pub fn new(catalog: &'c dyn ObjectCatalog, features: VersionFeatures) -> Self {
        Self {
            catalog,
            features,
            encoding: encoding_rs::WINDOWS_1252,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Encode and frame one object.
    pub fn write_record(&self, object: &dyn CadObject) -> Result<Vec<u8>> {
        let (payload, handle_stream_bits) = self.encode_payload(object)?;
        frame(&payload, handle_stream_bits, OBJECT_SEED, self.features)
    }

    /// Encode the record payload; returns it with the bit length of the
    /// handle stream (including the padding of the last byte).
    pub fn encode_payload(&self, object: &dyn CadObject) -> Result<(Vec<u8>, u64)> {
        let object_type = object.object_type();
        let handle = object.handle();
        if !object_type.is_writable() {
            return Err(DxfError::UnknownObjectType(format!(
                "Object {handle} has {object_type}, which cannot be written"
            )));
        }
        if handle.is_null() {
            return Err(DxfError::StructuralViolation(format!(
                "Object of {object_type} has no handle"
            )));
        }

        let mut writer = DwgMergedWriter::new(self.features, self.encoding);
        writer.write_object_type(object_type)?;

        let size_position = writer.position_in_bits();
        if self.features.contains(VersionFeatures::OBJECT_SIZE_IN_BITS) {
            writer.write_raw_long(0)?;
        }

        // The own handle lives in the data stream.
        writer.main_mut().handle_reference(handle)?;
        writer.write_bit_short(0)?;

        if self.catalog.is_entity(object_type) {
            writer.write_bit(false)?;
        }

        let reactors = object.reactors();
        writer.write_bit_long(count(reactors.len())?)?;
        if self.features.contains(VersionFeatures::XDICTIONARY_FLAG) {
            writer.write_bit(true)?;
        }
        if self.features.contains(VersionFeatures::DATA_STORE_FLAG) {
            writer.write_bit(false)?;
        }

        let owner = object.owner().unwrap_or(Handle::NULL);
        writer.handle_reference_typed(DwgReferenceType::SoftPointer, owner, handle)?;
        for &reactor in reactors {
            writer.handle_reference_typed(DwgReferenceType::SoftPointer, reactor, handle)?;
        }

        let values: AHashMap<i32, FieldValue> = object.fields().into_iter().collect();
        let mut doubles = AHashMap::new();
        for descriptor in self.catalog.fields(object_type) {
            let fallback;
            let value = match values.get(&descriptor.code) {
                Some(v) => v,
                None => match FieldValue::default_for(&descriptor.kind) {
                    Some(v) => {
                        fallback = v;
                        &fallback
                    }
                    None => continue,
                },
            };
            write_field(&mut writer, descriptor, value, handle, &mut doubles)?;
        }

        let (mut main, handles) = writer.into_parts();
        let main_bits = main.length_in_bits();
        if self.features.contains(VersionFeatures::OBJECT_SIZE_IN_BITS) {
            let size = i32::try_from(main_bits)
                .map_err(|_| DxfError::Encoding(format!("Object {handle} data stream is too long")))?;
            main.patch_raw_long(size_position, size)?;
        }
        main.append_bits(handles.bytes(), handles.length_in_bits())?;

        let payload = main.into_bytes();
        let handle_stream_bits = payload.len() as u64 * 8 - main_bits;
        Ok((payload, handle_stream_bits))
    }
}

fn count(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| DxfError::Encoding(format!("List of {len} entries is too long")))
}

fn mismatch(descriptor: &FieldDescriptor, value: &FieldValue) -> DxfError {
    DxfError::Encoding(format!(
        "Field {} ({}) cannot hold {value:?}",
        descriptor.code, descriptor.name
    ))
}

/// Write `target` with the field's code, falling back to a soft pointer when
/// a relative code cannot reach it.
fn write_handle<W: DwgStreamWriter>(
    writer: &mut W,
    kind: DwgReferenceType,
    target: Handle,
    reference: Handle,
) -> Result<()> {
    let encoded = HandleReference::encode(kind, target, reference)
        .or_else(|_| HandleReference::encode(DwgReferenceType::SoftPointer, target, reference))?;
    writer.write_handle_reference(encoded)
}

fn write_field(
    writer: &mut DwgMergedWriter,
    descriptor: &FieldDescriptor,
    value: &FieldValue,
    own: Handle,
    doubles: &mut AHashMap<i32, f64>,
) -> Result<()> {
    match (&descriptor.kind, value) {
        (FieldKind::Subclass(_) | FieldKind::Count { .. }, _) => {}
        (FieldKind::Bool, FieldValue::Bool(v)) => writer.write_bit(*v)?,
        (FieldKind::Int16, FieldValue::Int16(v)) => writer.write_bit_short(*v)?,
        (FieldKind::Int32, FieldValue::Int32(v)) => writer.write_bit_long(*v)?,
        (FieldKind::Int64, FieldValue::Int64(v)) => writer.write_bit_long_long(*v)?,
        (FieldKind::Double, FieldValue::Double(v)) => {
            writer.write_bit_double(*v)?;
            doubles.insert(descriptor.code, *v);
        }
        (FieldKind::RawDouble, FieldValue::Double(v)) => {
            writer.write_raw_double(*v)?;
            doubles.insert(descriptor.code, *v);
        }
        (FieldKind::DoubleWithDefault { default_code }, FieldValue::Double(v)) => {
            let default = doubles.get(default_code).copied().unwrap_or(0.0);
            writer.write_bit_double_with_default(default, *v)?;
            doubles.insert(descriptor.code, *v);
        }
        (FieldKind::Point3, FieldValue::Point(p)) => writer.write_3bit_double(*p)?,
        (FieldKind::Text, FieldValue::Text(s)) => writer.write_variable_text(s)?,
        (FieldKind::Binary, FieldValue::Binary(bytes)) => {
            writer.write_bit_long(count(bytes.len())?)?;
            writer.write_bytes(bytes)?;
        }
        (FieldKind::Handle(kind), FieldValue::Handle(h)) => write_handle(writer, *kind, *h, own)?,
        (FieldKind::NameReference { .. }, FieldValue::Handle(h)) => {
            write_handle(writer, DwgReferenceType::SoftPointer, *h, own)?
        }
        (FieldKind::HandleList(kind), FieldValue::Handles(list)) => {
            writer.write_bit_long(count(list.len())?)?;
            for h in list {
                write_handle(writer, *kind, *h, own)?;
            }
        }
        _ => return Err(mismatch(descriptor, value)),
    }
    Ok(())
}
