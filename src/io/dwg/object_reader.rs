//! Object record reader, the inverse of
//! [`DwgObjectWriter`](super::object_writer::DwgObjectWriter).
//!
//! Plain fields are applied to the new object right away; handle and name
//! references go into the template's pending slots for pass 2.

use ahash::AHashMap;
use encoding_rs::Encoding;

use crate::document::ObjectCatalog;
use crate::error::{DxfError, Result};
use crate::io::dwg::framing::Unframed;
use crate::io::dwg::stream_reader::{DwgBitReader, DwgMergedReader, DwgStreamReader};
use crate::io::dwg::version_features::VersionFeatures;
use crate::io::field::{FieldKind, FieldValue};
use crate::io::template::{PendingReference, Template};
use crate::types::{Handle, ObjectType};

/// What a record decoded to.
#[derive(Debug)]
pub enum RecordOutcome {
    Template(Template),
    /// The catalog has no kind for the type tag; the record was not decoded
    /// past its handle.
    Unknown { object_type: ObjectType, handle: Handle },
}

pub struct DwgObjectReader<'c> {
    catalog: &'c dyn ObjectCatalog,
    features: VersionFeatures,
    encoding: &'static Encoding,
}

impl<'c> DwgObjectReader<'c> {
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

    /// Decode an unframed record.
    pub fn read_record(&self, record: &Unframed) -> Result<RecordOutcome> {
        let payload = record.payload.as_slice();
        let total_bits = payload.len() as u64 * 8;

        let mut main = DwgBitReader::new(payload, self.features).with_encoding(self.encoding);
        let object_type = main.read_object_type()?;

        let main_bits = if self.features.contains(VersionFeatures::OBJECT_SIZE_IN_BITS) {
            let size = main.read_raw_long()?;
            u64::try_from(size)
                .map_err(|_| DxfError::Parse(format!("Negative data stream size {size}")))?
        } else {
            record.main_stream_bits().unwrap_or(total_bits)
        };
        main.set_end_in_bits(main_bits)?;

        let handle = main.handle_reference()?;
        let Some(mut object) = self.catalog.create(object_type) else {
            return Ok(RecordOutcome::Unknown { object_type, handle });
        };
        object.set_handle(handle);

        skip_extended_data(&mut main)?;

        if self.catalog.is_entity(object_type) && main.read_bit()? {
            let size = if self.features.contains(VersionFeatures::BIT_LONG_LONG) {
                main.read_bit_long_long()?
            } else {
                main.read_raw_long()? as i64
            };
            let size = usize::try_from(size)
                .map_err(|_| DxfError::Parse(format!("Negative graphic data size {size}")))?;
            main.read_bytes(size)?;
        }

        let reactor_count = main.read_bit_long()?;
        let reactor_count = usize::try_from(reactor_count)
            .map_err(|_| DxfError::Parse(format!("Negative reactor count {reactor_count}")))?;
        let xdictionary_missing =
            self.features.contains(VersionFeatures::XDICTIONARY_FLAG) && main.read_bit()?;
        if self.features.contains(VersionFeatures::DATA_STORE_FLAG) {
            main.read_bit()?;
        }

        let mut handles = DwgBitReader::new(payload, self.features).with_encoding(self.encoding);
        handles.set_position_in_bits(main_bits)?;
        let mut reader = DwgMergedReader::new(main, handles);

        let mut template = Template::new(object);
        template.owner_handle = reader.handle_reference_typed(handle)?.0.non_null();
        for _ in 0..reactor_count {
            let (reactor, _) = reader.handle_reference_typed(handle)?;
            template.reactor_handles.push(reactor);
        }
        if self.features.contains(VersionFeatures::XDICTIONARY_FLAG) && !xdictionary_missing {
            // extension dictionaries are not part of the object model
            reader.handle_reference_typed(handle)?;
        }

        let mut doubles: AHashMap<i32, f64> = AHashMap::new();
        for descriptor in self.catalog.fields(object_type) {
            let code = descriptor.code;
            let value = match descriptor.kind {
                FieldKind::Subclass(_) | FieldKind::Count { .. } => continue,
                FieldKind::Bool => FieldValue::Bool(reader.read_bit()?),
                FieldKind::Int16 => FieldValue::Int16(reader.read_bit_short()?),
                FieldKind::Int32 => FieldValue::Int32(reader.read_bit_long()?),
                FieldKind::Int64 => FieldValue::Int64(reader.read_bit_long_long()?),
                FieldKind::Double => {
                    let v = reader.read_bit_double()?;
                    doubles.insert(code, v);
                    FieldValue::Double(v)
                }
                FieldKind::RawDouble => {
                    let v = reader.read_raw_double()?;
                    doubles.insert(code, v);
                    FieldValue::Double(v)
                }
                FieldKind::DoubleWithDefault { default_code } => {
                    let default = doubles.get(&default_code).copied().unwrap_or(0.0);
                    let v = reader.read_bit_double_with_default(default)?;
                    doubles.insert(code, v);
                    FieldValue::Double(v)
                }
                FieldKind::Point3 => FieldValue::Point(reader.read_3bit_double()?),
                FieldKind::Text => FieldValue::Text(reader.read_variable_text()?),
                FieldKind::Binary => {
                    let length = reader.read_bit_long()?;
                    let length = usize::try_from(length)
                        .map_err(|_| DxfError::Parse(format!("Negative binary length {length}")))?;
                    FieldValue::Binary(reader.read_bytes(length)?)
                }
                FieldKind::Handle(_) | FieldKind::NameReference { .. } => {
                    let (target, _) = reader.handle_reference_typed(handle)?;
                    if target.is_valid() {
                        template.pending.insert(code, PendingReference::Handle(target));
                    }
                    continue;
                }
                FieldKind::HandleList(_) => {
                    let n = reader.read_bit_long()?;
                    let n = usize::try_from(n)
                        .map_err(|_| DxfError::Parse(format!("Negative handle count {n}")))?;
                    let mut list = Vec::with_capacity(n.min(4096));
                    for _ in 0..n {
                        list.push(reader.handle_reference_typed(handle)?.0);
                    }
                    template.pending.insert(code, PendingReference::Handles(list));
                    continue;
                }
            };
            template.object_mut().apply_field(code, value);
        }

        Ok(RecordOutcome::Template(template))
    }
}

/// Skip `BS size | H application | bytes` blocks up to a zero size.
fn skip_extended_data(reader: &mut DwgBitReader<'_>) -> Result<()> {
    loop {
        let size = reader.read_bit_short()?;
        if size == 0 {
            return Ok(());
        }
        let size = usize::try_from(size)
            .map_err(|_| DxfError::Parse(format!("Negative extended data size {size}")))?;
        reader.handle_reference()?;
        reader.read_bytes(size)?;
    }
}
