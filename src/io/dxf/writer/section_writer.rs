//! DXF section writers
//!
//! The HEADER section carries `$ACADVER` and `$HANDSEED`; the OBJECTS
//! section carries every object of the document, rendered from its kind's
//! field table.

use ahash::AHashMap;

use super::stream_writer::{DxfStreamWriter, DxfStreamWriterExt};
use crate::document::{CadDocument, CadObject, ObjectCatalog};
use crate::error::{DxfError, Result};
use crate::io::field::{FieldDescriptor, FieldKind, FieldValue};
use crate::types::{DxfVersion, Handle};

/// Writes all DXF sections
pub struct SectionWriter<'a, W: DxfStreamWriter> {
    writer: &'a mut W,
}

impl<'a, W: DxfStreamWriter> SectionWriter<'a, W> {
    /// Create a new section writer
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    /// Write the HEADER section
    pub fn write_header(&mut self, document: &CadDocument) -> Result<()> {
        if document.version == DxfVersion::Unknown {
            return Err(DxfError::UnsupportedVersion(document.version.to_string()));
        }

        self.writer.write_section_start("HEADER")?;
        self.writer.write_string(9, "$ACADVER")?;
        self.writer.write_string(1, document.version.as_str())?;
        self.writer.write_string(9, "$HANDSEED")?;
        self.writer.write_handle(5, document.handle_seed())?;
        self.writer.write_section_end()
    }

    /// Write the OBJECTS section
    pub fn write_objects(&mut self, document: &CadDocument, catalog: &dyn ObjectCatalog) -> Result<()> {
        self.writer.write_section_start("OBJECTS")?;
        for object in document.objects() {
            self.write_object(object, document, catalog)?;
        }
        tracing::debug!(objects = document.len(), "wrote OBJECTS section");
        self.writer.write_section_end()
    }

    fn write_object(&mut self, object: &dyn CadObject, document: &CadDocument, catalog: &dyn ObjectCatalog) -> Result<()> {
        let object_type = object.object_type();
        let name = catalog
            .dxf_name(object_type)
            .ok_or_else(|| DxfError::UnknownObjectType(format!("{object_type} has no DXF name")))?;

        self.writer.write_string(0, name)?;
        self.writer.write_handle(5, object.handle())?;

        if !object.reactors().is_empty() {
            self.writer.write_string(102, "{ACAD_REACTORS")?;
            for reactor in object.reactors() {
                self.writer.write_handle(330, *reactor)?;
            }
            self.writer.write_string(102, "}")?;
        }
        self.writer.write_handle(330, object.owner().unwrap_or(Handle::NULL))?;

        let values: AHashMap<i32, FieldValue> = object.fields().into_iter().collect();
        for descriptor in catalog.fields(object_type) {
            match descriptor.kind {
                FieldKind::Subclass(marker) => self.writer.write_subclass(marker)?,
                FieldKind::Count { list_code } => {
                    let count = match values.get(&list_code) {
                        Some(FieldValue::Handles(list)) => list.len(),
                        _ => 0,
                    };
                    let count = i32::try_from(count)
                        .map_err(|_| DxfError::Encoding(format!("List {list_code} is too long")))?;
                    self.writer.write_i32(descriptor.code, count)?;
                }
                _ => {
                    let value = values
                        .get(&descriptor.code)
                        .cloned()
                        .or_else(|| FieldValue::default_for(&descriptor.kind));
                    if let Some(value) = value {
                        self.write_field(descriptor, &value, document)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_field(&mut self, descriptor: &FieldDescriptor, value: &FieldValue, document: &CadDocument) -> Result<()> {
        let code = descriptor.code;
        let fits = matches!(
            (&descriptor.kind, value),
            (FieldKind::Bool, FieldValue::Bool(_))
                | (FieldKind::Int16, FieldValue::Int16(_))
                | (FieldKind::Int32, FieldValue::Int32(_))
                | (FieldKind::Int64, FieldValue::Int64(_))
                | (
                    FieldKind::Double | FieldKind::RawDouble | FieldKind::DoubleWithDefault { .. },
                    FieldValue::Double(_)
                )
                | (FieldKind::Point3, FieldValue::Point(_))
                | (FieldKind::Text | FieldKind::NameReference { .. }, FieldValue::Text(_))
                | (FieldKind::Binary, FieldValue::Binary(_))
                | (FieldKind::Handle(_), FieldValue::Handle(_))
                | (FieldKind::HandleList(_), FieldValue::Handles(_))
        );

        match (&descriptor.kind, value) {
            (FieldKind::NameReference { .. }, FieldValue::Handle(h)) => {
                let name = document.get(*h).and_then(|o| o.name()).unwrap_or("");
                self.writer.write_string(code, name)
            }
            _ if fits => self.writer.write_value(code, value),
            (kind, value) => Err(DxfError::Encoding(format!(
                "Field {} (code {code}) is {kind:?} but holds {value:?}",
                descriptor.name
            ))),
        }
    }
}
