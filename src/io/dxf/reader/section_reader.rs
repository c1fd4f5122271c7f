//! DXF section readers
//!
//! The HEADER section supplies the revision and the handle seed. Every
//! record of the TABLES, BLOCKS, ENTITIES and OBJECTS sections becomes a
//! [`Template`] handed to the [`DocumentBuilder`]; references stay as
//! handles or names until pass 2.

use ahash::AHashMap;

use super::stream_reader::{DxfCodePair, DxfStreamReader};
use crate::error::{DxfError, Result};
use crate::io::builder::DocumentBuilder;
use crate::io::field::{descriptor_for, FieldDescriptor, FieldKind, FieldValue};
use crate::io::template::{PendingReference, Template};
use crate::notification::{DiagnosticKind, Notification, NotificationType};
use crate::types::{DxfVersion, Handle, Vector3};

const REACTORS_GROUP: &str = "{ACAD_REACTORS";

/// Markers that open and close tables and blocks. They are read as
/// records only when the catalog has a kind for them.
const FRAMING_MARKERS: [&str; 4] = ["TABLE", "ENDTAB", "BLOCK", "ENDBLK"];

/// Values that span several pairs, collected until the object ends.
#[derive(Default)]
struct PartialValues {
    points: AHashMap<i32, Vector3>,
    binary: AHashMap<i32, Vec<u8>>,
    handle_lists: AHashMap<i32, Vec<Handle>>,
}

/// Section reader for parsing DXF sections
pub struct SectionReader<'a, 'c, R: DxfStreamReader> {
    reader: &'a mut R,
    builder: &'a mut DocumentBuilder<'c>,
}

impl<'a, 'c, R: DxfStreamReader> SectionReader<'a, 'c, R> {
    pub fn new(reader: &'a mut R, builder: &'a mut DocumentBuilder<'c>) -> Self {
        Self { reader, builder }
    }

    /// Next pair, with comments turned into informational notifications.
    pub fn next_pair(&mut self) -> Result<Option<DxfCodePair>> {
        loop {
            match self.reader.read_pair()? {
                Some(pair) if pair.code == 999 => {
                    let n = Notification::new(
                        NotificationType::Info,
                        DiagnosticKind::Other,
                        format!("Comment: {}", pair.value_string),
                    )
                    .with_offset(self.reader.position());
                    self.builder.notifications_mut().report(n)?;
                }
                other => return Ok(other),
            }
        }
    }

    /// Record a notification at the current position.
    pub fn report(&mut self, notification_type: NotificationType, kind: DiagnosticKind, message: String) -> Result<()> {
        self.notify(notification_type, kind, Handle::NULL, message)
    }

    fn notify(&mut self, notification_type: NotificationType, kind: DiagnosticKind, handle: Handle, message: String) -> Result<()> {
        let mut n = Notification::new(notification_type, kind, message).with_offset(self.reader.position());
        if handle.is_valid() {
            n = n.with_handle(handle);
        }
        self.builder.notifications_mut().report(n)
    }

    /// Skip to the end of the current section
    pub fn skip_section(&mut self) -> Result<()> {
        while let Some(pair) = self.next_pair()? {
            if pair.is_start("ENDSEC") {
                break;
            }
        }
        Ok(())
    }

    /// Read the HEADER section
    pub fn read_header(&mut self) -> Result<()> {
        while let Some(pair) = self.next_pair()? {
            if pair.is_start("ENDSEC") {
                return Ok(());
            }
            if pair.code != 9 {
                continue;
            }

            match pair.value_string.as_str() {
                "$ACADVER" => {
                    let value = self.variable_value()?;
                    let version = DxfVersion::from_version_string(&value);
                    if version == DxfVersion::Unknown {
                        return Err(DxfError::UnsupportedVersion(value));
                    }
                    tracing::debug!(%version, "read $ACADVER");
                    self.builder.set_version(version);
                }
                "$HANDSEED" => {
                    let value = self.variable_value()?;
                    self.builder.set_handle_seed(Handle::from_hex(&value)?);
                }
                _ => {}
            }
        }
        Err(DxfError::Parse("Unexpected end of file in HEADER section".into()))
    }

    fn variable_value(&mut self) -> Result<String> {
        match self.next_pair()? {
            Some(pair) if pair.code != 0 && pair.code != 9 => Ok(pair.value_string),
            _ => Err(DxfError::Parse("Header variable without a value".into())),
        }
    }

    /// Read the records of a TABLES, BLOCKS, ENTITIES or OBJECTS section
    pub fn read_records(&mut self, section: &str) -> Result<()> {
        while let Some(pair) = self.next_pair()? {
            if pair.code != 0 {
                continue;
            }
            if pair.value_string == "ENDSEC" {
                return Ok(());
            }
            if self.is_bare_marker(&pair.value_string) {
                self.skip_object()?;
                continue;
            }
            self.read_object(&pair.value_string)?;
        }
        Err(DxfError::Parse(format!("Unexpected end of file in {section} section")))
    }

    fn is_bare_marker(&self, name: &str) -> bool {
        FRAMING_MARKERS.contains(&name) && self.builder.catalog().type_from_dxf_name(name).is_none()
    }

    /// Skip pairs up to the next `0` tag, leaving it unread.
    fn skip_object(&mut self) -> Result<()> {
        while let Some(pair) = self.next_pair()? {
            if pair.code == 0 {
                self.reader.push_back(pair);
                break;
            }
        }
        Ok(())
    }

    fn read_object(&mut self, name: &str) -> Result<()> {
        let offset = self.reader.position();
        let catalog = self.builder.catalog();
        let object_type = catalog.type_from_dxf_name(name);
        let object = object_type.and_then(|ty| catalog.create(ty));

        let (object_type, object) = match (object_type, object) {
            (Some(ty), Some(object)) => (ty, object),
            _ => {
                self.notify(
                    NotificationType::Warning,
                    DiagnosticKind::UnknownObjectType,
                    Handle::NULL,
                    format!("Unknown object name {name:?}, skipped"),
                )?;
                return self.skip_object();
            }
        };

        let fields = catalog.fields(object_type);
        let mut template = Template::new(object);
        template.offset = Some(offset);
        let mut partial = PartialValues::default();
        let mut owner_seen = false;

        while let Some(pair) = self.next_pair()? {
            match pair.code {
                0 => {
                    self.reader.push_back(pair);
                    break;
                }
                5 => match pair.as_handle() {
                    Some(handle) => template.object_mut().set_handle(handle),
                    None => self.invalid_value(&template, &pair)?,
                },
                102 if pair.value_string.starts_with('{') => self.read_group(&mut template, &pair.value_string)?,
                330 if !owner_seen => {
                    owner_seen = true;
                    match pair.as_handle() {
                        Some(handle) => template.owner_handle = handle.non_null(),
                        None => self.invalid_value(&template, &pair)?,
                    }
                }
                100 => {}
                _ => self.read_field(fields, &mut template, &mut partial, &pair)?,
            }
        }

        for (code, point) in partial.points {
            self.apply(&mut template, code, FieldValue::Point(point))?;
        }
        for (code, data) in partial.binary {
            self.apply(&mut template, code, FieldValue::Binary(data))?;
        }
        for (code, handles) in partial.handle_lists {
            template.pending.insert(code, PendingReference::Handles(handles));
        }

        self.builder.add_template(template)
    }

    /// Read an application group up to its closing `102 }`.
    fn read_group(&mut self, template: &mut Template, group: &str) -> Result<()> {
        while let Some(pair) = self.next_pair()? {
            match pair.code {
                102 if pair.value_string == "}" => return Ok(()),
                0 => {
                    self.reader.push_back(pair);
                    break;
                }
                330 if group == REACTORS_GROUP => match pair.as_handle() {
                    Some(handle) if handle.is_valid() => template.reactor_handles.push(handle),
                    Some(_) => {}
                    None => self.invalid_value(template, &pair)?,
                },
                _ => {}
            }
        }
        self.notify(
            NotificationType::Error,
            DiagnosticKind::StructuralViolation,
            template.handle(),
            format!("Group {group} is not closed"),
        )
    }

    fn read_field(
        &mut self,
        fields: &[FieldDescriptor],
        template: &mut Template,
        partial: &mut PartialValues,
        pair: &DxfCodePair,
    ) -> Result<()> {
        let Some((descriptor, axis)) = field_for(fields, pair.code) else {
            return self.notify(
                NotificationType::Warning,
                DiagnosticKind::UnknownTag,
                template.handle(),
                format!("Unknown group code {} in {}, skipped", pair.code, template.object_type()),
            );
        };

        let text = pair.value_string.trim();
        let value = match descriptor.kind {
            FieldKind::Subclass(_) | FieldKind::Count { .. } => return Ok(()),
            FieldKind::Bool => text.parse::<i64>().ok().map(|v| FieldValue::Bool(v != 0)),
            FieldKind::Int16 => text.parse().ok().map(FieldValue::Int16),
            FieldKind::Int32 => text.parse().ok().map(FieldValue::Int32),
            FieldKind::Int64 => text.parse().ok().map(FieldValue::Int64),
            FieldKind::Double | FieldKind::RawDouble | FieldKind::DoubleWithDefault { .. } => {
                text.parse().ok().map(FieldValue::Double)
            }
            FieldKind::Text => Some(FieldValue::Text(pair.value_string.clone())),
            FieldKind::Point3 => {
                let Ok(component) = text.parse::<f64>() else {
                    return self.invalid_value(template, pair);
                };
                partial.points.entry(descriptor.code).or_insert_with(Vector3::zeros)[axis] = component;
                return Ok(());
            }
            FieldKind::Binary => {
                let Some(bytes) = decode_hex(text) else {
                    return self.invalid_value(template, pair);
                };
                partial.binary.entry(descriptor.code).or_default().extend(bytes);
                return Ok(());
            }
            FieldKind::Handle(_) => {
                let Some(handle) = pair.as_handle() else {
                    return self.invalid_value(template, pair);
                };
                template.pending.insert(descriptor.code, PendingReference::Handle(handle));
                return Ok(());
            }
            FieldKind::HandleList(_) => {
                let Some(handle) = pair.as_handle() else {
                    return self.invalid_value(template, pair);
                };
                if handle.is_valid() {
                    partial.handle_lists.entry(descriptor.code).or_default().push(handle);
                }
                return Ok(());
            }
            FieldKind::NameReference { .. } => {
                template
                    .pending
                    .insert(descriptor.code, PendingReference::Name(pair.value_string.clone()));
                return Ok(());
            }
        };

        match value {
            Some(value) => self.apply(template, descriptor.code, value),
            None => self.invalid_value(template, pair),
        }
    }

    fn apply(&mut self, template: &mut Template, code: i32, value: FieldValue) -> Result<()> {
        if template.object_mut().apply_field(code, value) {
            return Ok(());
        }
        self.notify(
            NotificationType::Warning,
            DiagnosticKind::UnknownTag,
            template.handle(),
            format!("{} does not accept group code {code}", template.object_type()),
        )
    }

    fn invalid_value(&mut self, template: &Template, pair: &DxfCodePair) -> Result<()> {
        self.notify(
            NotificationType::Warning,
            DiagnosticKind::UnknownTag,
            template.handle(),
            format!("Invalid value {:?} for group code {}", pair.value_string, pair.code),
        )
    }
}

/// Descriptor owning `code`, with the point axis for `y`/`z` components.
fn field_for(fields: &[FieldDescriptor], code: i32) -> Option<(&FieldDescriptor, usize)> {
    if let Some(descriptor) = descriptor_for(fields, code) {
        return Some((descriptor, 0));
    }
    [(10, 1), (20, 2)].into_iter().find_map(|(delta, axis)| {
        descriptor_for(fields, code - delta)
            .filter(|d| d.kind == FieldKind::Point3)
            .map(|d| (d, axis))
    })
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}
