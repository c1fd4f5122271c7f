//! Binary file reader.
//!
//! The read pipeline is:
//!
//! 1. Parse the file header and locate the sections.
//! 2. Read the handle seed from `AcDb:Header`.
//! 3. Decode the object map from `AcDb:Handles`.
//! 4. Scan the object records in `AcDb:AcDbObjects` in file order, decoding
//!    each into a template. A corrupted record is reported and the scan
//!    resumes at the next offset listed in the object map.
//! 5. Cross-check the map against the scanned offsets and hand the templates
//!    to the [`DocumentBuilder`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use ahash::AHashMap;

use crate::document::{CadDocument, ObjectCatalog};
use crate::error::{DxfError, Result};
use crate::io::builder::DocumentBuilder;
use crate::io::dwg::constants::section_names;
use crate::io::dwg::crc::{crc8, HEADER_SEED, OBJECT_SEED};
use crate::io::dwg::file_header::DwgFileHeader;
use crate::io::dwg::framing::{unframe, unframe_at};
use crate::io::dwg::handle_map::read_object_map;
use crate::io::dwg::object_reader::{DwgObjectReader, RecordOutcome};
use crate::io::dwg::stream_reader::{DwgBitReader, DwgStreamReader};
use crate::io::dwg::version_features::VersionFeatures;
use crate::notification::{DiagnosticKind, Notification, NotificationCollection, NotificationType};
use crate::types::Handle;

/// Configuration options for the binary reader.
#[derive(Debug, Clone, Default)]
pub struct DwgReaderConfiguration {
    /// When `true`, corrupted records, unknown record types and dangling
    /// references are reported as notifications and the read continues.
    ///
    /// Default: `false` (strict mode).
    pub failsafe: bool,
}

/// Reads a binary file into a [`CadDocument`].
///
/// ```rust,ignore
/// let doc = DwgReader::from_file("drawing.dwg")?
///     .with_configuration(DwgReaderConfiguration { failsafe: true })
///     .read(&catalog)?;
/// ```
pub struct DwgReader {
    data: Vec<u8>,
    config: DwgReaderConfiguration,
}

impl DwgReader {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read the whole stream into memory.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            config: DwgReaderConfiguration::default(),
        }
    }

    pub fn with_configuration(mut self, config: DwgReaderConfiguration) -> Self {
        self.config = config;
        self
    }

    #[tracing::instrument(level = "debug", skip_all, fields(bytes = self.data.len(), failsafe = self.config.failsafe))]
    pub fn read(self, catalog: &dyn ObjectCatalog) -> Result<CadDocument> {
        let mut notifications = NotificationCollection::with_failsafe(self.config.failsafe);
        let header = DwgFileHeader::read(&self.data, &mut notifications)?;
        let features = VersionFeatures::for_version(header.version)?;

        let mut builder = DocumentBuilder::new(catalog, header.version, notifications);

        let seed_section = self.section(&header, section_names::HEADER, builder.notifications_mut())?;
        let handle_seed = match read_handle_seed(seed_section, features) {
            Ok(seed) => seed,
            Err(e) if e.is_record_level() => {
                builder.notifications_mut().report_error(e, None, Some(offset_of(&header, section_names::HEADER)))?;
                Handle::NULL
            }
            Err(e) => return Err(e),
        };
        builder.set_handle_seed(handle_seed);

        let map_section = self.section(&header, section_names::HANDLES, builder.notifications_mut())?;
        let map = match read_object_map(map_section) {
            Ok(map) => map,
            Err(e) if e.is_record_level() => {
                builder.notifications_mut().report_error(e, None, Some(offset_of(&header, section_names::HANDLES)))?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(entries = map.len(), "read object map");

        let objects_base = offset_of(&header, section_names::ACDB_OBJECTS);
        let objects = self.section(&header, section_names::ACDB_OBJECTS, builder.notifications_mut())?;
        let scanned = scan_objects(objects, objects_base, &map, features, catalog, &mut builder)?;

        cross_check(&map, &scanned, builder.notifications_mut())?;
        builder.build()
    }

    /// Bytes of a section, after checking its stored seed.
    fn section<'d>(
        &'d self,
        header: &DwgFileHeader,
        name: &str,
        notifications: &mut NotificationCollection,
    ) -> Result<&'d [u8]> {
        let locator = header
            .section(name)
            .ok_or_else(|| DxfError::InvalidHeader(format!("Section {name} is missing")))?;
        let range = locator.range();
        let bytes = self.data.get(range.clone()).ok_or_else(|| {
            DxfError::truncated(
                range.start as u64 * 8,
                locator.length * 8,
                (self.data.len().saturating_sub(range.start)) as u64 * 8,
            )
        })?;

        if let Some(expected) = locator.seed {
            let actual = crc8(HEADER_SEED, bytes);
            if expected != actual {
                notifications.report_error(
                    DxfError::ChecksumMismatch { expected, actual },
                    None,
                    Some(locator.offset),
                )?;
            }
        }
        tracing::debug!(section = name, offset = locator.offset, length = locator.length, "located section");
        Ok(bytes)
    }
}

fn offset_of(header: &DwgFileHeader, name: &str) -> u64 {
    header.section(name).map(|s| s.offset).unwrap_or(0)
}

fn read_handle_seed(section: &[u8], features: VersionFeatures) -> Result<Handle> {
    let record = unframe(section, HEADER_SEED, features)?;
    DwgBitReader::new(&record.payload, features).handle_reference()
}

/// Decode every record of the object section; returns the first offset
/// seen for each handle.
fn scan_objects(
    objects: &[u8],
    base: u64,
    map: &[(Handle, u64)],
    features: VersionFeatures,
    catalog: &dyn ObjectCatalog,
    builder: &mut DocumentBuilder<'_>,
) -> Result<AHashMap<Handle, u64>> {
    let mut resync: Vec<usize> = map
        .iter()
        .filter_map(|&(_, offset)| offset.checked_sub(base))
        .filter(|&relative| relative < objects.len() as u64)
        .map(|relative| relative as usize)
        .collect();
    resync.sort_unstable();
    resync.dedup();

    let reader = DwgObjectReader::new(catalog, features);
    let mut scanned = AHashMap::new();
    let mut pos = 0usize;

    while pos < objects.len() {
        let absolute = base + pos as u64;
        let (record, length) = match unframe_at(objects, pos, OBJECT_SEED, features) {
            Ok(framed) => framed,
            Err(e) if e.is_record_level() => {
                builder.notifications_mut().report_error(e, None, Some(absolute))?;
                match resync.iter().find(|&&next| next > pos) {
                    Some(&next) => {
                        tracing::debug!(from = absolute, to = base + next as u64, "resynchronised");
                        pos = next;
                        continue;
                    }
                    None => break,
                }
            }
            Err(e) => return Err(e),
        };

        match reader.read_record(&record) {
            Ok(RecordOutcome::Template(mut template)) => {
                template.offset = Some(absolute);
                scanned.entry(template.handle()).or_insert(absolute);
                builder.add_template(template)?;
            }
            Ok(RecordOutcome::Unknown { object_type, handle }) => {
                scanned.entry(handle).or_insert(absolute);
                builder.notifications_mut().report(
                    Notification::new(
                        NotificationType::Warning,
                        DiagnosticKind::UnknownObjectType,
                        format!("Skipped record of unknown {object_type}"),
                    )
                    .with_handle(handle)
                    .with_offset(absolute),
                )?;
            }
            Err(e) if e.is_record_level() => {
                builder.notifications_mut().report_error(e, None, Some(absolute))?;
            }
            Err(e) => return Err(e),
        }
        pos += length;
    }

    tracing::debug!(records = scanned.len(), "scanned object section");
    Ok(scanned)
}

/// Report map entries that disagree with the records actually found.
fn cross_check(
    map: &[(Handle, u64)],
    scanned: &AHashMap<Handle, u64>,
    notifications: &mut NotificationCollection,
) -> Result<()> {
    for &(handle, offset) in map {
        let notification = match scanned.get(&handle) {
            Some(&found) if found == offset => continue,
            Some(&found) => Notification::new(
                NotificationType::Warning,
                DiagnosticKind::Other,
                format!("Object map places {handle} at {offset}, record found at {found}"),
            ),
            // The object is lost.
            None => Notification::new(
                NotificationType::Error,
                DiagnosticKind::StructuralViolation,
                format!("Object map lists {handle} at {offset}, no record was read"),
            ),
        };
        notifications.report(notification.with_handle(handle).with_offset(offset))?;
    }
    Ok(())
}
