//! Binary file writer.
//!
//! Produces the file header, then the `AcDb:Header` record holding the
//! handle seed, the object records back to back, and the object map.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ahash::AHashSet;

use crate::document::{CadDocument, ObjectCatalog};
use crate::error::{DxfError, Result};
use crate::io::dwg::constants::section_names;
use crate::io::dwg::crc::HEADER_SEED;
use crate::io::dwg::file_header::DwgFileHeader;
use crate::io::dwg::framing::frame;
use crate::io::dwg::handle_map::write_object_map;
use crate::io::dwg::object_writer::DwgObjectWriter;
use crate::io::dwg::stream_writer::{DwgBitWriter, DwgStreamWriter};
use crate::io::dwg::version_features::VersionFeatures;
use crate::io::handle_table::HandleTable;
use crate::types::Handle;

/// Configuration for the binary writer.
#[derive(Debug, Clone, Default)]
pub struct DwgWriterConfiguration {
    /// Maintenance release number stored after the magic.
    pub maintenance_version: u8,
}

/// Writes a [`CadDocument`] in the revision given by `document.version`.
///
/// ```rust,ignore
/// let bytes = DwgWriter::new(&document, &catalog).write_to_vec()?;
/// ```
pub struct DwgWriter<'a> {
    document: &'a CadDocument,
    catalog: &'a dyn ObjectCatalog,
    config: DwgWriterConfiguration,
}

impl<'a> DwgWriter<'a> {
    pub fn new(document: &'a CadDocument, catalog: &'a dyn ObjectCatalog) -> Self {
        Self {
            document,
            catalog,
            config: DwgWriterConfiguration::default(),
        }
    }

    pub fn with_configuration(mut self, config: DwgWriterConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to_writer(BufWriter::new(file))
    }

    /// Encode the document and write it to `writer`, flushing on success.
    #[tracing::instrument(level = "debug", skip_all, fields(version = %self.document.version))]
    pub fn write_to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let bytes = self.encode()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to_vec(&self) -> Result<Vec<u8>> {
        self.encode()
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let version = self.document.version;
        let features = VersionFeatures::for_version(version)?;

        let mut seed_writer = DwgBitWriter::new(features);
        seed_writer.handle_reference(self.document.handle_seed())?;
        let header_section = frame(seed_writer.bytes(), 0, HEADER_SEED, features)?;

        let objects_start =
            (DwgFileHeader::encoded_length(&section_names::ALL, features) + header_section.len()) as u64;

        let object_writer = DwgObjectWriter::new(self.catalog, features);
        let mut objects = Vec::new();
        let mut offsets = HandleTable::new();
        for handle in self.write_order() {
            let Some(object) = self.document.get(handle) else {
                continue;
            };
            let record = object_writer.write_record(object)?;
            offsets.assign(handle, objects_start + objects.len() as u64)?;
            objects.extend_from_slice(&record);
        }
        tracing::debug!(records = offsets.len(), bytes = objects.len(), "encoded objects");

        let map = write_object_map(&offsets.complete());

        let mut file_header = DwgFileHeader::new(version, self.config.maintenance_version);
        file_header.locate(
            &[
                (section_names::HEADER, header_section.as_slice()),
                (section_names::ACDB_OBJECTS, objects.as_slice()),
                (section_names::HANDLES, map.as_slice()),
            ],
            features,
        );
        if file_header.section(section_names::ACDB_OBJECTS).map(|s| s.offset) != Some(objects_start) {
            return Err(DxfError::StructuralViolation(
                "Object section moved after offsets were assigned".into(),
            ));
        }

        let mut out = file_header.write(features)?;
        out.reserve(header_section.len() + objects.len() + map.len());
        out.extend_from_slice(&header_section);
        out.extend_from_slice(&objects);
        out.extend_from_slice(&map);
        Ok(out)
    }

    /// Owners first: a breadth-first walk from the root objects along every
    /// handle-valued field, then whatever the walk did not reach, in
    /// document order.
    pub fn write_order(&self) -> Vec<Handle> {
        let mut order = Vec::with_capacity(self.document.len());
        let mut seen = AHashSet::new();
        let mut queue: VecDeque<Handle> = self
            .document
            .roots()
            .into_iter()
            .filter(|h| seen.insert(*h))
            .collect();

        while let Some(handle) = queue.pop_front() {
            order.push(handle);
            let Some(object) = self.document.get(handle) else {
                continue;
            };
            for (_, value) in object.fields() {
                for target in value.handles() {
                    if self.document.contains(target) && seen.insert(target) {
                        queue.push_back(target);
                    }
                }
            }
        }

        for handle in self.document.handles() {
            if seen.insert(handle) {
                order.push(handle);
            }
        }
        order
    }
}
