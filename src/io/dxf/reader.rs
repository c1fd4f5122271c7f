//! DXF file reader

mod binary_reader;
mod section_reader;
mod stream_reader;
pub(crate) mod text_reader;

pub use binary_reader::DxfBinaryReader;
pub use section_reader::SectionReader;
pub use stream_reader::{DxfCodePair, DxfStreamReader};
pub use text_reader::DxfTextReader;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::document::{CadDocument, ObjectCatalog};
use crate::error::{DxfError, Result};
use crate::io::builder::DocumentBuilder;
use crate::io::dxf::BINARY_DXF_SENTINEL;
use crate::notification::{DiagnosticKind, NotificationCollection, NotificationType};
use crate::types::DxfVersion;

/// Configuration for the DXF reader.
#[derive(Debug, Clone, Default)]
pub struct DxfReaderConfiguration {
    /// When `true`, unknown objects, repeated handles and dangling
    /// references are reported as notifications instead of aborting the read.
    ///
    /// Default: `false` (strict mode).
    pub failsafe: bool,
}

/// DXF file reader
///
/// ASCII and binary files are told apart by the binary sentinel.
pub struct DxfReader {
    data: Vec<u8>,
    config: DxfReaderConfiguration,
}

impl DxfReader {
    /// Create a new DXF reader from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Create a new DXF reader from any reader
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            config: DxfReaderConfiguration::default(),
        }
    }

    /// Set the reader configuration.
    pub fn with_configuration(mut self, config: DxfReaderConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Whether the data starts with the binary sentinel.
    pub fn is_binary(&self) -> bool {
        self.data.starts_with(BINARY_DXF_SENTINEL)
    }

    /// Read the file into a document.
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = self.data.len(), failsafe = self.config.failsafe))]
    pub fn read(self, catalog: &dyn ObjectCatalog) -> Result<CadDocument> {
        let notifications = NotificationCollection::with_failsafe(self.config.failsafe);
        let mut builder = DocumentBuilder::new(catalog, DxfVersion::Unknown, notifications);

        if self.is_binary() {
            let mut reader = DxfBinaryReader::new(self.data.as_slice())?;
            read_sections(&mut reader, &mut builder)?;
        } else {
            let mut reader = DxfTextReader::new(self.data.as_slice());
            read_sections(&mut reader, &mut builder)?;
        }

        builder.build()
    }
}

fn read_sections<R: DxfStreamReader>(reader: &mut R, builder: &mut DocumentBuilder<'_>) -> Result<()> {
    let mut section_reader = SectionReader::new(reader, builder);

    while let Some(pair) = section_reader.next_pair()? {
        if pair.is_start("EOF") {
            break;
        }
        if !pair.is_start("SECTION") {
            continue;
        }

        let name = match section_reader.next_pair()? {
            Some(p) if p.code == 2 => p.value_string,
            _ => return Err(DxfError::Parse("SECTION without a name".into())),
        };
        tracing::debug!(section = %name, "reading section");

        match name.as_str() {
            "HEADER" => section_reader.read_header()?,
            "TABLES" | "BLOCKS" | "ENTITIES" | "OBJECTS" => section_reader.read_records(&name)?,
            _ => {
                section_reader.skip_section()?;
                section_reader.report(
                    NotificationType::NotImplemented,
                    DiagnosticKind::Other,
                    format!("Section {name} skipped"),
                )?;
            }
        }
    }

    if builder.version() == DxfVersion::Unknown {
        let fallback = DxfVersion::default();
        builder.notifications_mut().notify(
            NotificationType::Warning,
            DiagnosticKind::Other,
            format!("No $ACADVER in the file, assuming {fallback}"),
        )?;
        builder.set_version(fallback);
    }
    Ok(())
}
