//! DXF writer module

mod binary_writer;
mod section_writer;
mod stream_writer;
mod text_writer;

pub use binary_writer::DxfBinaryWriter;
pub use section_writer::SectionWriter;
pub use stream_writer::{DxfStreamWriter, DxfStreamWriterExt};
pub use text_writer::DxfTextWriter;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::document::{CadDocument, ObjectCatalog};
use crate::error::Result;

/// Configuration for the DXF writer.
#[derive(Debug, Clone, Default)]
pub struct DxfWriterConfiguration {
    /// Write the binary-sentinel variant instead of ASCII text.
    pub binary: bool,
}

/// DXF file writer
pub struct DxfWriter<'a> {
    document: &'a CadDocument,
    catalog: &'a dyn ObjectCatalog,
    config: DxfWriterConfiguration,
}

impl<'a> DxfWriter<'a> {
    /// Create a new DXF writer for ASCII output
    pub fn new(document: &'a CadDocument, catalog: &'a dyn ObjectCatalog) -> Self {
        Self {
            document,
            catalog,
            config: DxfWriterConfiguration::default(),
        }
    }

    /// Set the writer configuration.
    pub fn with_configuration(mut self, config: DxfWriterConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Write to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to_writer(BufWriter::new(file))
    }

    /// Write to any writer
    #[tracing::instrument(level = "debug", skip_all, fields(version = %self.document.version, binary = self.config.binary))]
    pub fn write_to_writer<W: Write>(&self, writer: W) -> Result<()> {
        if self.config.binary {
            let mut stream_writer = DxfBinaryWriter::new(writer)?;
            self.write_dxf(&mut stream_writer)?;
            stream_writer.flush()
        } else {
            let mut stream_writer = DxfTextWriter::new(writer);
            self.write_dxf(&mut stream_writer)?;
            stream_writer.flush()
        }
    }

    /// Write to a byte vector
    pub fn write_to_vec(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to_writer(&mut buffer)?;
        Ok(buffer)
    }

    fn write_dxf<W: DxfStreamWriter>(&self, writer: &mut W) -> Result<()> {
        let mut section_writer = SectionWriter::new(writer);
        section_writer.write_header(self.document)?;
        section_writer.write_objects(self.document, self.catalog)?;
        writer.write_eof()
    }
}
