//! Tagged-text (DXF-style) reading and writing
//!
//! Both the ASCII and the binary-sentinel variants share the section
//! readers/writers; only the pair-level stream differs.

mod group_code;
mod reader;
mod writer;

pub use group_code::GroupCodeValueType;
pub use reader::{
    DxfBinaryReader, DxfCodePair, DxfReader, DxfReaderConfiguration, DxfStreamReader, DxfTextReader, SectionReader,
};
pub use writer::{
    DxfBinaryWriter, DxfStreamWriter, DxfStreamWriterExt, DxfTextWriter, DxfWriter, DxfWriterConfiguration,
    SectionWriter,
};

/// First bytes of a binary DXF file.
pub const BINARY_DXF_SENTINEL: &[u8] = b"AutoCAD Binary DXF\r\n\x1a\0";
