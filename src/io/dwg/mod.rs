//! Binary (DWG-style) file support.
//!
//! # Module Structure
//!
//! - [`constants`] — Magic length, sentinel bytes, section names, object map limits
//! - [`crc`] — CRC-8 (16-bit) computation and the checksumming stream
//! - [`modular`] — Modular char/short encodings
//! - [`reference_type`] — Handle reference codes and resolution
//! - [`stream_reader`] / [`stream_writer`] — Bit-level primitives and the merged data/handle streams
//! - [`framing`] — Size prefix and checksum trailer of object records
//! - [`version_features`] — Per-revision layout rules
//! - [`object_reader`] / [`object_writer`] — Record (de)serialization driven by field tables
//! - [`handle_map`] — The `AcDb:Handles` object map
//! - [`file_header`] — File header and section locator
//! - [`reader`] / [`writer`] — Top-level file reader and writer

pub mod constants;
pub mod crc;
pub mod file_header;
pub mod framing;
pub mod handle_map;
pub mod modular;
pub mod object_reader;
pub mod object_writer;
pub mod reader;
pub mod reference_type;
pub mod stream_reader;
pub mod stream_writer;
pub mod version_features;
pub mod writer;

// Re-export commonly used types
pub use framing::{frame, unframe, Unframed};
pub use reader::{DwgReader, DwgReaderConfiguration};
pub use reference_type::{DwgReferenceType, HandleReference};
pub use stream_reader::{DwgBitReader, DwgMergedReader, DwgStreamReader};
pub use stream_writer::{DwgBitWriter, DwgMergedWriter, DwgStreamWriter};
pub use version_features::VersionFeatures;
pub use writer::{DwgWriter, DwgWriterConfiguration};
