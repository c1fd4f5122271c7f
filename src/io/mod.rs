//! I/O module for reading and writing CAD files in the binary and tagged-text forms
//!
//! - [`dwg`] holds the bit-level codec, framing and the binary container.
//! - [`dxf`] holds the tagged-text codec.
//! - [`template`], [`handle_table`] and [`builder`] are the two-pass
//!   reconstruction shared by both readers.
//! - [`field`] describes how object kinds lay out their fields.

pub mod builder;
pub mod dwg;
pub mod dxf;
pub mod field;
pub mod handle_table;
pub mod template;

pub use builder::{DocumentBuilder, LinkedChain, ResolveContext};
pub use dwg::{DwgReader, DwgReaderConfiguration, DwgWriter, DwgWriterConfiguration};
pub use dxf::{DxfReader, DxfReaderConfiguration, DxfWriter, DxfWriterConfiguration};
pub use field::{FieldDescriptor, FieldKind, FieldValue};
pub use handle_table::HandleTable;
pub use template::{KindResolution, PendingReference, Template};
