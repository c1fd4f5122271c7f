//! # acad-codec
//!
//! Codec core for CAD interchange files: a packed binary form (DWG-style)
//! and a tagged-text form (DXF-style, ASCII and binary).
//!
//! The crate ships no entity types. A caller supplies an [`ObjectCatalog`]
//! that creates objects from kind tags and describes their fields; every
//! live object implements [`CadObject`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use acad_codec::{DwgReader, DxfWriter};
//!
//! let doc = DwgReader::from_file("drawing.dwg")?.read(&catalog)?;
//! for n in doc.notifications.iter() {
//!     println!("{n}");
//! }
//! DxfWriter::new(&doc, &catalog).write_to_file("drawing.dxf")?;
//! # Ok::<(), acad_codec::DxfError>(())
//! ```
//!
//! ## Architecture
//!
//! - `io::dwg` - bit streams, checksum framing, records and the container
//! - `io::dxf` - tagged-text pairs and sections
//! - `io::builder` - the two-pass template/builder reconstruction
//! - `document` - the collaborator surface and the object arena

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod document;
pub mod error;
pub mod io;
pub mod notification;
pub mod types;

// Re-export commonly used types
pub use document::{CadDocument, CadObject, ObjectCatalog};
pub use error::{DxfError, Result};
pub use notification::{DiagnosticKind, Notification, NotificationCollection, NotificationType};
pub use types::{DxfVersion, Handle, ObjectType, Vector3};

// Re-export I/O types
pub use io::dwg::{DwgReader, DwgReaderConfiguration, DwgWriter, DwgWriterConfiguration};
pub use io::dxf::{DxfReader, DxfReaderConfiguration, DxfWriter, DxfWriterConfiguration};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
