//! Shared test utilities for the integration tests.
//!
//! Test crates import this via `mod common;`.

#![allow(dead_code)]

pub mod builders;
pub mod catalog;
pub mod comparison;

use acad_codec::io::FieldValue;
use acad_codec::{
    CadDocument, DiagnosticKind, DwgReader, DwgReaderConfiguration, DwgWriter, DxfReader, DxfReaderConfiguration,
    DxfVersion, DxfWriter, DxfWriterConfiguration, Handle, Result,
};

use catalog::TestCatalog;

/// Revisions exercised by the round-trip tests: one per layout change.
pub const ROUND_TRIP_VERSIONS: [DxfVersion; 5] = [
    DxfVersion::AC1014,
    DxfVersion::AC1018,
    DxfVersion::AC1021,
    DxfVersion::AC1024,
    DxfVersion::AC1032,
];

pub fn write_dwg(doc: &CadDocument) -> Vec<u8> {
    DwgWriter::new(doc, &TestCatalog::new())
        .write_to_vec()
        .unwrap_or_else(|e| panic!("Failed to write {}: {e:?}", doc.version))
}

pub fn read_dwg(bytes: &[u8], catalog: &TestCatalog, failsafe: bool) -> Result<CadDocument> {
    DwgReader::from_bytes(bytes.to_vec())
        .with_configuration(DwgReaderConfiguration { failsafe })
        .read(catalog)
}

pub fn write_dxf(doc: &CadDocument, binary: bool) -> Vec<u8> {
    DxfWriter::new(doc, &TestCatalog::new())
        .with_configuration(DxfWriterConfiguration { binary })
        .write_to_vec()
        .unwrap_or_else(|e| panic!("Failed to write DXF {}: {e:?}", doc.version))
}

pub fn read_dxf(bytes: &[u8], catalog: &TestCatalog, failsafe: bool) -> Result<CadDocument> {
    DxfReader::from_bytes(bytes.to_vec())
        .with_configuration(DxfReaderConfiguration { failsafe })
        .read(catalog)
}

/// Value of field `code` on object `handle`.
pub fn field(doc: &CadDocument, handle: u64, code: i32) -> Option<FieldValue> {
    doc.get(Handle::new(handle))?
        .fields()
        .into_iter()
        .find_map(|(c, v)| (c == code).then_some(v))
}

pub fn count_kind(doc: &CadDocument, kind: DiagnosticKind) -> usize {
    doc.notifications.of_kind(kind).len()
}

/// Join ASCII DXF lines, as `code`/`value` pairs.
pub fn dxf_text(pairs: &[(i32, &str)]) -> Vec<u8> {
    let mut out = String::new();
    for (code, value) in pairs {
        out.push_str(&format!("{code:>3}\n{value}\n"));
    }
    out.into_bytes()
}

/// The pairs of a minimal file around the given OBJECTS content.
pub fn dxf_file(version: &str, objects: &[(i32, &str)]) -> Vec<u8> {
    let mut pairs = vec![
        (0, "SECTION"),
        (2, "HEADER"),
        (9, "$ACADVER"),
        (1, version),
        (0, "ENDSEC"),
        (0, "SECTION"),
        (2, "OBJECTS"),
    ];
    pairs.extend_from_slice(objects);
    pairs.extend_from_slice(&[(0, "ENDSEC"), (0, "EOF")]);
    dxf_text(&pairs)
}
