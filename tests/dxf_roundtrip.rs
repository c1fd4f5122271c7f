//! Tagged-text write/read round trips, ASCII and binary.

mod common;

use acad_codec::io::FieldValue;
use acad_codec::{DiagnosticKind, DxfReader, DxfVersion, Handle};

use common::builders::*;
use common::catalog::{TestCatalog, ENTITY_CHAIN};
use common::comparison::assert_same_objects;
use common::*;

#[test]
fn test_ascii_roundtrip() {
    for version in ROUND_TRIP_VERSIONS {
        let doc = sample_document(version);
        let text = write_dxf(&doc, false);
        let read = read_dxf(&text, &TestCatalog::new(), false)
            .unwrap_or_else(|e| panic!("Failed to read {version}: {e:?}"));

        assert_eq!(read.version, version);
        assert_eq!(read.handle_seed(), doc.handle_seed());
        assert!(read.notifications.is_empty(), "{version}: {:?}", read.notifications);
        assert_same_objects(&doc, &read);
    }
}

#[test]
fn test_binary_roundtrip() {
    for version in ROUND_TRIP_VERSIONS {
        let doc = sample_document(version);
        let bytes = write_dxf(&doc, true);
        assert!(DxfReader::from_bytes(bytes.clone()).is_binary());

        let read = read_dxf(&bytes, &TestCatalog::new(), false)
            .unwrap_or_else(|e| panic!("Failed to read binary {version}: {e:?}"));
        assert_eq!(read.version, version);
        assert_same_objects(&doc, &read);
    }
}

#[test]
fn test_dxf_and_dwg_agree() {
    let doc = sample_document(DxfVersion::AC1021);
    let from_text = read_dxf(&write_dxf(&doc, false), &TestCatalog::new(), false).unwrap();
    let from_dwg = read_dwg(&write_dwg(&doc), &TestCatalog::new(), false).unwrap();
    assert_same_objects(&from_text, &from_dwg);
}

#[test]
fn test_layout_of_written_text() {
    let text = String::from_utf8(write_dxf(&sample_document(DxfVersion::AC1032), false)).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(&lines[..4], &["  0", "SECTION", "  2", "HEADER"]);
    assert!(text.contains("  9\n$ACADVER\n  1\nAC1032\n"));
    assert_eq!(&lines[lines.len() - 2..], &["  0", "EOF"]);

    // Layer names replace the handles of name references.
    assert!(text.contains("  8\nWalls\n"));
    // Roots carry a null owner.
    assert!(text.contains("  0\nTABLE\n  5\n2\n330\n0\n"));
    // Control characters are escaped.
    assert!(text.contains("line 0: ^ tab^Ihere^Jnext"));
}

#[test]
fn test_entity_chain_from_text() {
    let read = read_dxf(&write_dxf(&sample_document(DxfVersion::AC1018), false), &TestCatalog::new(), false).unwrap();
    let expected: Vec<Handle> = LINES.iter().map(|&h| Handle::new(h)).collect();
    assert_eq!(field(&read, MODEL_SPACE, ENTITY_CHAIN), Some(FieldValue::Handles(expected)));
}

#[test]
fn test_comments_are_reported() {
    let mut pairs = vec![(999, "written by hand")];
    pairs.extend_from_slice(&[(0, "SECTION"), (2, "HEADER"), (9, "$ACADVER"), (1, "AC1015"), (0, "ENDSEC"), (0, "EOF")]);
    let read = read_dxf(&dxf_text(&pairs), &TestCatalog::new(), false).unwrap();

    assert_eq!(read.version, DxfVersion::AC1015);
    assert_eq!(count_kind(&read, DiagnosticKind::Other), 1);
    assert!(read.is_empty());
}

#[test]
fn test_missing_version_assumes_latest() {
    let text = dxf_text(&[(0, "SECTION"), (2, "OBJECTS"), (0, "ENDSEC"), (0, "EOF")]);
    let read = read_dxf(&text, &TestCatalog::new(), false).unwrap();
    assert_eq!(read.version, DxfVersion::AC1032);
    assert!(read.notifications.iter().any(|n| n.message.contains("$ACADVER")));
}

#[test]
fn test_records_outside_objects_are_read() {
    let text = dxf_text(&[
        (0, "SECTION"),
        (2, "HEADER"),
        (9, "$ACADVER"),
        (1, "AC1024"),
        (0, "ENDSEC"),
        (0, "SECTION"),
        (2, "CLASSES"),
        (0, "CLASS"),
        (1, "ACDBDICTIONARYWDFLT"),
        (0, "ENDSEC"),
        (0, "SECTION"),
        (2, "TABLES"),
        (0, "TABLE"),
        (5, "2"),
        (330, "0"),
        (70, "1"),
        (331, "10"),
        (0, "LAYER"),
        (5, "10"),
        (330, "2"),
        (2, "Walls"),
        (0, "ENDTAB"),
        (0, "ENDSEC"),
        (0, "SECTION"),
        (2, "BLOCKS"),
        (0, "BLOCK"),
        (8, "0"),
        (2, "*Model_Space"),
        (0, "ENDBLK"),
        (0, "ENDSEC"),
        (0, "SECTION"),
        (2, "ENTITIES"),
        (0, "LINE"),
        (5, "30"),
        (330, "0"),
        (8, "walls"),
        (0, "ENDSEC"),
        (0, "SECTION"),
        (2, "OBJECTS"),
        (0, "XRECORD"),
        (5, "7"),
        (330, "0"),
        (90, "3"),
        (0, "ENDSEC"),
        (0, "EOF"),
    ]);
    let read = read_dxf(&text, &TestCatalog::new(), false).unwrap();

    assert_eq!(read.len(), 4);
    assert_eq!(field(&read, 0x2, 331), Some(FieldValue::Handles(vec![Handle::new(0x10)])));
    assert_eq!(read.get(Handle::new(0x10)).unwrap().owner(), Some(Handle::new(0x2)));
    assert_eq!(field(&read, 0x30, 8), Some(FieldValue::Handle(Handle::new(0x10))));
    assert_eq!(field(&read, 7, 90), Some(FieldValue::Int32(3)));

    // Only the CLASSES section is left out.
    assert_eq!(read.notifications.len(), 1);
    assert!(read.notifications.iter().all(|n| n.message.contains("CLASSES")));
}

#[test]
fn test_largest_handle_is_read() {
    let text = dxf_file("AC1032", &[(0, "XRECORD"), (5, "FFFFFFFFFFFFFFFF"), (330, "0"), (1, "x")]);
    for failsafe in [true, false] {
        let read = read_dxf(&text, &TestCatalog::new(), failsafe).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(field(&read, u64::MAX, 1), Some(FieldValue::Text("x".into())));
        assert_eq!(read.handle_seed(), Handle::new(u64::MAX));
    }
}
