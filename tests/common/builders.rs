//! Sample documents shared by the round-trip and recovery tests.

#![allow(dead_code)]

use acad_codec::io::FieldValue;
use acad_codec::{CadDocument, DxfVersion, Handle, Vector3};

use super::catalog::*;

pub const LAYER_TABLE_HANDLE: u64 = 0x2;
pub const LAYER_0: u64 = 0x10;
pub const LAYER_WALLS: u64 = 0x11;
pub const MODEL_SPACE: u64 = 0x20;
pub const LINES: [u64; 3] = [0x30, 0xABCD_EF01, 0x32];
pub const XRECORD_HANDLE: u64 = 0x40;

fn h(value: u64) -> FieldValue {
    FieldValue::Handle(Handle::new(value))
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

fn line(index: usize, layer: u64, next: Option<u64>) -> TestObject {
    let offset = index as f64;
    TestObject::new(LINE)
        .with_handle(LINES[index])
        .owned_by(MODEL_SPACE)
        .with(8, h(layer))
        .with(360, h(next.unwrap_or(0)))
        .with(1, text(&format!("line {index}: ^tab\there\nnext")))
        .with(10, FieldValue::Point(Vector3::new(offset, -2.5, 0.0)))
        .with(11, FieldValue::Point(Vector3::new(offset + 0.1, 1.0 / 3.0, 1e-9)))
        .with(39, FieldValue::Double(0.25 * offset))
        .with(48, FieldValue::Double(0.25 * offset + 1.0))
        .with(49, FieldValue::Double(-offset * 1234.5678))
        .with(90, FieldValue::Int32(-70_000 + index as i32))
        .with(160, FieldValue::Int64(0x00FF_EEDD_CCBB + index as i64))
}

/// A layer table with two layers, a model space block record owning a
/// linked chain of three lines, and an unowned record.
pub fn sample_document(version: DxfVersion) -> CadDocument {
    let mut doc = CadDocument::with_version(version);

    let objects = vec![
        TestObject::new(LAYER_TABLE)
            .with_handle(LAYER_TABLE_HANDLE)
            .with(331, FieldValue::Handles(vec![Handle::new(LAYER_0), Handle::new(LAYER_WALLS)])),
        TestObject::new(LAYER)
            .with_handle(LAYER_0)
            .owned_by(LAYER_TABLE_HANDLE)
            .with(2, text("0"))
            .with(62, FieldValue::Int16(7))
            .with(290, FieldValue::Bool(true)),
        TestObject::new(LAYER)
            .with_handle(LAYER_WALLS)
            .owned_by(LAYER_TABLE_HANDLE)
            .with_reactor(MODEL_SPACE)
            .with(2, text("Walls"))
            .with(70, FieldValue::Int16(4))
            .with(62, FieldValue::Int16(-1)),
        TestObject::new(BLOCK_RECORD)
            .with_handle(MODEL_SPACE)
            .with(2, text("*Model_Space"))
            .with(340, h(LINES[0]))
            .with(341, h(LINES[2]))
            .with(310, FieldValue::Binary((0..300u32).map(|i| (i * 7 % 256) as u8).collect())),
        line(0, LAYER_WALLS, Some(LINES[1])),
        line(1, LAYER_0, Some(LINES[2])),
        line(2, LAYER_WALLS, None),
        TestObject::new(XRECORD)
            .with_handle(XRECORD_HANDLE)
            .with(1, text("Café"))
            .with(90, FieldValue::Int32(42)),
    ];

    for object in objects {
        doc.add(Box::new(object)).expect("sample handles are unique");
    }
    doc
}
