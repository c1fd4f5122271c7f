//! Structural comparison of documents.

#![allow(dead_code)]

use acad_codec::io::FieldValue;
use acad_codec::CadDocument;

use super::catalog::ENTITY_CHAIN;

fn stored_fields(fields: Vec<(i32, FieldValue)>) -> Vec<(i32, FieldValue)> {
    fields.into_iter().filter(|(code, _)| *code != ENTITY_CHAIN).collect()
}

/// Assert that both documents hold the same objects, compared by handle.
///
/// Insertion order is ignored; the binary writer orders records by
/// ownership.
pub fn assert_same_objects(expected: &CadDocument, actual: &CadDocument) {
    assert_eq!(expected.len(), actual.len(), "object count");
    for object in expected.objects() {
        let handle = object.handle();
        let other = actual
            .get(handle)
            .unwrap_or_else(|| panic!("object {handle} missing after round trip"));
        assert_eq!(object.object_type(), other.object_type(), "type of {handle}");
        assert_eq!(object.owner(), other.owner(), "owner of {handle}");
        assert_eq!(object.reactors(), other.reactors(), "reactors of {handle}");
        assert_eq!(
            stored_fields(object.fields()),
            stored_fields(other.fields()),
            "fields of {handle}"
        );
    }
}
