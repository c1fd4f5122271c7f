//! The collaborator surface between the codecs and a document model.
//!
//! The codecs never see concrete entity types. Every live object exposes
//! the small [`CadObject`] surface, and an [`ObjectCatalog`] supplied by the
//! caller creates objects from kind tags and describes their fields.
//! [`CadDocument`] is the arena handed to and from the codecs.

use std::collections::BTreeSet;
use std::fmt::Debug;

use indexmap::IndexMap;

use crate::error::{DxfError, Result};
use crate::io::builder::ResolveContext;
use crate::io::field::{FieldDescriptor, FieldValue};
use crate::io::template::{KindResolution, Template};
use crate::notification::NotificationCollection;
use crate::types::{DxfVersion, Handle, ObjectType};

/// The minimal surface the codecs need from a live object.
pub trait CadObject: Debug {
    fn handle(&self) -> Handle;
    fn set_handle(&mut self, handle: Handle);

    /// Owning object, if any. Table/control objects and the root
    /// dictionary have none.
    fn owner(&self) -> Option<Handle>;
    fn set_owner(&mut self, owner: Option<Handle>);

    fn object_type(&self) -> ObjectType;

    /// Non-owning back references.
    fn reactors(&self) -> &BTreeSet<Handle>;
    fn reactors_mut(&mut self) -> &mut BTreeSet<Handle>;

    /// Name used by name references, for kinds that have one.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Enumerate the values to encode, keyed by field code.
    fn fields(&self) -> Vec<(i32, FieldValue)>;

    /// Apply a decoded value. Returns `false` if the code is not known.
    fn apply_field(&mut self, code: i32, value: FieldValue) -> bool;
}

/// Kind-specific knowledge supplied by the entity catalog.
pub trait ObjectCatalog {
    /// A blank object of the given kind, or `None` for unknown kinds.
    fn create(&self, object_type: ObjectType) -> Option<Box<dyn CadObject>>;

    /// Kind tag for a text-file object name.
    fn type_from_dxf_name(&self, name: &str) -> Option<ObjectType>;

    /// Text-file object name for a kind.
    fn dxf_name(&self, object_type: ObjectType) -> Option<&'static str>;

    /// The kind's field table, in binary layout order.
    fn fields(&self, object_type: ObjectType) -> &'static [FieldDescriptor];

    /// Whether records of this kind carry the entity graphic-present bit.
    fn is_entity(&self, _object_type: ObjectType) -> bool {
        false
    }

    /// Extra pass-2 resolution for the kind (e.g. linked entity chains).
    ///
    /// Must be a pure function of the template and the context.
    fn resolve(&self, _template: &Template, _context: &ResolveContext<'_>) -> KindResolution {
        KindResolution::default()
    }
}

/// Arena of live objects keyed by handle.
#[derive(Debug)]
pub struct CadDocument {
    pub version: DxfVersion,
    handle_seed: Handle,
    objects: IndexMap<Handle, Box<dyn CadObject>, ahash::RandomState>,
    /// Diagnostics collected while the document was read.
    pub notifications: NotificationCollection,
}

impl Default for CadDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CadDocument {
    pub fn new() -> Self {
        Self::with_version(DxfVersion::default())
    }

    pub fn with_version(version: DxfVersion) -> Self {
        Self {
            version,
            handle_seed: Handle::new(1),
            objects: IndexMap::default(),
            notifications: NotificationCollection::new(),
        }
    }

    /// Add an object. A null handle is replaced by the next free one;
    /// a handle already in use is rejected. The seed stops at `u64::MAX`.
    pub fn add(&mut self, mut object: Box<dyn CadObject>) -> Result<Handle> {
        let mut handle = object.handle();
        if handle.is_null() {
            handle = self.handle_seed;
            object.set_handle(handle);
        }
        if self.objects.contains_key(&handle) {
            return Err(DxfError::DuplicateHandle(handle));
        }
        if handle.value() >= self.handle_seed.value() {
            self.handle_seed = Handle::new(handle.value().saturating_add(1));
        }
        self.objects.insert(handle, object);
        Ok(handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&dyn CadObject> {
        self.objects.get(&handle).map(|o| o.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Box<dyn CadObject>> {
        self.objects.get_mut(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.objects.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = &dyn CadObject> {
        self.objects.values().map(|o| o.as_ref())
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.objects.keys().copied()
    }

    /// Objects without an owner, in insertion order.
    pub fn roots(&self) -> Vec<Handle> {
        self.objects
            .values()
            .filter(|o| o.owner().is_none())
            .map(|o| o.handle())
            .collect()
    }

    /// Next handle that `add` would assign.
    pub fn handle_seed(&self) -> Handle {
        self.handle_seed
    }

    /// Raise the handle seed; it never moves below an existing handle.
    pub fn set_handle_seed(&mut self, seed: Handle) {
        if seed.value() > self.handle_seed.value() {
            self.handle_seed = seed;
        }
    }

    /// Find an object of kind `object_type` by name, ignoring ASCII case.
    pub fn find_by_name(&self, object_type: ObjectType, name: &str) -> Option<&dyn CadObject> {
        self.objects()
            .find(|o| o.object_type() == object_type && o.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Plain {
        handle: Handle,
        owner: Option<Handle>,
        reactors: BTreeSet<Handle>,
    }

    impl CadObject for Plain {
        fn handle(&self) -> Handle {
            self.handle
        }
        fn set_handle(&mut self, handle: Handle) {
            self.handle = handle;
        }
        fn owner(&self) -> Option<Handle> {
            self.owner
        }
        fn set_owner(&mut self, owner: Option<Handle>) {
            self.owner = owner;
        }
        fn object_type(&self) -> ObjectType {
            ObjectType(1)
        }
        fn reactors(&self) -> &BTreeSet<Handle> {
            &self.reactors
        }
        fn reactors_mut(&mut self) -> &mut BTreeSet<Handle> {
            &mut self.reactors
        }
        fn fields(&self) -> Vec<(i32, FieldValue)> {
            Vec::new()
        }
        fn apply_field(&mut self, _code: i32, _value: FieldValue) -> bool {
            false
        }
    }

    #[test]
    fn test_add_assigns_handles() {
        let mut doc = CadDocument::new();
        let a = doc.add(Box::new(Plain::default())).unwrap();
        let b = doc.add(Box::new(Plain { handle: Handle::new(0x40), ..Default::default() })).unwrap();
        let c = doc.add(Box::new(Plain::default())).unwrap();
        assert_eq!(a, Handle::new(1));
        assert_eq!(b, Handle::new(0x40));
        assert_eq!(c, Handle::new(0x41));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut doc = CadDocument::new();
        doc.add(Box::new(Plain { handle: Handle::new(42), ..Default::default() })).unwrap();
        let err = doc
            .add(Box::new(Plain { handle: Handle::new(42), ..Default::default() }))
            .unwrap_err();
        assert!(matches!(err, DxfError::DuplicateHandle(_)));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_seed_stops_at_largest_handle() {
        let mut doc = CadDocument::new();
        let top = doc.add(Box::new(Plain { handle: Handle::new(u64::MAX), ..Default::default() })).unwrap();
        assert_eq!(top, Handle::new(u64::MAX));
        assert_eq!(doc.handle_seed(), Handle::new(u64::MAX));

        let err = doc.add(Box::new(Plain::default())).unwrap_err();
        assert!(matches!(err, DxfError::DuplicateHandle(_)));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_roots() {
        let mut doc = CadDocument::new();
        let root = doc.add(Box::new(Plain::default())).unwrap();
        doc.add(Box::new(Plain { owner: Some(root), ..Default::default() })).unwrap();
        assert_eq!(doc.roots(), vec![root]);
    }
}
