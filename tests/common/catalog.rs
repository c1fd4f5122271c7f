//! A small object catalog for integration tests.
//!
//! Every kind is a [`TestObject`] whose values live in a map keyed by field
//! code, so the field tables below fully describe each kind.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use acad_codec::document::{CadObject, ObjectCatalog};
use acad_codec::io::dwg::DwgReferenceType;
use acad_codec::io::{FieldDescriptor, FieldKind, FieldValue, KindResolution, ResolveContext, Template};
use acad_codec::notification::{DiagnosticKind, Notification, NotificationType};
use acad_codec::{Handle, ObjectType};

pub const LINE: ObjectType = ObjectType(19);
pub const BLOCK_RECORD: ObjectType = ObjectType(49);
pub const LAYER: ObjectType = ObjectType(51);
pub const LAYER_TABLE: ObjectType = ObjectType(50);
pub const XRECORD: ObjectType = ObjectType(501);

/// Entity chain of a block record. Set by pass 2, never written.
pub const ENTITY_CHAIN: i32 = -1;

pub const LAYER_TABLE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(100, FieldKind::Subclass("AcDbSymbolTable"), "subclass"),
    FieldDescriptor::new(70, FieldKind::Count { list_code: 331 }, "count"),
    FieldDescriptor::new(331, FieldKind::HandleList(DwgReferenceType::SoftOwnership), "entries"),
];

pub const LAYER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(100, FieldKind::Subclass("AcDbSymbolTableRecord"), "subclass"),
    FieldDescriptor::new(100, FieldKind::Subclass("AcDbLayerTableRecord"), "subclass"),
    FieldDescriptor::new(2, FieldKind::Text, "name"),
    FieldDescriptor::new(70, FieldKind::Int16, "flags"),
    FieldDescriptor::new(62, FieldKind::Int16, "color"),
    FieldDescriptor::new(290, FieldKind::Bool, "plot"),
];

pub const BLOCK_RECORD_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(100, FieldKind::Subclass("AcDbSymbolTableRecord"), "subclass"),
    FieldDescriptor::new(100, FieldKind::Subclass("AcDbBlockTableRecord"), "subclass"),
    FieldDescriptor::new(2, FieldKind::Text, "name"),
    FieldDescriptor::new(340, FieldKind::Handle(DwgReferenceType::SoftPointer), "first_entity"),
    FieldDescriptor::new(341, FieldKind::Handle(DwgReferenceType::SoftPointer), "last_entity"),
    FieldDescriptor::new(310, FieldKind::Binary, "preview"),
];

pub const LINE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(100, FieldKind::Subclass("AcDbEntity"), "subclass"),
    FieldDescriptor::new(8, FieldKind::NameReference { target: LAYER }, "layer"),
    FieldDescriptor::new(360, FieldKind::Handle(DwgReferenceType::SoftPointer), "next_entity"),
    FieldDescriptor::new(100, FieldKind::Subclass("AcDbLine"), "subclass"),
    FieldDescriptor::new(1, FieldKind::Text, "label"),
    FieldDescriptor::new(10, FieldKind::Point3, "start"),
    FieldDescriptor::new(11, FieldKind::Point3, "end"),
    FieldDescriptor::new(39, FieldKind::Double, "thickness"),
    FieldDescriptor::new(48, FieldKind::DoubleWithDefault { default_code: 39 }, "linetype_scale"),
    FieldDescriptor::new(49, FieldKind::RawDouble, "elevation"),
    FieldDescriptor::new(90, FieldKind::Int32, "flags"),
    FieldDescriptor::new(160, FieldKind::Int64, "serial"),
];

pub const XRECORD_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(100, FieldKind::Subclass("AcDbXrecord"), "subclass"),
    FieldDescriptor::new(1, FieldKind::Text, "data"),
    FieldDescriptor::new(90, FieldKind::Int32, "value"),
];

const KINDS: &[(ObjectType, &str, &[FieldDescriptor])] = &[
    (LAYER_TABLE, "TABLE", LAYER_TABLE_FIELDS),
    (LAYER, "LAYER", LAYER_FIELDS),
    (BLOCK_RECORD, "BLOCK_RECORD", BLOCK_RECORD_FIELDS),
    (LINE, "LINE", LINE_FIELDS),
    (XRECORD, "XRECORD", XRECORD_FIELDS),
];

fn fields_of(object_type: ObjectType) -> &'static [FieldDescriptor] {
    KINDS
        .iter()
        .find(|(ty, _, _)| *ty == object_type)
        .map(|(_, _, fields)| *fields)
        .unwrap_or(&[])
}

fn is_value_field(descriptor: &FieldDescriptor) -> bool {
    !matches!(descriptor.kind, FieldKind::Subclass(_) | FieldKind::Count { .. })
}

/// An object whose values are keyed by field code.
#[derive(Debug, Clone, PartialEq)]
pub struct TestObject {
    object_type: ObjectType,
    handle: Handle,
    owner: Option<Handle>,
    reactors: BTreeSet<Handle>,
    values: BTreeMap<i32, FieldValue>,
    chain: Vec<Handle>,
}

impl TestObject {
    /// A blank object with every field at its default value.
    pub fn new(object_type: ObjectType) -> Self {
        let values = fields_of(object_type)
            .iter()
            .filter(|d| is_value_field(d))
            .filter_map(|d| FieldValue::default_for(&d.kind).map(|v| (d.code, v)))
            .collect();
        Self {
            object_type,
            handle: Handle::NULL,
            owner: None,
            reactors: BTreeSet::new(),
            values,
            chain: Vec::new(),
        }
    }

    pub fn with_handle(mut self, handle: u64) -> Self {
        self.handle = Handle::new(handle);
        self
    }

    pub fn owned_by(mut self, owner: u64) -> Self {
        self.owner = Some(Handle::new(owner));
        self
    }

    pub fn with_reactor(mut self, reactor: u64) -> Self {
        self.reactors.insert(Handle::new(reactor));
        self
    }

    pub fn with(mut self, code: i32, value: FieldValue) -> Self {
        assert!(self.apply_field(code, value), "code {code} not in {}", self.object_type);
        self
    }

    pub fn value(&self, code: i32) -> Option<&FieldValue> {
        self.values.get(&code)
    }
}

impl CadObject for TestObject {
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
        self.object_type
    }

    fn reactors(&self) -> &BTreeSet<Handle> {
        &self.reactors
    }

    fn reactors_mut(&mut self) -> &mut BTreeSet<Handle> {
        &mut self.reactors
    }

    fn name(&self) -> Option<&str> {
        match (self.object_type, self.values.get(&2)) {
            (LAYER | BLOCK_RECORD, Some(FieldValue::Text(name))) => Some(name),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(i32, FieldValue)> {
        let mut fields: Vec<_> = self.values.iter().map(|(code, value)| (*code, value.clone())).collect();
        if !self.chain.is_empty() {
            fields.push((ENTITY_CHAIN, FieldValue::Handles(self.chain.clone())));
        }
        fields
    }

    fn apply_field(&mut self, code: i32, value: FieldValue) -> bool {
        if code == ENTITY_CHAIN && self.object_type == BLOCK_RECORD {
            if let FieldValue::Handles(list) = value {
                self.chain = list;
                return true;
            }
            return false;
        }
        let known = fields_of(self.object_type)
            .iter()
            .any(|d| d.code == code && is_value_field(d));
        if known {
            self.values.insert(code, value);
        }
        known
    }
}

/// Catalog over the kinds above, optionally hiding one of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestCatalog {
    hidden: Option<ObjectType>,
}

impl TestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog that does not know `object_type`.
    pub fn without(object_type: ObjectType) -> Self {
        Self {
            hidden: Some(object_type),
        }
    }

    fn knows(&self, object_type: ObjectType) -> bool {
        self.hidden != Some(object_type) && KINDS.iter().any(|(ty, _, _)| *ty == object_type)
    }
}

impl ObjectCatalog for TestCatalog {
    fn create(&self, object_type: ObjectType) -> Option<Box<dyn CadObject>> {
        self.knows(object_type)
            .then(|| Box::new(TestObject::new(object_type)) as Box<dyn CadObject>)
    }

    fn type_from_dxf_name(&self, name: &str) -> Option<ObjectType> {
        KINDS
            .iter()
            .find(|(ty, n, _)| *n == name && self.knows(*ty))
            .map(|(ty, _, _)| *ty)
    }

    fn dxf_name(&self, object_type: ObjectType) -> Option<&'static str> {
        KINDS
            .iter()
            .find(|(ty, _, _)| *ty == object_type && self.knows(*ty))
            .map(|(_, name, _)| *name)
    }

    fn fields(&self, object_type: ObjectType) -> &'static [FieldDescriptor] {
        fields_of(object_type)
    }

    fn is_entity(&self, object_type: ObjectType) -> bool {
        object_type == LINE
    }

    /// Block records collect their entities by walking the `next_entity`
    /// links from the first to the last entity.
    fn resolve(&self, template: &Template, context: &ResolveContext<'_>) -> KindResolution {
        let mut resolution = KindResolution::default();
        if template.object_type() != BLOCK_RECORD {
            return resolution;
        }
        let (Some(first), Some(last)) = (template.pending_handle(340), template.pending_handle(341)) else {
            return resolution;
        };

        let chain = context.follow_chain(first, last, 360);
        if let Some(broken) = chain.broken_at {
            resolution.diagnostics.push(Notification::new(
                NotificationType::Warning,
                DiagnosticKind::UnresolvedReference,
                format!("Entity chain broken at {broken}"),
            ));
        }
        resolution.fields.push((ENTITY_CHAIN, FieldValue::Handles(chain.handles)));
        resolution
    }
}
