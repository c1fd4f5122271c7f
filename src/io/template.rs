//! Templates: one per decoded object, holding the references that pass 2
//! has to resolve.

use std::collections::{BTreeMap, BTreeSet};

use crate::document::CadObject;
use crate::io::field::FieldValue;
use crate::notification::Notification;
use crate::types::{Handle, ObjectType};

/// An unresolved reference slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReference {
    Handle(Handle),
    Handles(Vec<Handle>),
    /// A reference stored by name, looked up in the name index.
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateState {
    /// Decoded, not yet registered.
    Created,
    /// Registered in the handle table, waiting for pass 2.
    PendingResolution,
    /// Pass 2 applied.
    Resolved,
}

/// Working representation of one object during reconstruction.
#[derive(Debug)]
pub struct Template {
    object: Box<dyn CadObject>,
    /// Raw owner handle as decoded.
    pub owner_handle: Option<Handle>,
    /// Raw reactor handles as decoded.
    pub reactor_handles: Vec<Handle>,
    /// Reference slots keyed by field code.
    pub pending: BTreeMap<i32, PendingReference>,
    /// Byte offset of the source record, for diagnostics.
    pub offset: Option<u64>,
    state: TemplateState,
}

impl Template {
    pub fn new(object: Box<dyn CadObject>) -> Self {
        Self {
            object,
            owner_handle: None,
            reactor_handles: Vec::new(),
            pending: BTreeMap::new(),
            offset: None,
            state: TemplateState::Created,
        }
    }

    pub fn handle(&self) -> Handle {
        self.object.handle()
    }

    pub fn object_type(&self) -> ObjectType {
        self.object.object_type()
    }

    pub fn object(&self) -> &dyn CadObject {
        self.object.as_ref()
    }

    pub fn object_mut(&mut self) -> &mut dyn CadObject {
        self.object.as_mut()
    }

    pub fn state(&self) -> TemplateState {
        self.state
    }

    pub(crate) fn mark_registered(&mut self) {
        if self.state == TemplateState::Created {
            self.state = TemplateState::PendingResolution;
        }
    }

    /// Handle stored in slot `code`, if it holds a single non-null handle.
    pub fn pending_handle(&self, code: i32) -> Option<Handle> {
        match self.pending.get(&code) {
            Some(PendingReference::Handle(h)) => h.non_null(),
            _ => None,
        }
    }

    /// Handles stored in slot `code`.
    pub fn pending_handles(&self, code: i32) -> &[Handle] {
        match self.pending.get(&code) {
            Some(PendingReference::Handles(list)) => list,
            _ => &[],
        }
    }

    pub fn pending_name(&self, code: i32) -> Option<&str> {
        match self.pending.get(&code) {
            Some(PendingReference::Name(n)) => Some(n),
            _ => None,
        }
    }

    /// Apply a pass-2 result. Runs once; later calls return `false` and
    /// leave the object untouched.
    pub fn apply(&mut self, resolution: &Resolution) -> bool {
        if self.state == TemplateState::Resolved {
            return false;
        }
        self.object.set_owner(resolution.owner);
        *self.object.reactors_mut() = resolution.reactors.clone();
        for (code, value) in &resolution.fields {
            self.object.apply_field(*code, value.clone());
        }
        self.state = TemplateState::Resolved;
        true
    }

    pub fn into_object(self) -> Box<dyn CadObject> {
        self.object
    }
}

/// Extra fields and diagnostics produced by a catalog's kind-specific
/// resolution.
#[derive(Debug, Default)]
pub struct KindResolution {
    pub fields: Vec<(i32, FieldValue)>,
    pub diagnostics: Vec<Notification>,
}

/// Everything pass 2 decided for one template.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub handle: Handle,
    pub owner: Option<Handle>,
    pub reactors: BTreeSet<Handle>,
    /// Resolved reference fields, applied in order.
    pub fields: Vec<(i32, FieldValue)>,
    pub diagnostics: Vec<Notification>,
}

impl Resolution {
    /// Owner, reactors and fields; the part that must not depend on order.
    pub fn outcome(&self) -> (Option<Handle>, &BTreeSet<Handle>, &[(i32, FieldValue)]) {
        (self.owner, &self.reactors, &self.fields)
    }
}
