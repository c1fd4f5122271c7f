//! Document builder: the two-pass reconstruction.
//!
//! Pass 1 is driven by the binary or tagged-text reader, which decodes every
//! record into a [`Template`] and hands it to [`DocumentBuilder::add_template`].
//! Pass 2 starts in [`DocumentBuilder::build`]: the handle table is
//! completed, a name index is built from it, and every template is resolved
//! against that immutable state before any result is applied. Resolution is
//! therefore independent of the order in which templates are visited.

use std::collections::BTreeSet;

use ahash::{AHashMap, AHashSet};

use crate::document::{CadDocument, ObjectCatalog};
use crate::error::{DxfError, Result};
use crate::io::field::{descriptor_for, FieldKind, FieldValue};
use crate::io::handle_table::{CompletedHandleTable, HandleTable};
use crate::io::template::{PendingReference, Resolution, Template};
use crate::notification::{DiagnosticKind, Notification, NotificationCollection, NotificationType};
use crate::types::{DxfVersion, Handle, ObjectType};

/// `(kind, name) -> handle` index built at the end of pass 1.
///
/// Names compare ignoring ASCII case; the first object with a name wins.
#[derive(Debug, Default)]
pub struct NameIndex {
    entries: AHashMap<(ObjectType, String), Handle>,
}

impl NameIndex {
    pub fn build(table: &CompletedHandleTable<Template>) -> Self {
        let mut entries = AHashMap::new();
        for (handle, template) in table.iter() {
            if let Some(name) = template.object().name() {
                entries
                    .entry((template.object_type(), name.to_ascii_uppercase()))
                    .or_insert(handle);
            }
        }
        Self { entries }
    }

    pub fn get(&self, object_type: ObjectType, name: &str) -> Option<Handle> {
        self.entries
            .get(&(object_type, name.to_ascii_uppercase()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of walking a linked sequence of objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedChain {
    /// Members in link order, starting with the first handle.
    pub handles: Vec<Handle>,
    /// The link that pointed at an unregistered or missing object.
    pub broken_at: Option<Handle>,
    /// Whether the walk stopped because a member repeated.
    pub cyclic: bool,
}

impl LinkedChain {
    pub fn is_complete(&self) -> bool {
        self.broken_at.is_none() && !self.cyclic
    }
}

/// Read-only view of the completed pass-1 state.
pub struct ResolveContext<'a> {
    table: &'a CompletedHandleTable<Template>,
    names: &'a NameIndex,
    catalog: &'a dyn ObjectCatalog,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        table: &'a CompletedHandleTable<Template>,
        names: &'a NameIndex,
        catalog: &'a dyn ObjectCatalog,
    ) -> Self {
        Self {
            table,
            names,
            catalog,
        }
    }

    pub fn lookup(&self, handle: Handle) -> Option<&'a Template> {
        self.table.resolve(handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.table.contains(handle)
    }

    pub fn handle_by_name(&self, object_type: ObjectType, name: &str) -> Option<Handle> {
        self.names.get(object_type, name)
    }

    pub fn catalog(&self) -> &'a dyn ObjectCatalog {
        self.catalog
    }

    /// Walk from `first` through the `next_code` slot of each member until
    /// `last` is reached.
    ///
    /// The walk stops at a null link, at a handle that was never registered
    /// (reported in `broken_at`) or when a member repeats.
    pub fn follow_chain(&self, first: Handle, last: Handle, next_code: i32) -> LinkedChain {
        let mut chain = LinkedChain::default();
        let mut seen = AHashSet::new();
        let mut current = first.non_null();

        while let Some(handle) = current {
            let Some(template) = self.lookup(handle) else {
                chain.broken_at = Some(handle);
                break;
            };
            if !seen.insert(handle) {
                chain.cyclic = true;
                break;
            }
            chain.handles.push(handle);
            if handle == last {
                break;
            }
            current = template.pending_handle(next_code);
            if current.is_none() && last.is_valid() {
                chain.broken_at = Some(handle);
            }
        }
        chain
    }
}

fn unresolved(from: Handle, what: &str, target: &str) -> Notification {
    Notification::new(
        NotificationType::Warning,
        DiagnosticKind::UnresolvedReference,
        format!("{what} {target} of object {from} not found"),
    )
    .with_handle(from)
}

/// Compute the pass-2 result for one template.
///
/// A pure function of the template and the context; nothing is mutated.
pub fn resolve_template(template: &Template, context: &ResolveContext<'_>) -> Resolution {
    let handle = template.handle();
    let mut diagnostics = Vec::new();

    let owner = match template.owner_handle.and_then(Handle::non_null) {
        Some(owner) if context.contains(owner) => Some(owner),
        Some(owner) => {
            diagnostics.push(unresolved(handle, "Owner", &owner.to_string()));
            None
        }
        None => None,
    };

    let mut reactors = BTreeSet::new();
    for &reactor in &template.reactor_handles {
        if reactor.is_null() {
            continue;
        }
        if context.contains(reactor) {
            reactors.insert(reactor);
        } else {
            diagnostics.push(unresolved(handle, "Reactor", &reactor.to_string()));
        }
    }

    let descriptors = context.catalog().fields(template.object_type());
    let mut fields = Vec::new();
    for (&code, pending) in &template.pending {
        let kind = descriptor_for(descriptors, code).map(|d| d.kind);
        match pending {
            PendingReference::Handle(target) => {
                if target.is_null() {
                    continue;
                }
                if context.contains(*target) {
                    fields.push((code, FieldValue::Handle(*target)));
                } else {
                    diagnostics.push(unresolved(handle, &format!("Reference {code}"), &target.to_string()));
                }
            }
            PendingReference::Handles(targets) => {
                let mut kept = Vec::with_capacity(targets.len());
                for target in targets.iter().filter(|t| t.is_valid()) {
                    if context.contains(*target) {
                        kept.push(*target);
                    } else {
                        diagnostics.push(unresolved(handle, &format!("Reference {code}"), &target.to_string()));
                    }
                }
                fields.push((code, FieldValue::Handles(kept)));
            }
            PendingReference::Name(name) => {
                if name.is_empty() {
                    continue;
                }
                let resolved = match kind {
                    Some(FieldKind::NameReference { target }) => context.handle_by_name(target, name),
                    _ => None,
                };
                match resolved {
                    Some(target) => fields.push((code, FieldValue::Handle(target))),
                    None => diagnostics.push(unresolved(handle, &format!("Name reference {code}"), &format!("{name:?}"))),
                }
            }
        }
    }

    let kind_specific = context.catalog().resolve(template, context);
    fields.extend(kind_specific.fields);
    diagnostics.extend(
        kind_specific
            .diagnostics
            .into_iter()
            .map(|d| if d.handle.is_none() { d.with_handle(handle) } else { d }),
    );

    Resolution {
        handle,
        owner,
        reactors,
        fields,
        diagnostics,
    }
}

/// Collects templates during pass 1 and runs pass 2.
pub struct DocumentBuilder<'c> {
    catalog: &'c dyn ObjectCatalog,
    version: DxfVersion,
    handle_seed: Handle,
    templates: HandleTable<Template>,
    notifications: NotificationCollection,
}

impl<'c> DocumentBuilder<'c> {
    pub fn new(catalog: &'c dyn ObjectCatalog, version: DxfVersion, notifications: NotificationCollection) -> Self {
        Self {
            catalog,
            version,
            handle_seed: Handle::NULL,
            templates: HandleTable::new(),
            notifications,
        }
    }

    pub fn catalog(&self) -> &'c dyn ObjectCatalog {
        self.catalog
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCollection {
        &mut self.notifications
    }

    pub fn version(&self) -> DxfVersion {
        self.version
    }

    pub fn set_version(&mut self, version: DxfVersion) {
        self.version = version;
    }

    pub fn set_handle_seed(&mut self, seed: Handle) {
        self.handle_seed = seed;
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Register a decoded template.
    ///
    /// An object without a handle is dropped with a `StructuralViolation`
    /// diagnostic; a repeated handle is dropped with a `DuplicateHandle`
    /// diagnostic and the first registration is kept.
    pub fn add_template(&mut self, mut template: Template) -> Result<()> {
        let handle = template.handle();
        let offset = template.offset;

        if handle.is_null() {
            let mut n = Notification::new(
                NotificationType::Error,
                DiagnosticKind::StructuralViolation,
                format!("Object of {} has no handle", template.object_type()),
            );
            if let Some(offset) = offset {
                n = n.with_offset(offset);
            }
            return self.notifications.report(n);
        }

        template.mark_registered();
        match self.templates.register(handle, template) {
            Ok(()) => Ok(()),
            Err(DxfError::DuplicateHandle(h)) => {
                let mut n = Notification::new(
                    NotificationType::Warning,
                    DiagnosticKind::DuplicateHandle,
                    format!("Repeated handle {h}, keeping the first object"),
                )
                .with_handle(h);
                if let Some(offset) = offset {
                    n = n.with_offset(offset);
                }
                self.notifications.report(n)
            }
            Err(e) => Err(e),
        }
    }

    /// Run pass 2 and hand the objects to a new document.
    pub fn build(mut self) -> Result<CadDocument> {
        let table = self.templates.complete();
        let resolutions: Vec<Resolution> = {
            let names = NameIndex::build(&table);
            let context = ResolveContext::new(&table, &names, self.catalog);
            table
                .iter()
                .map(|(_, template)| resolve_template(template, &context))
                .collect()
        };
        tracing::debug!(objects = table.len(), "resolved templates");

        let mut document = CadDocument::with_version(self.version);
        for ((_, mut template), resolution) in table.into_entries().zip(resolutions) {
            for diagnostic in resolution.diagnostics.iter().cloned() {
                self.notifications.report(diagnostic)?;
            }
            template.apply(&resolution);
            document.add(template.into_object())?;
        }

        document.set_handle_seed(self.handle_seed);
        document.notifications = self.notifications;
        Ok(document)
    }
}
