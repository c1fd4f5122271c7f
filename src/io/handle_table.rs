//! Per-session handle table.
//!
//! On the write path the table maps handles to the byte offset of their
//! framed record; on the read path it maps handles to decoded templates.
//! Pass 2 of the read pipeline only accepts a [`CompletedHandleTable`],
//! which can only be obtained once registration is over.

use indexmap::IndexMap;

use crate::error::{DxfError, Result};
use crate::types::Handle;

type HandleMap<V> = IndexMap<Handle, V, ahash::RandomState>;

/// Insertion-ordered `Handle -> V` map that rejects duplicates.
#[derive(Debug, Clone)]
pub struct HandleTable<V> {
    entries: HandleMap<V>,
}

impl<V> Default for HandleTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HandleTable<V> {
    pub fn new() -> Self {
        Self {
            entries: HandleMap::default(),
        }
    }

    /// Register `value` under `handle`.
    ///
    /// A handle that is already present is rejected with
    /// [`DxfError::DuplicateHandle`] and the first entry is kept.
    pub fn register(&mut self, handle: Handle, value: V) -> Result<()> {
        if handle.is_null() {
            return Err(DxfError::StructuralViolation(
                "Cannot register an object without a handle".to_string(),
            ));
        }
        if self.entries.contains_key(&handle) {
            return Err(DxfError::DuplicateHandle(handle));
        }
        self.entries.insert(handle, value);
        Ok(())
    }

    pub fn resolve(&self, handle: Handle) -> Option<&V> {
        self.entries.get(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &V)> {
        self.entries.iter().map(|(h, v)| (*h, v))
    }

    /// End registration.
    pub fn complete(self) -> CompletedHandleTable<V> {
        CompletedHandleTable {
            entries: self.entries,
        }
    }
}

impl HandleTable<u64> {
    /// Record the offset of the record just framed for `handle`.
    pub fn assign(&mut self, handle: Handle, offset: u64) -> Result<()> {
        self.register(handle, offset)
    }
}

/// A handle table after registration ended. Read-only.
#[derive(Debug, Clone)]
pub struct CompletedHandleTable<V> {
    entries: HandleMap<V>,
}

impl<V> CompletedHandleTable<V> {
    pub fn resolve(&self, handle: Handle) -> Option<&V> {
        self.entries.get(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &V)> {
        self.entries.iter().map(|(h, v)| (*h, v))
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.keys().copied()
    }

    /// Entries sorted by handle value.
    pub fn sorted(&self) -> Vec<(Handle, &V)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by_key(|(h, _)| *h);
        sorted
    }

    /// Consume the table, yielding entries in registration order.
    pub fn into_entries(self) -> impl Iterator<Item = (Handle, V)> {
        self.entries.into_iter()
    }
}
