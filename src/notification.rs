//! Diagnostic notifications.
//!
//! Non-fatal issues encountered during reading or writing are collected as
//! [`Notification`] items rather than being silently dropped. Each one
//! carries a category, an optional [`DiagnosticKind`] naming the recoverable
//! anomaly, and the offending handle and byte offset when known.
//!
//! A [`NotificationCollection`] running in failsafe mode records everything
//! and lets processing continue; outside failsafe mode the first anomaly is
//! promoted to the matching [`DxfError`](crate::error::DxfError).

use std::fmt;

use crate::error::{DxfError, Result};
use crate::types::Handle;

/// Severity level of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// Purely informational (e.g. a comment found in a text file).
    Info,
    /// An object kind or feature is not implemented by the catalog.
    NotImplemented,
    /// Non-fatal warning (e.g. dangling reference, map disagreement).
    Warning,
    /// Error that was recovered from (e.g. a corrupted record skipped).
    Error,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "Info"),
            Self::NotImplemented => write!(f, "NotImplemented"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// The recoverable anomaly a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    ChecksumMismatch,
    TruncatedStream,
    DuplicateHandle,
    UnresolvedReference,
    UnknownObjectType,
    StructuralViolation,
    /// A tagged-text code that the object's field table does not know.
    UnknownTag,
    /// Anything else worth reporting.
    Other,
}

/// A single notification produced during reading or writing.
#[derive(Debug, Clone)]
pub struct Notification {
    /// The severity / category.
    pub notification_type: NotificationType,
    /// The anomaly being reported.
    pub kind: DiagnosticKind,
    /// A human-readable description of the issue.
    pub message: String,
    /// Handle of the offending object, if known.
    pub handle: Option<Handle>,
    /// Byte offset of the offending record, if known.
    pub offset: Option<u64>,
}

impl Notification {
    /// Create a new notification with no location.
    pub fn new(
        notification_type: NotificationType,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            notification_type,
            kind,
            message: message.into(),
            handle: None,
            offset: None,
        }
    }

    /// Attach the offending handle.
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Attach the offending byte offset.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether non-failsafe processing must stop on this notification.
    pub fn is_fatal_outside_failsafe(&self) -> bool {
        matches!(
            self.notification_type,
            NotificationType::Warning | NotificationType::Error
        ) && !matches!(self.kind, DiagnosticKind::Other | DiagnosticKind::UnknownTag)
    }

    /// Describe a recoverable error.
    pub fn from_error(error: &DxfError) -> Self {
        let (notification_type, kind, handle) = match error {
            DxfError::ChecksumMismatch { .. } => (NotificationType::Error, DiagnosticKind::ChecksumMismatch, None),
            DxfError::TruncatedStream { .. } => (NotificationType::Error, DiagnosticKind::TruncatedStream, None),
            DxfError::DuplicateHandle(h) => (NotificationType::Warning, DiagnosticKind::DuplicateHandle, Some(*h)),
            DxfError::UnresolvedReference { from, .. } => {
                (NotificationType::Warning, DiagnosticKind::UnresolvedReference, Some(*from))
            }
            DxfError::UnknownObjectType(_) => (NotificationType::Warning, DiagnosticKind::UnknownObjectType, None),
            DxfError::StructuralViolation(_) => {
                (NotificationType::Error, DiagnosticKind::StructuralViolation, None)
            }
            _ => (NotificationType::Error, DiagnosticKind::Other, None),
        };
        Self {
            notification_type,
            kind,
            message: error.to_string(),
            handle,
            offset: None,
        }
    }

    /// Convert into the error a non-failsafe session aborts with.
    pub fn to_error(&self) -> DxfError {
        let handle = self.handle.unwrap_or(Handle::NULL);
        match self.kind {
            DiagnosticKind::ChecksumMismatch | DiagnosticKind::TruncatedStream => {
                DxfError::Parse(self.message.clone())
            }
            DiagnosticKind::DuplicateHandle => DxfError::DuplicateHandle(handle),
            DiagnosticKind::UnresolvedReference => DxfError::UnresolvedReference {
                from: handle,
                target: Handle::NULL,
            },
            DiagnosticKind::UnknownObjectType => DxfError::UnknownObjectType(self.message.clone()),
            DiagnosticKind::StructuralViolation => {
                DxfError::StructuralViolation(self.message.clone())
            }
            DiagnosticKind::UnknownTag | DiagnosticKind::Other => {
                DxfError::Parse(self.message.clone())
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.notification_type, self.message)?;
        if let Some(handle) = self.handle {
            write!(f, " (handle {handle})")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset {offset})")?;
        }
        Ok(())
    }
}

/// Collects notifications during a read/write operation.
#[derive(Debug, Clone, Default)]
pub struct NotificationCollection {
    items: Vec<Notification>,
    failsafe: bool,
}

impl NotificationCollection {
    /// Create an empty collection that records everything.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            failsafe: true,
        }
    }

    /// Create an empty collection with the given failsafe policy.
    pub fn with_failsafe(failsafe: bool) -> Self {
        Self {
            items: Vec::new(),
            failsafe,
        }
    }

    /// Whether anomalies are recorded instead of aborting.
    pub fn failsafe(&self) -> bool {
        self.failsafe
    }

    /// Record a notification.
    ///
    /// Outside failsafe mode an anomaly is promoted to an error after being
    /// recorded, so the caller can propagate it with `?`.
    pub fn report(&mut self, notification: Notification) -> Result<()> {
        match notification.notification_type {
            NotificationType::Info => tracing::debug!("{notification}"),
            NotificationType::NotImplemented => tracing::info!("{notification}"),
            NotificationType::Warning | NotificationType::Error => {
                tracing::warn!("{notification}")
            }
        }

        let abort = !self.failsafe && notification.is_fatal_outside_failsafe();
        let error = abort.then(|| notification.to_error());
        self.items.push(notification);

        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Record a recoverable error.
    ///
    /// Outside failsafe mode the error itself is returned after being
    /// recorded, whatever its kind.
    pub fn report_error(&mut self, error: DxfError, handle: Option<Handle>, offset: Option<u64>) -> Result<()> {
        let mut notification = Notification::from_error(&error);
        notification.handle = handle.or(notification.handle);
        notification.offset = offset;
        tracing::warn!("{notification}");
        self.items.push(notification);

        if self.failsafe {
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Record a notification built from its parts.
    pub fn notify(
        &mut self,
        notification_type: NotificationType,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Result<()> {
        self.report(Notification::new(notification_type, kind, message))
    }

    /// Move every notification of `other` into this collection, in order.
    pub fn extend(&mut self, other: NotificationCollection) {
        self.items.extend(other.items);
    }

    /// Check if there are any notifications.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of notifications.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over all notifications.
    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }

    /// Get all notifications of a specific type.
    pub fn of_type(&self, nt: NotificationType) -> Vec<&Notification> {
        self.items
            .iter()
            .filter(|n| n.notification_type == nt)
            .collect()
    }

    /// Get all notifications reporting a specific anomaly.
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.kind == kind).collect()
    }

    /// Check whether any notification of the given type exists.
    pub fn has_type(&self, nt: NotificationType) -> bool {
        self.items.iter().any(|n| n.notification_type == nt)
    }

    /// Check whether any notification reports the given anomaly.
    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.items.iter().any(|n| n.kind == kind)
    }

    /// Consume the collection into a `Vec`.
    pub fn into_vec(self) -> Vec<Notification> {
        self.items
    }
}

impl IntoIterator for NotificationCollection {
    type Item = Notification;
    type IntoIter = std::vec::IntoIter<Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a NotificationCollection {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_creation() {
        let n = Notification::new(
            NotificationType::Warning,
            DiagnosticKind::UnresolvedReference,
            "handle missing",
        )
        .with_handle(Handle::new(0x10));
        assert_eq!(n.notification_type, NotificationType::Warning);
        assert_eq!(n.kind, DiagnosticKind::UnresolvedReference);
        assert_eq!(n.handle, Some(Handle::new(0x10)));
    }

    #[test]
    fn test_collection_basics() {
        let mut c = NotificationCollection::new();
        assert!(c.is_empty());

        c.notify(NotificationType::Warning, DiagnosticKind::Other, "w1").unwrap();
        c.notify(NotificationType::Error, DiagnosticKind::ChecksumMismatch, "e1")
            .unwrap();
        c.notify(NotificationType::Warning, DiagnosticKind::Other, "w2").unwrap();

        assert_eq!(c.len(), 3);
        assert_eq!(c.of_type(NotificationType::Warning).len(), 2);
        assert!(c.has_type(NotificationType::Error));
        assert!(c.has_kind(DiagnosticKind::ChecksumMismatch));
        assert!(!c.has_type(NotificationType::NotImplemented));
    }

    #[test]
    fn test_strict_mode_promotes_anomalies() {
        let mut c = NotificationCollection::with_failsafe(false);
        let result = c.report(
            Notification::new(
                NotificationType::Warning,
                DiagnosticKind::DuplicateHandle,
                "repeated handle",
            )
            .with_handle(Handle::new(42)),
        );
        assert!(matches!(result, Err(DxfError::DuplicateHandle(h)) if h == Handle::new(42)));
        // Still recorded so the caller can inspect the log.
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_strict_mode_keeps_info() {
        let mut c = NotificationCollection::with_failsafe(false);
        assert!(c
            .notify(NotificationType::Info, DiagnosticKind::Other, "comment")
            .is_ok());
    }

    #[test]
    fn test_report_error_keeps_original_in_strict_mode() {
        let mut c = NotificationCollection::with_failsafe(false);
        let err = c
            .report_error(DxfError::ChecksumMismatch { expected: 1, actual: 2 }, None, Some(64))
            .unwrap_err();
        assert!(matches!(err, DxfError::ChecksumMismatch { expected: 1, actual: 2 }));
        assert_eq!(c.of_kind(DiagnosticKind::ChecksumMismatch)[0].offset, Some(64));

        let mut lenient = NotificationCollection::new();
        lenient
            .report_error(DxfError::Parse("bad record".into()), Some(Handle::new(3)), None)
            .unwrap();
        assert_eq!(lenient.iter().next().unwrap().handle, Some(Handle::new(3)));
    }

    #[test]
    fn test_display() {
        let n = Notification::new(
            NotificationType::NotImplemented,
            DiagnosticKind::UnknownObjectType,
            "PROXY_ENTITY",
        )
        .with_offset(128);
        assert_eq!(format!("{}", n), "[NotImplemented] PROXY_ENTITY (offset 128)");
    }
}
