//! Error types for the codec

use std::io;
use thiserror::Error;

use crate::types::Handle;

/// Main error type for codec operations
#[derive(Debug, Error)]
pub enum DxfError {
    /// IO error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported CAD file version
    #[error("Unsupported CAD version: {0:?}")]
    UnsupportedVersion(String),

    /// Checksum trailer does not match the recomputed accumulator
    #[error("Checksum mismatch: expected {expected:#06X}, got {actual:#06X}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    /// A read ran past the end of the available bytes
    #[error("Truncated stream: needed {requested} bits at bit {position}, only {available} available")]
    TruncatedStream {
        position: u64,
        requested: u64,
        available: u64,
    },

    /// A handle was registered twice in the same session
    #[error("Duplicate handle: {0}")]
    DuplicateHandle(Handle),

    /// A reference points to a handle that was never registered
    #[error("Unresolved reference from {from} to {target}")]
    UnresolvedReference { from: Handle, target: Handle },

    /// A record's type tag is not known to the catalog
    #[error("Unknown object type: {0}")]
    UnknownObjectType(String),

    /// An object is structurally incomplete (e.g. missing its own handle)
    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    /// Error parsing a value or record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid file header
    #[error("Invalid file header: {0}")]
    InvalidHeader(String),

    /// Invalid sentinel in file
    #[error("Invalid sentinel: {0}")]
    InvalidSentinel(String),

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, DxfError>;

impl DxfError {
    /// Shorthand for an out-of-data condition.
    pub fn truncated(position: u64, requested: u64, available: u64) -> Self {
        DxfError::TruncatedStream {
            position,
            requested,
            available,
        }
    }

    /// Whether the error only invalidates the record being decoded.
    ///
    /// Record-level errors let a failsafe reader resynchronise at the next
    /// record boundary; anything else aborts the whole operation.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            DxfError::ChecksumMismatch { .. }
                | DxfError::TruncatedStream { .. }
                | DxfError::Parse(_)
                | DxfError::UnknownObjectType(_)
                | DxfError::StructuralViolation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DxfError::UnsupportedVersion("AC1009".to_string());
        assert_eq!(err.to_string(), "Unsupported CAD version: \"AC1009\"");
    }

    #[test]
    fn test_checksum_error() {
        let err = DxfError::ChecksumMismatch {
            expected: 0x1234,
            actual: 0x5678,
        };
        assert!(err.to_string().contains("0x1234"));
        assert!(err.to_string().contains("0x5678"));
    }

    #[test]
    fn test_duplicate_handle_display() {
        let err = DxfError::DuplicateHandle(Handle::new(0x2A));
        assert_eq!(err.to_string(), "Duplicate handle: 0x2A");
    }

    #[test]
    fn test_record_level_classification() {
        assert!(DxfError::truncated(8, 8, 0).is_record_level());
        assert!(DxfError::ChecksumMismatch { expected: 1, actual: 2 }.is_record_level());
        assert!(!DxfError::DuplicateHandle(Handle::new(1)).is_record_level());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: DxfError = io_err.into();
        assert!(matches!(err, DxfError::Io(_)));
    }
}
