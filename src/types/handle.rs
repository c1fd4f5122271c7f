//! Handle type for CAD objects
//!
//! Handles are unique 64-bit identifiers for all CAD objects in a document.

use std::fmt;

use crate::error::{DxfError, Result};

/// A unique identifier for CAD objects
///
/// Handles are 64-bit unsigned integers that uniquely identify
/// objects within a CAD document. Handle 0 means "not yet assigned".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// The null/unassigned handle (0)
    pub const NULL: Handle = Handle(0);

    /// Create a new handle from a u64 value
    #[inline]
    pub const fn new(value: u64) -> Self {
        Handle(value)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Check if this is a null/unassigned handle
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Check if this is an assigned handle
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// `Some(self)` for assigned handles, `None` for [`Handle::NULL`].
    #[inline]
    pub fn non_null(self) -> Option<Handle> {
        self.is_valid().then_some(self)
    }

    /// Number of significant bytes needed to store the value (0 for NULL).
    pub fn byte_count(&self) -> u8 {
        (8 - self.0.leading_zeros() / 8) as u8
    }

    /// Parse the upper-case hex form used by tagged-text files.
    pub fn from_hex(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Handle::NULL);
        }
        u64::from_str_radix(trimmed, 16)
            .map(Handle)
            .map_err(|_| DxfError::Parse(format!("Invalid handle value: {trimmed:?}")))
    }

    /// Upper-case hex without prefix, as written to tagged-text files.
    pub fn to_hex(&self) -> String {
        format!("{:X}", self.0)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NULL
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Handle(value)
    }
}

impl From<Handle> for u64 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

impl fmt::UpperHex for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}
