//! Per-revision feature table.
//!
//! Every version-dependent decision in the binary codec reads a flag from
//! [`VersionFeatures`]. Supporting a new revision means adding one row to
//! [`FEATURE_TABLE`].

use ahash::AHashMap;
use bitflags::bitflags;
use once_cell::sync::Lazy;

use crate::error::{DxfError, Result};
use crate::types::DxfVersion;

bitflags! {
    /// Optional layout rules active for a revision.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VersionFeatures: u32 {
        /// RL data-size-in-bits field after the object type (R13-R2007).
        const OBJECT_SIZE_IN_BITS    = 1 << 0;
        /// MC handle-stream bit length after the MS record size (R2010+).
        const HANDLE_STREAM_SIZE     = 1 << 1;
        /// Two-bit-prefixed object type instead of BS (R2010+).
        const OBJECT_TYPE_OT         = 1 << 2;
        /// TV strings are UTF-16LE instead of code page bytes (R2007+).
        const UNICODE_TEXT           = 1 << 3;
        /// BLL fields are available (R2010+).
        const BIT_LONG_LONG          = 1 << 4;
        /// "No xdictionary" bit in the common object data (R2004+).
        const XDICTIONARY_FLAG       = 1 << 5;
        /// "Has data store" bit in the common object data (R2013+).
        const DATA_STORE_FLAG        = 1 << 6;
        /// Locator entries carry a per-section checksum seed (R2004+).
        const SECTION_CHECKSUM_SEEDS = 1 << 7;
    }
}

/// Revision -> feature rows.
pub static FEATURE_TABLE: Lazy<AHashMap<DxfVersion, VersionFeatures>> = Lazy::new(|| {
    use VersionFeatures as F;

    let r13 = F::OBJECT_SIZE_IN_BITS;
    let r2004 = r13 | F::XDICTIONARY_FLAG | F::SECTION_CHECKSUM_SEEDS;
    let r2007 = r2004 | F::UNICODE_TEXT;
    let r2010 = (r2007 - F::OBJECT_SIZE_IN_BITS)
        | F::HANDLE_STREAM_SIZE
        | F::OBJECT_TYPE_OT
        | F::BIT_LONG_LONG;
    let r2013 = r2010 | F::DATA_STORE_FLAG;

    let mut table = AHashMap::new();
    table.insert(DxfVersion::AC1012, r13);
    table.insert(DxfVersion::AC1014, r13);
    table.insert(DxfVersion::AC1015, r13);
    table.insert(DxfVersion::AC1018, r2004);
    table.insert(DxfVersion::AC1021, r2007);
    table.insert(DxfVersion::AC1024, r2010);
    table.insert(DxfVersion::AC1027, r2013);
    table.insert(DxfVersion::AC1032, r2013);
    table
});

impl VersionFeatures {
    /// Look up the rules for a revision; `None` for unsupported revisions.
    pub fn lookup(version: DxfVersion) -> Option<VersionFeatures> {
        FEATURE_TABLE.get(&version).copied()
    }

    /// Like [`lookup`](Self::lookup) but reports unsupported revisions as an error.
    pub fn for_version(version: DxfVersion) -> Result<VersionFeatures> {
        Self::lookup(version)
            .ok_or_else(|| DxfError::UnsupportedVersion(version.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_revision_has_a_row() {
        for v in DxfVersion::ALL {
            assert!(VersionFeatures::lookup(v).is_some(), "{v} missing");
        }
        assert!(VersionFeatures::for_version(DxfVersion::Unknown).is_err());
    }

    #[test]
    fn test_size_prefix_rules_are_exclusive() {
        for v in DxfVersion::ALL {
            let f = VersionFeatures::lookup(v).unwrap();
            assert_ne!(
                f.contains(VersionFeatures::OBJECT_SIZE_IN_BITS),
                f.contains(VersionFeatures::HANDLE_STREAM_SIZE),
                "{v}"
            );
        }
    }

    #[test]
    fn test_feature_thresholds() {
        let r2000 = VersionFeatures::for_version(DxfVersion::AC1015).unwrap();
        let r2007 = VersionFeatures::for_version(DxfVersion::AC1021).unwrap();
        let r2013 = VersionFeatures::for_version(DxfVersion::AC1027).unwrap();

        assert!(!r2000.contains(VersionFeatures::XDICTIONARY_FLAG));
        assert!(r2007.contains(VersionFeatures::UNICODE_TEXT));
        assert!(r2007.contains(VersionFeatures::OBJECT_SIZE_IN_BITS));
        assert!(r2013.contains(VersionFeatures::DATA_STORE_FLAG | VersionFeatures::OBJECT_TYPE_OT));
    }
}
