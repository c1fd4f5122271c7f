//! Format revisions.

use std::fmt;

/// A format revision, named by the `$ACADVER` string it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DxfVersion {
    Unknown,
    /// R13
    AC1012,
    /// R14
    AC1014,
    /// R2000
    AC1015,
    /// R2004
    AC1018,
    /// R2007
    AC1021,
    /// R2010
    AC1024,
    /// R2013
    AC1027,
    /// R2018
    AC1032,
}

impl DxfVersion {
    /// Every known revision, oldest first.
    pub const ALL: [DxfVersion; 8] = [
        DxfVersion::AC1012,
        DxfVersion::AC1014,
        DxfVersion::AC1015,
        DxfVersion::AC1018,
        DxfVersion::AC1021,
        DxfVersion::AC1024,
        DxfVersion::AC1027,
        DxfVersion::AC1032,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DxfVersion::Unknown => "UNKNOWN",
            DxfVersion::AC1012 => "AC1012",
            DxfVersion::AC1014 => "AC1014",
            DxfVersion::AC1015 => "AC1015",
            DxfVersion::AC1018 => "AC1018",
            DxfVersion::AC1021 => "AC1021",
            DxfVersion::AC1024 => "AC1024",
            DxfVersion::AC1027 => "AC1027",
            DxfVersion::AC1032 => "AC1032",
        }
    }

    /// Parse a `$ACADVER` / file-magic string. Unrecognised strings map to `Unknown`.
    pub fn from_version_string(s: &str) -> Self {
        DxfVersion::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s.trim())
            .unwrap_or(DxfVersion::Unknown)
    }

    /// Maintenance version byte written after the magic.
    pub fn maintenance_version(&self) -> u8 {
        match self {
            DxfVersion::AC1015 => 0x0F,
            DxfVersion::AC1018 => 0x19,
            DxfVersion::AC1021 => 0x1F,
            DxfVersion::AC1024 => 0x06,
            DxfVersion::AC1027 => 0x08,
            _ => 0,
        }
    }
}

impl Default for DxfVersion {
    fn default() -> Self {
        DxfVersion::AC1032
    }
}

impl fmt::Display for DxfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
