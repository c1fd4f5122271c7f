//! File header and section locator.
//!
//! ```text
//! "ACxxxx" | 5 x 0 | maintenance | 0x01 | RL section count
//!   per section: RC name length | name | RL offset | RL length | [RS seed]
//! RS CRC (seed 0) | end sentinel
//! ```
//!
//! Sections are stored back to back after the header in locator order.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{DxfError, Result};
use crate::io::dwg::constants::{sentinels, MAGIC_LENGTH, MAGIC_PADDING};
use crate::io::dwg::crc::{crc8, HEADER_SEED};
use crate::io::dwg::version_features::VersionFeatures;
use crate::notification::NotificationCollection;
use crate::types::DxfVersion;

/// Largest section count accepted when reading.
const MAX_SECTIONS: u32 = 64;

/// One locator record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLocator {
    pub name: String,
    /// Absolute byte offset of the section.
    pub offset: u64,
    pub length: u64,
    /// CRC of the section bytes, for revisions that store it.
    pub seed: Option<u16>,
}

impl SectionLocator {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..(self.offset + self.length) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwgFileHeader {
    pub version: DxfVersion,
    pub maintenance_version: u8,
    pub sections: Vec<SectionLocator>,
}

impl DwgFileHeader {
    pub fn new(version: DxfVersion, maintenance_version: u8) -> Self {
        Self {
            version,
            maintenance_version,
            sections: Vec::new(),
        }
    }

    pub fn section(&self, name: &str) -> Option<&SectionLocator> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Byte length of a header listing `names`.
    pub fn encoded_length(names: &[&str], features: VersionFeatures) -> usize {
        let seed = if features.contains(VersionFeatures::SECTION_CHECKSUM_SEEDS) {
            2
        } else {
            0
        };
        let locators: usize = names.iter().map(|n| 1 + n.len() + 4 + 4 + seed).sum();
        MAGIC_LENGTH + MAGIC_PADDING + 2 + 4 + locators + 2 + sentinels::FILE_HEADER_END.len()
    }

    /// Lay out `sections` directly after the header and record their seeds.
    pub fn locate(&mut self, sections: &[(&str, &[u8])], features: VersionFeatures) {
        let names: Vec<&str> = sections.iter().map(|(n, _)| *n).collect();
        let mut offset = Self::encoded_length(&names, features) as u64;
        self.sections = sections
            .iter()
            .map(|(name, data)| {
                let locator = SectionLocator {
                    name: name.to_string(),
                    offset,
                    length: data.len() as u64,
                    seed: features
                        .contains(VersionFeatures::SECTION_CHECKSUM_SEEDS)
                        .then(|| crc8(HEADER_SEED, data)),
                };
                offset += data.len() as u64;
                locator
            })
            .collect();
    }

    pub fn write(&self, features: VersionFeatures) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(self.version.as_str().as_bytes());
        out.extend_from_slice(&[0u8; MAGIC_PADDING]);
        out.push(self.maintenance_version);
        out.push(0x01);
        out.write_u32::<LittleEndian>(self.sections.len() as u32)?;

        for section in &self.sections {
            let name_length = u8::try_from(section.name.len())
                .map_err(|_| DxfError::Encoding(format!("Section name {} is too long", section.name)))?;
            out.push(name_length);
            out.extend_from_slice(section.name.as_bytes());
            out.write_u32::<LittleEndian>(to_u32(section.offset)?)?;
            out.write_u32::<LittleEndian>(to_u32(section.length)?)?;
            if features.contains(VersionFeatures::SECTION_CHECKSUM_SEEDS) {
                out.write_u16::<LittleEndian>(section.seed.unwrap_or(0))?;
            }
        }

        let crc = crc8(HEADER_SEED, &out);
        out.write_u16::<LittleEndian>(crc)?;
        out.extend_from_slice(&sentinels::FILE_HEADER_END);
        Ok(out)
    }

    /// Parse the header at the start of `data`.
    ///
    /// A CRC mismatch is reported to `notifications`; an unknown magic or a
    /// bad sentinel is an error.
    pub fn read(data: &[u8], notifications: &mut NotificationCollection) -> Result<Self> {
        let mut cursor = HeaderCursor::new(data);

        let magic = cursor.bytes(MAGIC_LENGTH)?;
        let magic = String::from_utf8_lossy(&magic).into_owned();
        let version = DxfVersion::from_version_string(&magic);
        let features = VersionFeatures::lookup(version)
            .ok_or_else(|| DxfError::UnsupportedVersion(magic.clone()))?;

        cursor.bytes(MAGIC_PADDING)?;
        let maintenance_version = cursor.u8()?;
        cursor.u8()?;

        let count = cursor.u32()?;
        if count > MAX_SECTIONS {
            return Err(DxfError::InvalidHeader(format!("Implausible section count {count}")));
        }

        let mut sections = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name_length = cursor.u8()? as usize;
            let name = String::from_utf8_lossy(&cursor.bytes(name_length)?).into_owned();
            let offset = cursor.u32()? as u64;
            let length = cursor.u32()? as u64;
            let seed = if features.contains(VersionFeatures::SECTION_CHECKSUM_SEEDS) {
                Some(cursor.u16()?)
            } else {
                None
            };
            sections.push(SectionLocator {
                name,
                offset,
                length,
                seed,
            });
        }

        let body_end = cursor.position();
        let expected = cursor.u16()?;
        let actual = crc8(HEADER_SEED, &data[..body_end]);
        if expected != actual {
            notifications.report_error(
                DxfError::ChecksumMismatch { expected, actual },
                None,
                Some(body_end as u64),
            )?;
        }

        let sentinel = cursor.bytes(sentinels::FILE_HEADER_END.len())?;
        if sentinel != sentinels::FILE_HEADER_END {
            return Err(DxfError::InvalidSentinel(format!(
                "File header end sentinel mismatch at byte {}",
                cursor.position() - sentinel.len()
            )));
        }

        tracing::debug!(%version, sections = sections.len(), "read file header");
        Ok(Self {
            version,
            maintenance_version,
            sections,
        })
    }
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| DxfError::Encoding(format!("Offset {value} exceeds the locator range")))
}

/// Little-endian cursor that reports overruns as truncation.
struct HeaderCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> HeaderCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }

    fn position(&self) -> usize {
        self.inner.position() as usize
    }

    fn truncated(&self, bytes: usize) -> DxfError {
        let available = self.inner.get_ref().len().saturating_sub(self.position());
        DxfError::truncated(self.position() as u64 * 8, bytes as u64 * 8, available as u64 * 8)
    }

    fn u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(|_| self.truncated(1))
    }

    fn u16(&mut self) -> Result<u16> {
        self.inner.read_u16::<LittleEndian>().map_err(|_| self.truncated(2))
    }

    fn u32(&mut self) -> Result<u32> {
        self.inner.read_u32::<LittleEndian>().map_err(|_| self.truncated(4))
    }

    fn bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let start = self.position();
        let mut buffer = vec![0u8; n];
        self.inner.read_exact(&mut buffer).map_err(|_| {
            self.inner.set_position(start as u64);
            self.truncated(n)
        })?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::DiagnosticKind;
    use crate::io::dwg::constants::section_names;

    fn header(version: DxfVersion) -> (DwgFileHeader, VersionFeatures) {
        let features = VersionFeatures::for_version(version).unwrap();
        let mut header = DwgFileHeader::new(version, 3);
        header.locate(
            &[
                (section_names::HEADER, b"abc".as_slice()),
                (section_names::ACDB_OBJECTS, b"objects".as_slice()),
                (section_names::HANDLES, b"map".as_slice()),
            ],
            features,
        );
        (header, features)
    }

    #[test]
    fn test_locator_offsets_follow_header() {
        let (header, features) = header(DxfVersion::AC1018);
        let bytes = header.write(features).unwrap();
        assert_eq!(bytes.len() as u64, header.sections[0].offset);
        assert_eq!(header.sections[1].offset, header.sections[0].offset + 3);
        assert_eq!(header.sections[2].seed, Some(crc8(HEADER_SEED, b"map")));
    }

    #[test]
    fn test_read_back() {
        for version in [DxfVersion::AC1015, DxfVersion::AC1032] {
            let (header, features) = header(version);
            let bytes = header.write(features).unwrap();
            let mut notes = NotificationCollection::new();
            let read = DwgFileHeader::read(&bytes, &mut notes).unwrap();
            assert_eq!(read, header);
            assert!(notes.is_empty());
        }
    }

    #[test]
    fn test_unknown_magic() {
        let mut bytes = header(DxfVersion::AC1015).0.write(VersionFeatures::empty()).unwrap();
        bytes[..6].copy_from_slice(b"AC9999");
        assert!(matches!(
            DwgFileHeader::read(&bytes, &mut NotificationCollection::new()),
            Err(DxfError::UnsupportedVersion(v)) if v == "AC9999"
        ));
    }

    #[test]
    fn test_header_crc_mismatch_is_diagnostic() {
        let (header, features) = header(DxfVersion::AC1015);
        let mut bytes = header.write(features).unwrap();
        bytes[11] ^= 0xFF;
        let mut notes = NotificationCollection::new();
        DwgFileHeader::read(&bytes, &mut notes).unwrap();
        assert!(notes.has_kind(DiagnosticKind::ChecksumMismatch));

        let mut strict = NotificationCollection::with_failsafe(false);
        assert!(matches!(
            DwgFileHeader::read(&bytes, &mut strict),
            Err(DxfError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_sentinel() {
        let (header, features) = header(DxfVersion::AC1024);
        let mut bytes = header.write(features).unwrap();
        let last = bytes.len() - 1;
        bytes[last] = 0xEE;
        assert!(matches!(
            DwgFileHeader::read(&bytes, &mut NotificationCollection::new()),
            Err(DxfError::InvalidSentinel(_))
        ));
    }

    #[test]
    fn test_short_input_is_truncation() {
        assert!(matches!(
            DwgFileHeader::read(b"AC10", &mut NotificationCollection::new()),
            Err(DxfError::TruncatedStream { .. })
        ));
    }
}
