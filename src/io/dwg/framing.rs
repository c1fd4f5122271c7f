//! Checksum framing of object records.
//!
//! ```text
//! MS payload size | [MC handle-stream bits] | payload | RS checksum (LE)
//! ```
//!
//! The checksum is the running CRC8 seed after the prefixes and the payload
//! have been fed through it, starting from a purpose-specific seed.

use crate::error::{DxfError, Result};
use crate::io::dwg::crc::crc8;
use crate::io::dwg::modular::{decode_modular_char, decode_modular_short, encode_modular_char, encode_modular_short};
use crate::io::dwg::version_features::VersionFeatures;

/// A record with its framing removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unframed {
    pub payload: Vec<u8>,
    /// Bit length of the handle stream at the end of the payload, when the
    /// revision stores it in the frame.
    pub handle_stream_bits: Option<u64>,
}

impl Unframed {
    /// Bit length of the data stream, if the frame declares it.
    pub fn main_stream_bits(&self) -> Option<u64> {
        self.handle_stream_bits
            .map(|h| (self.payload.len() as u64 * 8).saturating_sub(h))
    }
}

/// Wrap `payload` in a size prefix and checksum trailer.
pub fn frame(payload: &[u8], handle_stream_bits: u64, seed: u16, features: VersionFeatures) -> Result<Vec<u8>> {
    let size = u32::try_from(payload.len())
        .map_err(|_| DxfError::Encoding(format!("Record of {} bytes is too large", payload.len())))?;

    let mut out = encode_modular_short(size);
    if features.contains(VersionFeatures::HANDLE_STREAM_SIZE) {
        out.extend(encode_modular_char(handle_stream_bits));
    }
    out.extend_from_slice(payload);

    let checksum = crc8(seed, &out);
    out.extend_from_slice(&checksum.to_le_bytes());
    Ok(out)
}

/// Remove the framing of a record that spans exactly `bytes`.
///
/// The checksum is verified before the prefix is trusted, so any corruption
/// of the frame reports [`DxfError::ChecksumMismatch`].
pub fn unframe(bytes: &[u8], seed: u16, features: VersionFeatures) -> Result<Unframed> {
    if bytes.len() < 4 {
        return Err(DxfError::truncated(0, 32, bytes.len() as u64 * 8));
    }
    let body_end = bytes.len() - 2;
    let expected = u16::from_le_bytes([bytes[body_end], bytes[body_end + 1]]);
    let actual = crc8(seed, &bytes[..body_end]);
    if expected != actual {
        return Err(DxfError::ChecksumMismatch { expected, actual });
    }

    let (size, mut pos) = decode_modular_short(&bytes[..body_end], 0)?;
    let handle_stream_bits = if features.contains(VersionFeatures::HANDLE_STREAM_SIZE) {
        let (bits, used) = decode_modular_char(&bytes[..body_end], pos)?;
        pos += used;
        Some(bits)
    } else {
        None
    };

    if pos + size as usize != body_end {
        return Err(DxfError::Parse(format!(
            "Record declares {size} payload bytes but frame holds {}",
            body_end.saturating_sub(pos)
        )));
    }
    if let Some(bits) = handle_stream_bits {
        if bits > size as u64 * 8 {
            return Err(DxfError::Parse(format!(
                "Handle stream of {bits} bits exceeds payload of {size} bytes"
            )));
        }
    }

    Ok(Unframed {
        payload: bytes[pos..body_end].to_vec(),
        handle_stream_bits,
    })
}

/// Total byte length of the record starting at `pos`, read from its prefix.
///
/// Fails with [`DxfError::TruncatedStream`] when the declared size runs past
/// the end of `data`.
pub fn framed_length(data: &[u8], pos: usize, features: VersionFeatures) -> Result<usize> {
    let (size, mut used) = decode_modular_short(data, pos)?;
    if features.contains(VersionFeatures::HANDLE_STREAM_SIZE) {
        used += decode_modular_char(data, pos + used)?.1;
    }
    let total = used + size as usize + 2;
    if pos + total > data.len() {
        return Err(DxfError::truncated(
            pos as u64 * 8,
            total as u64 * 8,
            (data.len() - pos) as u64 * 8,
        ));
    }
    Ok(total)
}

/// Unframe the record starting at `pos`; returns it with its byte length.
pub fn unframe_at(data: &[u8], pos: usize, seed: u16, features: VersionFeatures) -> Result<(Unframed, usize)> {
    let length = framed_length(data, pos, features)?;
    Ok((unframe(&data[pos..pos + length], seed, features)?, length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dwg::crc::OBJECT_SEED;
    use crate::types::DxfVersion;

    fn features(v: DxfVersion) -> VersionFeatures {
        VersionFeatures::for_version(v).unwrap()
    }

    #[test]
    fn test_frame_layout_pre_2010() {
        let f = features(DxfVersion::AC1015);
        let framed = frame(&[0xAA, 0xBB], 0, OBJECT_SEED, f).unwrap();
        assert_eq!(&framed[..4], &[0x02, 0x00, 0xAA, 0xBB]);
        let crc = crc8(OBJECT_SEED, &framed[..4]);
        assert_eq!(&framed[4..], &crc.to_le_bytes());
    }

    #[test]
    fn test_frame_layout_2010_has_handle_bits() {
        let f = features(DxfVersion::AC1024);
        let framed = frame(&[1, 2, 3], 9, OBJECT_SEED, f).unwrap();
        assert_eq!(&framed[..3], &[0x03, 0x00, 0x09]);
        let unframed = unframe(&framed, OBJECT_SEED, f).unwrap();
        assert_eq!(unframed.handle_stream_bits, Some(9));
        assert_eq!(unframed.main_stream_bits(), Some(15));
    }

    #[test]
    fn test_empty_payload() {
        for v in [DxfVersion::AC1015, DxfVersion::AC1032] {
            let f = features(v);
            let framed = frame(&[], 0, OBJECT_SEED, f).unwrap();
            assert!(unframe(&framed, OBJECT_SEED, f).unwrap().payload.is_empty());
        }
    }

    #[test]
    fn test_wrong_seed_is_mismatch() {
        let f = features(DxfVersion::AC1015);
        let framed = frame(b"record", 0, OBJECT_SEED, f).unwrap();
        assert!(matches!(
            unframe(&framed, 0, f),
            Err(DxfError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_unframe_at_sequence() {
        let f = features(DxfVersion::AC1018);
        let mut data = frame(b"first", 0, OBJECT_SEED, f).unwrap();
        let first_len = data.len();
        data.extend(frame(b"second", 0, OBJECT_SEED, f).unwrap());

        let (a, len_a) = unframe_at(&data, 0, OBJECT_SEED, f).unwrap();
        let (b, _) = unframe_at(&data, len_a, OBJECT_SEED, f).unwrap();
        assert_eq!(len_a, first_len);
        assert_eq!(a.payload, b"first");
        assert_eq!(b.payload, b"second");
    }

    #[test]
    fn test_overrunning_size_is_truncation() {
        let f = features(DxfVersion::AC1015);
        let mut framed = frame(b"abc", 0, OBJECT_SEED, f).unwrap();
        framed[0] = 0x40;
        assert!(matches!(
            unframe_at(&framed, 0, OBJECT_SEED, f),
            Err(DxfError::TruncatedStream { .. })
        ));
    }
}
