//! Object map section (`AcDb:Handles`).
//!
//! Handle/offset pairs sorted by handle, delta encoded (unsigned MC handle
//! delta, signed MC offset delta) in chunks of at most 2032 bytes. Each
//! chunk is `BE size | entries | BE CRC8`, where size counts itself and the
//! entries, and the CRC covers the size and the entries. Deltas restart at
//! zero in every chunk. An empty chunk of size 2 ends the map.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{DxfError, Result};
use crate::io::dwg::constants::handle_map::{EMPTY_CHUNK_SIZE, MAX_CHUNK_SIZE};
use crate::io::dwg::crc::{crc8, OBJECT_SEED};
use crate::io::dwg::modular::{decode_modular_char, decode_signed_modular_char, encode_modular_char, encode_signed_modular_char};
use crate::io::handle_table::CompletedHandleTable;
use crate::types::Handle;

/// Encode the map from a completed offset table.
pub fn write_object_map(table: &CompletedHandleTable<u64>) -> Vec<u8> {
    let mut output = Vec::new();
    let mut chunk_start = begin_chunk(&mut output);
    let mut last_handle = 0u64;
    let mut last_offset = 0i64;

    for (handle, &offset) in table.sorted() {
        let offset = offset as i64;
        let mut entry = encode_modular_char(handle.value() - last_handle);
        entry.extend(encode_signed_modular_char(offset - last_offset));

        if output.len() - chunk_start + entry.len() > MAX_CHUNK_SIZE {
            end_chunk(&mut output, chunk_start);
            chunk_start = begin_chunk(&mut output);
            entry = encode_modular_char(handle.value());
            entry.extend(encode_signed_modular_char(offset));
        }

        output.extend(entry);
        last_handle = handle.value();
        last_offset = offset;
    }
    end_chunk(&mut output, chunk_start);

    let terminator = begin_chunk(&mut output);
    end_chunk(&mut output, terminator);
    output
}

fn begin_chunk(output: &mut Vec<u8>) -> usize {
    let start = output.len();
    output.extend_from_slice(&[0, 0]);
    start
}

fn end_chunk(output: &mut Vec<u8>, start: usize) {
    let size = (output.len() - start) as u16;
    BigEndian::write_u16(&mut output[start..start + 2], size);
    let crc = crc8(OBJECT_SEED, &output[start..]);
    let mut trailer = [0u8; 2];
    BigEndian::write_u16(&mut trailer, crc);
    output.extend_from_slice(&trailer);
}

/// Decode the map; entries are returned in file order.
pub fn read_object_map(data: &[u8]) -> Result<Vec<(Handle, u64)>> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    loop {
        let size = read_u16(data, pos)?;
        if size == EMPTY_CHUNK_SIZE {
            break;
        }
        if (size as usize) < 2 || size as usize > MAX_CHUNK_SIZE {
            return Err(DxfError::Parse(format!("Invalid object map chunk size {size}")));
        }

        let body_end = pos + size as usize;
        let expected = read_u16(data, body_end)?;
        let actual = crc8(OBJECT_SEED, &data[pos..body_end]);
        if expected != actual {
            return Err(DxfError::ChecksumMismatch { expected, actual });
        }

        let mut cursor = pos + 2;
        let mut last_handle = 0u64;
        let mut last_offset = 0i64;
        while cursor < body_end {
            let (handle_delta, used) = decode_modular_char(&data[..body_end], cursor)?;
            cursor += used;
            let (offset_delta, used) = decode_signed_modular_char(&data[..body_end], cursor)?;
            cursor += used;

            last_handle = last_handle
                .checked_add(handle_delta)
                .ok_or_else(|| DxfError::Parse(format!("Object map handle overflows at byte {cursor}")))?;
            last_offset = last_offset
                .checked_add(offset_delta)
                .ok_or_else(|| DxfError::Parse(format!("Object map offset overflows at byte {cursor}")))?;
            if handle_delta > 0 && last_offset >= 0 {
                entries.push((Handle::new(last_handle), last_offset as u64));
            }
        }
        pos = body_end + 2;
    }

    Ok(entries)
}

fn read_u16(data: &[u8], pos: usize) -> Result<u16> {
    data.get(pos..pos + 2)
        .map(BigEndian::read_u16)
        .ok_or_else(|| DxfError::truncated(pos as u64 * 8, 16, (data.len().saturating_sub(pos)) as u64 * 8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::handle_table::HandleTable;

    fn table(entries: &[(u64, u64)]) -> CompletedHandleTable<u64> {
        let mut t = HandleTable::new();
        for &(h, o) in entries {
            t.assign(Handle::new(h), o).unwrap();
        }
        t.complete()
    }

    #[test]
    fn test_empty_map_is_terminator_pair() {
        let bytes = write_object_map(&table(&[]));
        // empty first chunk, then the terminating chunk
        assert_eq!(&bytes[0..2], &[0x00, 0x02]);
        assert_eq!(bytes.len(), 8);
        assert!(read_object_map(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_offsets_may_decrease() {
        let t = table(&[(0x10, 500), (0x02, 900), (0x11, 100)]);
        let bytes = write_object_map(&t);
        let read = read_object_map(&bytes).unwrap();
        assert_eq!(
            read,
            vec![
                (Handle::new(0x02), 900),
                (Handle::new(0x10), 500),
                (Handle::new(0x11), 100)
            ]
        );
    }

    #[test]
    fn test_chunk_split() {
        let entries: Vec<(u64, u64)> = (1..=2000u64).map(|h| (h * 300, h * 70_000)).collect();
        let bytes = write_object_map(&table(&entries));
        let first = BigEndian::read_u16(&bytes[0..2]) as usize;
        assert!(first <= MAX_CHUNK_SIZE);
        assert!(bytes.len() > first + 4 + 4);

        let read = read_object_map(&bytes).unwrap();
        assert_eq!(read.len(), entries.len());
        assert_eq!(read[1999], (Handle::new(600_000), 140_000_000));
    }

    #[test]
    fn test_overflowing_handle_delta() {
        let mut bytes = Vec::new();
        let start = begin_chunk(&mut bytes);
        bytes.extend(encode_modular_char(u64::MAX));
        bytes.extend(encode_signed_modular_char(1));
        bytes.extend(encode_modular_char(1));
        bytes.extend(encode_signed_modular_char(1));
        end_chunk(&mut bytes, start);
        let terminator = begin_chunk(&mut bytes);
        end_chunk(&mut bytes, terminator);

        let err = read_object_map(&bytes).unwrap_err();
        assert!(matches!(err, DxfError::Parse(_)));
        assert!(err.is_record_level());
    }

    #[test]
    fn test_corrupted_chunk() {
        let mut bytes = write_object_map(&table(&[(1, 10), (2, 20)]));
        bytes[3] ^= 0x01;
        assert!(matches!(
            read_object_map(&bytes),
            Err(DxfError::ChecksumMismatch { .. })
        ));
    }
}
