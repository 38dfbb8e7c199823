//! Heap snapshot wire format
//!
//! A snapshot is the binary-encoded result of one tagging pass plus the
//! resolved class names. The layout is fixed and all multi-byte fields are
//! big-endian (network byte order):
//!
//! ```text
//! [Object count: u32 BE]
//! For each object:
//!   [Tag: u64 BE]
//!   [Class name length: u32 BE]
//!   [Class name: UTF-8 bytes, no terminator]
//! ```
//!
//! Encoding computes the total size in a pre-pass and fails before any
//! large allocation if the result would not fit a signed 32-bit length.
//! The buffer is then built once, fully; there is no incremental streaming.
//!
//! Decoding is tolerant by contract with the consumer side: short or
//! truncated input yields the entries that were fully readable, never an
//! error. Malformed name lengths stop the decode at that entry.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use heapwalk_core::{HeapWalkError, Result, Tag};
use std::io::Read;

/// Largest encodable snapshot in bytes, matching the signed 32-bit length
/// of the consumer-facing byte array.
pub const MAX_SNAPSHOT_BYTES: u64 = i32::MAX as u64;

/// Fixed per-entry overhead: 8-byte tag plus 4-byte name length.
const ENTRY_HEADER_BYTES: u64 = 12;

/// One object entry in a heap snapshot: its tag and the display name of
/// its class. An unreadable class degrades to an empty name rather than
/// discarding the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Tag assigned during the pass, used later for resolution
    pub tag: Tag,
    /// Fully qualified class display name (may be empty)
    pub class_name: String,
}

impl SnapshotEntry {
    /// Create an entry.
    pub fn new(tag: Tag, class_name: impl Into<String>) -> SnapshotEntry {
        SnapshotEntry {
            tag,
            class_name: class_name.into(),
        }
    }
}

/// Immutable snapshot of heap objects from one tagging pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeapSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl HeapSnapshot {
    /// Create a snapshot from collected entries.
    pub fn new(entries: Vec<SnapshotEntry>) -> HeapSnapshot {
        HeapSnapshot { entries }
    }

    /// The entries in this snapshot, in tagging order.
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode this snapshot into the wire format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(&self.entries)
    }

    /// Decode a snapshot from wire-format bytes.
    ///
    /// Tolerant: input shorter than a count field, a non-positive count, or
    /// a truncated entry all terminate the decode with whatever entries
    /// were complete.
    pub fn from_bytes(data: &[u8]) -> HeapSnapshot {
        let mut cursor = data;

        let count = match cursor.read_i32::<BigEndian>() {
            Ok(count) if count > 0 => count,
            _ => return HeapSnapshot::default(),
        };

        let mut entries = Vec::new();
        for _ in 0..count {
            if cursor.len() < ENTRY_HEADER_BYTES as usize {
                break;
            }
            // Reads below cannot fail; the header length was just checked.
            let Ok(raw_tag) = cursor.read_u64::<BigEndian>() else {
                break;
            };
            let Ok(len) = cursor.read_i32::<BigEndian>() else {
                break;
            };
            if len < 0 || len as usize > cursor.len() {
                break;
            }
            let mut name = vec![0u8; len as usize];
            if cursor.read_exact(&mut name).is_err() {
                break;
            }
            entries.push(SnapshotEntry::new(
                Tag::from_raw(raw_tag),
                String::from_utf8_lossy(&name).into_owned(),
            ));
        }

        HeapSnapshot { entries }
    }
}

/// Compute the encoded size of a set of entries, in bytes.
fn encoded_size(entries: &[SnapshotEntry]) -> u64 {
    entries.iter().fold(4u64, |total, entry| {
        total + ENTRY_HEADER_BYTES + entry.class_name.len() as u64
    })
}

/// Reject totals that would not fit the consumer-facing signed 32-bit
/// array length.
fn ensure_within_limit(total: u64) -> Result<()> {
    if total > MAX_SNAPSHOT_BYTES {
        return Err(HeapWalkError::SnapshotTooLarge {
            computed: total,
            limit: MAX_SNAPSHOT_BYTES,
        });
    }
    Ok(())
}

/// Allocate the output buffer for an encoded snapshot of `total` bytes.
fn reserve_output(total: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(total as usize)
        .map_err(|_| HeapWalkError::AllocationFailed {
            context: "snapshot output",
            requested: total as usize,
        })?;
    Ok(buf)
}

/// Encode entries into the wire format.
///
/// Fails with [`HeapWalkError::SnapshotTooLarge`] when the computed size
/// exceeds [`MAX_SNAPSHOT_BYTES`], and with
/// [`HeapWalkError::AllocationFailed`] when the output buffer cannot be
/// reserved; the buffer is only allocated after the size check passes.
pub fn encode(entries: &[SnapshotEntry]) -> Result<Vec<u8>> {
    let total = encoded_size(entries);
    ensure_within_limit(total)?;

    let mut buf = reserve_output(total)?;
    buf.write_u32::<BigEndian>(entries.len() as u32)?;
    for entry in entries {
        buf.write_u64::<BigEndian>(entry.tag.raw())?;
        buf.write_u32::<BigEndian>(entry.class_name.len() as u32)?;
        buf.extend_from_slice(entry.class_name.as_bytes());
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_empty() {
        let bytes = encode(&[]).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_golden_single_entry() {
        // {(tag=5, name="A")} has a fixed, exact encoding.
        let entries = vec![SnapshotEntry::new(Tag::from_raw(5), "A")];
        let bytes = encode(&entries).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x00, 0x00, 0x00, 0x01, // count = 1
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, // tag = 5
                0x00, 0x00, 0x00, 0x01, // name length = 1
                b'A',
            ]
        );
    }

    #[test]
    fn test_decode_golden_single_entry() {
        let bytes = vec![
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00,
            0x00, 0x01, b'A',
        ];
        let snapshot = HeapSnapshot::from_bytes(&bytes);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entries()[0].tag, Tag::from_raw(5));
        assert_eq!(snapshot.entries()[0].class_name, "A");
    }

    #[test]
    fn test_roundtrip_multiple_entries() {
        let snapshot = HeapSnapshot::new(vec![
            SnapshotEntry::new(Tag::compose(1, 1), "service.model.OldUser"),
            SnapshotEntry::new(Tag::compose(1, 2), ""),
            SnapshotEntry::new(Tag::compose(2, 1), "java.lang.String"),
        ]);
        let decoded = HeapSnapshot::from_bytes(&snapshot.to_bytes().unwrap());
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(HeapSnapshot::from_bytes(&[]).is_empty());
        assert!(HeapSnapshot::from_bytes(&[0, 0]).is_empty());
    }

    #[test]
    fn test_decode_zero_and_negative_count() {
        assert!(HeapSnapshot::from_bytes(&[0, 0, 0, 0]).is_empty());
        // Count field with the sign bit set decodes as negative.
        assert!(HeapSnapshot::from_bytes(&[0xFF, 0xFF, 0xFF, 0xFF]).is_empty());
    }

    #[test]
    fn test_decode_truncated_entry_keeps_complete_prefix() {
        let full = encode(&[
            SnapshotEntry::new(Tag::from_raw(1), "A"),
            SnapshotEntry::new(Tag::from_raw(2), "B"),
        ])
        .unwrap();
        // Chop the second entry in half.
        let truncated = &full[..full.len() - 3];
        let snapshot = HeapSnapshot::from_bytes(truncated);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entries()[0].class_name, "A");
    }

    #[test]
    fn test_decode_overlong_name_length_stops() {
        let mut bytes = vec![0, 0, 0, 1];
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 9]); // tag
        bytes.extend_from_slice(&[0, 0, 1, 0]); // claims 256 name bytes
        bytes.extend_from_slice(b"short");
        assert!(HeapSnapshot::from_bytes(&bytes).is_empty());
    }

    #[test]
    fn test_decode_count_larger_than_payload() {
        let mut bytes = vec![0, 0, 0, 5]; // claims five entries
        bytes.extend_from_slice(&encode(&[SnapshotEntry::new(Tag::from_raw(7), "X")]).unwrap()[4..]);
        let snapshot = HeapSnapshot::from_bytes(&bytes);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_encoded_size_pre_pass() {
        let entries = vec![
            SnapshotEntry::new(Tag::from_raw(1), "AB"),
            SnapshotEntry::new(Tag::from_raw(2), ""),
        ];
        assert_eq!(encoded_size(&entries), 4 + 12 + 2 + 12);
        assert_eq!(encode(&entries).unwrap().len() as u64, encoded_size(&entries));
    }

    #[test]
    fn test_output_reserve_failure_is_allocation_error() {
        // A reservation no allocator can satisfy must surface as an error,
        // not abort the process.
        let err = reserve_output(usize::MAX as u64).unwrap_err();
        assert!(matches!(
            err,
            HeapWalkError::AllocationFailed {
                context: "snapshot output",
                ..
            }
        ));
    }

    #[test]
    fn test_size_limit_boundary() {
        assert!(ensure_within_limit(MAX_SNAPSHOT_BYTES).is_ok());
        let err = ensure_within_limit(MAX_SNAPSHOT_BYTES + 1).unwrap_err();
        assert!(matches!(err, HeapWalkError::SnapshotTooLarge { .. }));
    }

    #[test]
    fn test_non_utf8_name_decodes_lossily() {
        let mut bytes = vec![0, 0, 0, 1];
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);
        bytes.extend_from_slice(&[0, 0, 0, 2]);
        bytes.extend_from_slice(&[0xFF, 0xFE]);
        let snapshot = HeapSnapshot::from_bytes(&bytes);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entries()[0].class_name, "\u{FFFD}\u{FFFD}");
    }

    proptest! {
        #[test]
        fn prop_encode_decode_roundtrip(
            entries in proptest::collection::vec(
                (any::<u64>(), "[a-zA-Z0-9./$]{0,40}"),
                0..50,
            )
        ) {
            let entries: Vec<SnapshotEntry> = entries
                .into_iter()
                .map(|(raw, name)| SnapshotEntry::new(Tag::from_raw(raw), name))
                .collect();
            let snapshot = HeapSnapshot::new(entries);
            let decoded = HeapSnapshot::from_bytes(&snapshot.to_bytes().unwrap());
            prop_assert_eq!(decoded, snapshot);
        }
    }
}
