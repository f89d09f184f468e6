//! Slot array codec.
//!
//! An array of optional item blobs is packed into one byte buffer and stored
//! as standard base64 text:
//!
//! ```text
//! [format: u8 = 1][slot count: u32]
//! per slot: [0]                      empty slot
//!           [1][len: u32][len bytes] item blob
//! ```
//!
//! Integers are big-endian. An absent array encodes to `None`; an array of
//! empty slots still encodes to text so the slot count survives.

use std::io::{Cursor, Read};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use crate::host::{ItemBlob, ItemFormat, RawItems, Slots};

const FORMAT_V1: u8 = 1;
const SLOT_EMPTY: u8 = 0;
const SLOT_ITEM: u8 = 1;

const HEADER_LEN: usize = 5;
const ITEM_HEADER_LEN: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("not valid base64: {0}")]
    Text(#[from] base64::DecodeError),

    #[error("unknown format version {0}")]
    UnknownFormat(u8),

    #[error("unknown marker {marker} in slot {slot}")]
    UnknownMarker { slot: usize, marker: u8 },

    #[error("data ends early: declared {declared} slots, read {read}")]
    Truncated { declared: usize, read: usize },

    #[error("{0} unexpected bytes after the last slot")]
    TrailingBytes(usize),

    #[error("slot count {0} does not fit in the byte layout")]
    TooManySlots(usize),

    #[error("item in slot {slot} is {len} bytes, too large to encode")]
    ItemTooLarge { slot: usize, len: usize },

    #[error("item in slot {slot} was rejected: {reason}")]
    Rejected { slot: usize, reason: String },
}

/// Encode a slot array. `None` in, `None` out.
pub fn encode(slots: Option<&[Option<ItemBlob>]>) -> Result<Option<String>, CodecError> {
    let Some(slots) = slots else {
        return Ok(None);
    };

    let bytes = pack(slots)?;
    Ok(Some(STANDARD.encode(bytes)))
}

/// Decode text produced by [`encode`], accepting every item blob.
pub fn decode(text: Option<&str>) -> Result<Option<Slots>, CodecError> {
    decode_with(text, &RawItems)
}

/// Decode text produced by [`encode`], asking `format` to vet every blob.
///
/// `None` or empty text decodes to `None`. Any malformed input fails the
/// whole call; no partial array is returned.
pub fn decode_with(text: Option<&str>, format: &dyn ItemFormat) -> Result<Option<Slots>, CodecError> {
    let text = match text {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(None),
    };

    let bytes = STANDARD.decode(text.as_bytes())?;
    unpack(&bytes, format).map(Some)
}

fn pack(slots: &[Option<ItemBlob>]) -> Result<Vec<u8>, CodecError> {
    let count = u32::try_from(slots.len()).map_err(|_| CodecError::TooManySlots(slots.len()))?;

    let payload: usize = slots
        .iter()
        .map(|slot| slot.as_ref().map_or(1, |blob| ITEM_HEADER_LEN + blob.len()))
        .sum();

    let mut out = Vec::with_capacity(HEADER_LEN + payload);
    out.push(FORMAT_V1);
    push_u32(&mut out, count);

    for (slot, entry) in slots.iter().enumerate() {
        match entry {
            None => out.push(SLOT_EMPTY),
            Some(blob) => {
                let len = u32::try_from(blob.len())
                    .map_err(|_| CodecError::ItemTooLarge { slot, len: blob.len() })?;
                out.push(SLOT_ITEM);
                push_u32(&mut out, len);
                out.extend_from_slice(blob.as_bytes());
            }
        }
    }

    Ok(out)
}

fn unpack(bytes: &[u8], format: &dyn ItemFormat) -> Result<Slots, CodecError> {
    let mut cursor = Cursor::new(bytes);
    let truncated = |read: usize, declared: usize| CodecError::Truncated { declared, read };

    let version = cursor.read_u8().map_err(|_| truncated(0, 0))?;
    if version != FORMAT_V1 {
        return Err(CodecError::UnknownFormat(version));
    }
    let declared = cursor.read_u32::<BigEndian>().map_err(|_| truncated(0, 0))? as usize;

    // every slot takes at least one byte, so a larger count cannot be honest
    let remaining = bytes.len() - HEADER_LEN;
    if declared > remaining {
        return Err(truncated(0, declared));
    }

    let mut slots = Vec::with_capacity(declared);
    for slot in 0..declared {
        let marker = cursor.read_u8().map_err(|_| truncated(slot, declared))?;
        match marker {
            SLOT_EMPTY => slots.push(None),
            SLOT_ITEM => {
                let len = cursor
                    .read_u32::<BigEndian>()
                    .map_err(|_| truncated(slot, declared))? as usize;
                let available = bytes.len() - cursor.position() as usize;
                if len > available {
                    return Err(truncated(slot, declared));
                }

                let mut blob = vec![0u8; len];
                cursor.read_exact(&mut blob).map_err(|_| truncated(slot, declared))?;
                format
                    .verify(&blob)
                    .map_err(|reason| CodecError::Rejected { slot, reason })?;
                slots.push(Some(ItemBlob::new(blob)));
            }
            marker => return Err(CodecError::UnknownMarker { slot, marker }),
        }
    }

    let trailing = bytes.len() - cursor.position() as usize;
    if trailing > 0 {
        return Err(CodecError::TrailingBytes(trailing));
    }

    Ok(slots)
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    let mut buf = [0u8; 4];
    BigEndian::write_u32(&mut buf, value);
    out.extend_from_slice(&buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn blob(text: &str) -> Option<ItemBlob> {
        Some(ItemBlob::from(text))
    }

    fn round_trip(slots: &[Option<ItemBlob>]) -> Slots {
        let text = encode(Some(slots)).unwrap();
        decode(text.as_deref()).unwrap().unwrap()
    }

    struct KnownItems;

    impl ItemFormat for KnownItems {
        fn verify(&self, blob: &[u8]) -> Result<(), String> {
            if blob.starts_with(b"item:") {
                Ok(())
            } else {
                Err("unrecognized item type".to_string())
            }
        }
    }

    #[test]
    fn absent_array_stays_absent() {
        assert_eq!(encode(None).unwrap(), None);
        assert_eq!(decode(None).unwrap(), None);
        assert_eq!(decode(Some("")).unwrap(), None);
    }

    #[test]
    fn empty_array_is_not_absent() {
        let text = encode(Some(&[][..])).unwrap();
        assert!(text.is_some());
        assert_eq!(decode(text.as_deref()).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn all_empty_slots_keep_their_count() {
        let slots = vec![None; 36];
        assert_eq!(round_trip(&slots), slots);
    }

    #[test]
    fn mixed_slots_round_trip() {
        let slots = vec![None, blob("helmet"), None, None];
        assert_eq!(round_trip(&slots), slots);

        let slots = vec![blob("sword"), Some(ItemBlob::new(Vec::new())), None, blob("")];
        assert_eq!(round_trip(&slots), slots);
    }

    #[test]
    fn byte_layout_is_stable() {
        let text = encode(Some(&[None, blob("ab")][..])).unwrap().unwrap();
        let bytes = STANDARD.decode(text).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 2, 0, 1, 0, 0, 0, 2, b'a', b'b']);
    }

    #[test]
    fn invalid_text_is_an_error() {
        assert!(matches!(decode(Some("not base64!!")), Err(CodecError::Text(_))));
    }

    #[test]
    fn count_larger_than_data_is_an_error() {
        let text = STANDARD.encode([1, 0, 0, 0, 3, 0, 0]);
        assert!(matches!(decode(Some(&text)), Err(CodecError::Truncated { declared: 3, .. })));
    }

    #[test]
    fn blob_length_past_end_is_an_error() {
        let text = STANDARD.encode([1, 0, 0, 0, 1, 1, 0, 0, 0, 9, b'x']);
        assert!(matches!(decode(Some(&text)), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn trailing_bytes_are_an_error() {
        let text = STANDARD.encode([1, 0, 0, 0, 1, 0, 7, 7]);
        assert!(matches!(decode(Some(&text)), Err(CodecError::TrailingBytes(2))));
    }

    #[test]
    fn unknown_marker_and_format_are_errors() {
        let text = STANDARD.encode([1, 0, 0, 0, 1, 4]);
        assert!(matches!(
            decode(Some(&text)),
            Err(CodecError::UnknownMarker { slot: 0, marker: 4 })
        ));

        let text = STANDARD.encode([9, 0, 0, 0, 0]);
        assert!(matches!(decode(Some(&text)), Err(CodecError::UnknownFormat(9))));
    }

    #[test]
    fn rejected_blob_fails_whole_array() {
        let slots = vec![blob("item:apple"), None, blob("mystery")];
        let text = encode(Some(slots.as_slice())).unwrap();

        let err = decode_with(text.as_deref(), &KnownItems).unwrap_err();
        assert!(matches!(err, CodecError::Rejected { slot: 2, .. }));
    }

    proptest! {
        #[test]
        fn any_slot_array_round_trips(
            slots in proptest::collection::vec(
                proptest::option::of(proptest::collection::vec(any::<u8>(), 0..64)),
                0..48,
            )
        ) {
            let slots: Slots = slots.into_iter().map(|slot| slot.map(ItemBlob::new)).collect();
            prop_assert_eq!(round_trip(&slots), slots);
        }
    }
}
