//! Zero-Allocation Record Encoder/Decoder
//!
//! Encode langsung ke buffer milik caller (atau ke array di stack),
//! decode dari byte span. Tidak ada alokasi, tidak ada cast struct dari
//! raw bytes: setiap field dibaca/ditulis eksplisit dengan lebar tetap.

use super::message::{
    Event, EventTag, RecordHeader, EVENT_ACK_PAYLOAD_SIZE, EVENT_ONE_PAYLOAD_SIZE, HEADER_SIZE,
    MAX_RECORD_SIZE,
};
use crate::error::CodecError;

/// Record yang sudah di-encode, disimpan di stack
#[derive(Clone, Copy)]
pub struct EncodedRecord {
    buf: [u8; MAX_RECORD_SIZE],
    len: usize,
}

impl EncodedRecord {
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline(always)]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }
}

impl std::fmt::Debug for EncodedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedRecord")
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

/// Encode event menjadi record lengkap (header + payload)
///
/// Tidak memvalidasi field; producer memanggil [`Event::validate`] dulu.
#[inline(always)]
pub fn encode(event: &Event) -> EncodedRecord {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    // MAX_RECORD_SIZE cukup untuk semua tag
    let len = write_record(event, &mut buf);
    EncodedRecord { buf, len }
}

/// Caller menjamin `out.len() >= event.encoded_len()`
#[inline(always)]
fn write_record(event: &Event, out: &mut [u8]) -> usize {
    let tag = event.tag();
    let payload_len = tag.payload_size();
    let header = RecordHeader::new(tag, payload_len as u32);
    out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

    let payload = &mut out[HEADER_SIZE..HEADER_SIZE + payload_len];
    match *event {
        Event::One {
            track_num,
            slot_num,
            reserved,
        } => {
            payload[0..4].copy_from_slice(&track_num.to_le_bytes());
            payload[4..8].copy_from_slice(&slot_num.to_le_bytes());
            payload[8..16].copy_from_slice(&reserved.to_le_bytes());
        }
        Event::Two => {}
        Event::Ack { waste } => {
            payload[0..4].copy_from_slice(&waste.to_le_bytes());
        }
    }

    HEADER_SIZE + payload_len
}

/// Decode header dari 8 byte pertama record
#[inline(always)]
pub fn decode_header(bytes: &[u8; HEADER_SIZE]) -> Result<RecordHeader, CodecError> {
    RecordHeader::from_bytes(bytes)
}

/// Rekonstruksi event dari payload.
///
/// - `Truncated` jika `payload` lebih pendek dari `header.payload_len`
/// - `InvalidPayload` jika length tidak cocok dengan tag atau field melanggar constraint
#[inline(always)]
pub fn decode_payload(header: RecordHeader, payload: &[u8]) -> Result<Event, CodecError> {
    let payload_len = header.payload_len as usize;
    if payload.len() < payload_len {
        return Err(CodecError::Truncated {
            expected: payload_len,
            actual: payload.len(),
        });
    }
    if payload_len != header.tag.payload_size() {
        return Err(CodecError::InvalidPayload {
            tag: header.tag as u32,
            reason: "payload length does not match tag",
        });
    }

    let payload = &payload[..payload_len];
    match header.tag {
        EventTag::One => {
            debug_assert_eq!(payload.len(), EVENT_ONE_PAYLOAD_SIZE);
            let track_num = read_i32(payload, 0);
            let slot_num = read_i32(payload, 4);
            let reserved = u64::from_le_bytes([
                payload[8], payload[9], payload[10], payload[11], payload[12], payload[13],
                payload[14], payload[15],
            ]);

            let event = Event::One {
                track_num,
                slot_num,
                reserved,
            };
            event.validate()?;
            Ok(event)
        }
        EventTag::Two => Ok(Event::Two),
        EventTag::Ack => {
            debug_assert_eq!(payload.len(), EVENT_ACK_PAYLOAD_SIZE);
            Ok(Event::Ack {
                waste: read_i32(payload, 0),
            })
        }
    }
}

/// Decode satu record lengkap dari awal `record`
pub fn decode(record: &[u8]) -> Result<Event, CodecError> {
    let header_bytes: &[u8; HEADER_SIZE] = record
        .get(..HEADER_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or(CodecError::Truncated {
            expected: HEADER_SIZE,
            actual: record.len(),
        })?;

    let header = decode_header(header_bytes)?;
    decode_payload(header, &record[HEADER_SIZE..])
}

#[inline(always)]
fn read_i32(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let events = [
            Event::One {
                track_num: 3,
                slot_num: 2,
                reserved: 0xDEAD_BEEF_0000_0001,
            },
            Event::Two,
            Event::ack(7),
            Event::ack(-1),
        ];

        for event in events {
            let record = encode(&event);
            assert_eq!(record.len(), event.encoded_len());
            assert_eq!(decode(record.as_bytes()), Ok(event));
        }
    }

    #[test]
    fn test_event_one_wire_layout() {
        let record = encode(&Event::one(3, 2));
        assert_eq!(
            record.as_bytes(),
            &[
                0, 0, 0, 0, // tag
                16, 0, 0, 0, // payload_len
                3, 0, 0, 0, // track_num
                2, 0, 0, 0, // slot_num
                0, 0, 0, 0, 0, 0, 0, 0, // reserved
            ]
        );
    }

    #[test]
    fn test_decode_truncated_payload() {
        let record = encode(&Event::ack(9));
        let short = &record.as_bytes()[..HEADER_SIZE + 2];
        assert_eq!(
            decode(short),
            Err(CodecError::Truncated {
                expected: 4,
                actual: 2
            })
        );
        assert!(matches!(decode(&[0, 0]), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_decode_negative_track() {
        let record = encode(&Event::one(-1, 0));
        assert_eq!(
            decode(record.as_bytes()),
            Err(CodecError::InvalidPayload {
                tag: 0,
                reason: "negative track number"
            })
        );
    }

    #[test]
    fn test_decode_negative_slot() {
        let record = encode(&Event::one(1, -4));
        assert_eq!(
            decode(record.as_bytes()),
            Err(CodecError::InvalidPayload {
                tag: 0,
                reason: "negative slot index"
            })
        );
    }

    #[test]
    fn test_decode_length_mismatch() {
        // Ack dengan payload_len 8: length tidak cocok dengan tag
        let mut buf = [0u8; HEADER_SIZE + 8];
        buf[..HEADER_SIZE].copy_from_slice(&RecordHeader::new(EventTag::Ack, 8).to_bytes());
        assert!(matches!(
            decode(&buf),
            Err(CodecError::InvalidPayload { tag: 2, .. })
        ));
    }

    #[test]
    fn test_decode_unknown_tag() {
        let mut record = encode(&Event::Two).as_bytes().to_vec();
        record[0] = 0x42;
        assert_eq!(decode(&record), Err(CodecError::UnknownTag(0x42)));
    }
}
