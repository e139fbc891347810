//! Protocol Layer: Record Codec
//!
//! Prinsip desain:
//! - Fixed-size header: 8 byte untuk semua tag
//! - Explicit payload length: consumer tidak pernah menebak ukuran record
//! - No allocation: Encode/decode langsung ke/dari buffer

mod encoder;
mod message;

pub use encoder::{decode, decode_header, decode_payload, encode, EncodedRecord};
pub use message::{
    Event, EventTag, RecordHeader, EVENT_ACK_PAYLOAD_SIZE, EVENT_ONE_PAYLOAD_SIZE,
    EVENT_TWO_PAYLOAD_SIZE, HEADER_SIZE, MAX_PAYLOAD_SIZE, MAX_RECORD_SIZE,
};
