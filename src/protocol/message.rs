//! Record Format
//!
//! Layout (little-endian):
//! ┌─────────────────────────────────────────────────────┐
//! │ RecordHeader (8 bytes, fixed): tag u32, len u32     │
//! ├─────────────────────────────────────────────────────┤
//! │ Payload (len bytes, layout per tag)                 │
//! └─────────────────────────────────────────────────────┘
//!
//! Ukuran header sama untuk semua tag dan tidak bergantung pada ukuran
//! payload, jadi consumer selalu bisa membaca header dulu lalu tahu persis
//! berapa byte record tersebut.
//!
//! Payload per tag:
//! - `EventOne` (0): track_num i32, slot_num i32, reserved u64 = 16 bytes
//! - `EventTwo` (1): kosong
//! - `EventAck` (2): waste i32 = 4 bytes

use crate::error::CodecError;

pub const HEADER_SIZE: usize = 8;

pub const EVENT_ONE_PAYLOAD_SIZE: usize = 16;
pub const EVENT_TWO_PAYLOAD_SIZE: usize = 0;
pub const EVENT_ACK_PAYLOAD_SIZE: usize = 4;

/// Payload terbesar dari semua tag yang dikenal
pub const MAX_PAYLOAD_SIZE: usize = EVENT_ONE_PAYLOAD_SIZE;
/// Record terbesar (header + payload)
pub const MAX_RECORD_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// Tag record di wire
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    One = 0,
    Two = 1,
    Ack = 2,
}

impl EventTag {
    #[inline(always)]
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::One),
            1 => Some(Self::Two),
            2 => Some(Self::Ack),
            _ => None,
        }
    }

    /// Ukuran payload tetap untuk tag ini
    #[inline(always)]
    pub const fn payload_size(self) -> usize {
        match self {
            Self::One => EVENT_ONE_PAYLOAD_SIZE,
            Self::Two => EVENT_TWO_PAYLOAD_SIZE,
            Self::Ack => EVENT_ACK_PAYLOAD_SIZE,
        }
    }
}

/// Event yang dikirim dari producer ke consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Event dengan koordinat track/slot.
    ///
    /// `reserved` adalah field opaque 8 byte; tidak pernah diinterpretasi
    /// sebagai alamat memori.
    One {
        track_num: i32,
        slot_num: i32,
        reserved: u64,
    },
    Two,
    Ack {
        waste: i32,
    },
}

impl Event {
    /// `EventOne` dengan reserved = 0
    pub const fn one(track_num: i32, slot_num: i32) -> Self {
        Self::One {
            track_num,
            slot_num,
            reserved: 0,
        }
    }

    pub const fn ack(waste: i32) -> Self {
        Self::Ack { waste }
    }

    #[inline(always)]
    pub const fn tag(&self) -> EventTag {
        match self {
            Self::One { .. } => EventTag::One,
            Self::Two => EventTag::Two,
            Self::Ack { .. } => EventTag::Ack,
        }
    }

    /// Ukuran record lengkap di ring buffer
    #[inline(always)]
    pub const fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.tag().payload_size()
    }

    /// Cek constraint field: track dan slot `EventOne` tidak boleh negatif
    #[inline(always)]
    pub fn validate(&self) -> Result<(), CodecError> {
        if let Self::One {
            track_num,
            slot_num,
            ..
        } = *self
        {
            if track_num < 0 {
                return Err(CodecError::InvalidPayload {
                    tag: EventTag::One as u32,
                    reason: "negative track number",
                });
            }
            if slot_num < 0 {
                return Err(CodecError::InvalidPayload {
                    tag: EventTag::One as u32,
                    reason: "negative slot index",
                });
            }
        }
        Ok(())
    }
}

impl Default for Event {
    /// Default `EventOne`: track 0, slot 2
    fn default() -> Self {
        Self::one(0, 2)
    }
}

/// Header record yang sudah di-decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub tag: EventTag,
    pub payload_len: u32,
}

impl RecordHeader {
    #[inline(always)]
    pub fn new(tag: EventTag, payload_len: u32) -> Self {
        Self { tag, payload_len }
    }

    /// Parse header dari 8 byte. Gagal hanya jika tag tidak dikenal.
    #[inline(always)]
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, CodecError> {
        let raw_tag = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let payload_len = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let tag = EventTag::from_u32(raw_tag).ok_or(CodecError::UnknownTag(raw_tag))?;
        Ok(Self { tag, payload_len })
    }

    #[inline(always)]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&(self.tag as u32).to_le_bytes());
        buf[4..8].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    /// Total ukuran record (header + payload).
    ///
    /// `None` jika tidak muat di `usize` (mungkin di target 32-bit untuk
    /// `payload_len` mendekati `u32::MAX`).
    #[inline(always)]
    pub fn total_size(&self) -> Option<usize> {
        usize::try_from(self.payload_len)
            .ok()
            .and_then(|len| len.checked_add(HEADER_SIZE))
    }
}
