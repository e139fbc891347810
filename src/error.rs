//! Error types
//!
//! Dua lapis:
//! - `CodecError`: wire format tidak valid (decode/encode)
//! - `TransportError`: kegagalan di level ring buffer / producer / consumer

use std::io;
use thiserror::Error;

/// Error dari RecordCodec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unknown record tag {0}")]
    UnknownTag(u32),
    #[error("truncated payload: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("invalid payload for tag {tag}: {reason}")]
    InvalidPayload { tag: u32, reason: &'static str },
}

/// Error dari transport
///
/// `InsufficientSpace` adalah backpressure biasa. Dari `on_cycle`,
/// `Truncated`, `Codec` dan `Desynchronized` berarti framing stream sudah
/// rusak dan transport harus dibuat ulang. `Codec` dari `enqueue` hanya
/// berarti event ditolak sebelum masuk ring; stream tetap sehat.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid ring capacity {0}")]
    InvalidCapacity(usize),
    #[error("invalid max records per cycle {0}")]
    InvalidRecordLimit(usize),
    #[error("failed to map ring storage: {0}")]
    Storage(#[source] io::Error),
    #[error("failed to lock ring storage into memory: {0}")]
    MemoryLock(#[source] io::Error),
    #[error("insufficient space: need {needed} bytes, {available} available")]
    InsufficientSpace { needed: usize, available: usize },
    #[error("record claims {needed} bytes but only {available} are published")]
    Truncated { needed: usize, available: usize },
    #[error("corrupt record: {0}")]
    Codec(#[from] CodecError),
    #[error("transport stream is desynchronized")]
    Desynchronized,
}

impl TransportError {
    /// True jika error (dari `on_cycle`) berarti stream sudah tidak bisa
    /// dipercaya lagi. Untuk `enqueue`, cek `Producer::is_desynchronized`.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::Codec(_) | Self::Desynchronized
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
