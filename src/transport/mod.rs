//! Transport: Producer/Consumer di atas ByteRingBuffer
//!
//! `create_transport` mengembalikan pasangan handle; tidak ada global state.
//! Transport dihancurkan dengan men-drop kedua handle (storage dibebaskan
//! saat handle terakhir di-drop).

mod consumer;
mod producer;

pub use consumer::{Consumer, EventHandler};
pub use producer::Producer;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::info;

use crate::core::ByteRingBuffer;
use crate::error::{Result, TransportError};

/// Konfigurasi transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Kapasitas ring buffer dalam bytes (tetap selama transport hidup)
    pub capacity: usize,
    /// Batas jumlah record yang diproses per `on_cycle`
    pub max_records_per_cycle: usize,
    /// mlock storage saat create
    pub lock_memory: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            max_records_per_cycle: 32,
            lock_memory: false,
        }
    }
}

impl TransportConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn max_records_per_cycle(mut self, max: usize) -> Self {
        self.max_records_per_cycle = max;
        self
    }

    pub fn lock_memory(mut self, lock: bool) -> Self {
        self.lock_memory = lock;
        self
    }
}

/// Membuat transport: satu `Producer` untuk thread non-real-time dan satu
/// `Consumer` untuk callback real-time.
///
/// `max_records_per_cycle` harus > 0; consumer dengan batas 0 tidak pernah
/// mengosongkan buffer.
///
/// Jika `config.lock_memory` aktif, storage di-mlock di sini; kegagalannya
/// dikembalikan sebagai `MemoryLock` dan sebaiknya dianggap fatal oleh caller.
pub fn create_transport<H: EventHandler>(
    config: TransportConfig,
    handler: H,
) -> Result<(Producer, Consumer<H>)> {
    if config.max_records_per_cycle == 0 {
        return Err(TransportError::InvalidRecordLimit(0));
    }

    let ring = ByteRingBuffer::new(config.capacity)?;
    if config.lock_memory {
        ring.lock_memory()?;
    }

    let (writer, reader) = ring.split();
    let poisoned = Arc::new(AtomicBool::new(false));

    info!(
        capacity = config.capacity,
        max_records_per_cycle = config.max_records_per_cycle,
        lock_memory = config.lock_memory,
        "transport created"
    );

    Ok((
        Producer::new(writer, Arc::clone(&poisoned)),
        Consumer::new(reader, handler, config.max_records_per_cycle, poisoned),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = TransportConfig::with_capacity(64)
            .max_records_per_cycle(8)
            .lock_memory(true);
        assert_eq!(config.capacity, 64);
        assert_eq!(config.max_records_per_cycle, 8);
        assert!(config.lock_memory);
    }

    #[test]
    fn test_create_rejects_zero_capacity() {
        let result = create_transport(TransportConfig::with_capacity(0), ());
        assert!(matches!(result, Err(TransportError::InvalidCapacity(0))));
    }

    #[test]
    fn test_create_rejects_zero_record_limit() {
        let config = TransportConfig::with_capacity(64).max_records_per_cycle(0);
        let result = create_transport(config, ());
        assert!(matches!(result, Err(TransportError::InvalidRecordLimit(0))));

        // Batas 1 sudah cukup untuk mengosongkan buffer
        let config = TransportConfig::with_capacity(64).max_records_per_cycle(1);
        let (mut producer, mut consumer) = create_transport(config, ()).unwrap();
        producer.enqueue(&crate::protocol::Event::Two).unwrap();
        assert_eq!(consumer.on_cycle().unwrap(), 1);
        assert_eq!(consumer.read_available(), 0);
    }
}
