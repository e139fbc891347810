//! Producer (non-real-time thread)
//!
//! Encode event ke stack buffer lalu satu kali `try_write` untuk seluruh
//! record. Retry / drop / sleep adalah keputusan caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{trace, warn};

use crate::core::RingWriter;
use crate::error::{Result, TransportError};
use crate::protocol::{encode, Event};

/// Sisi tulis transport. Hanya boleh ada satu per transport.
pub struct Producer {
    writer: RingWriter,
    poisoned: Arc<AtomicBool>,
    enqueued: u64,
    rejected: u64,
}

impl Producer {
    pub(crate) fn new(writer: RingWriter, poisoned: Arc<AtomicBool>) -> Self {
        Self {
            writer,
            poisoned,
            enqueued: 0,
            rejected: 0,
        }
    }

    /// Enqueue satu event sebagai satu record utuh.
    ///
    /// Returns `InsufficientSpace` jika record tidak muat (buffer tidak
    /// berubah), `Codec(InvalidPayload)` jika field event melanggar
    /// constraint (event tidak pernah masuk ring, stream tetap sehat), atau
    /// `Desynchronized` jika consumer sudah menyatakan stream rusak.
    pub fn enqueue(&mut self, event: &Event) -> Result<()> {
        if self.poisoned.load(Ordering::Acquire) {
            warn!("enqueue on desynchronized transport");
            return Err(TransportError::Desynchronized);
        }

        if let Err(e) = event.validate() {
            warn!(error = %e, "invalid event rejected");
            return Err(e.into());
        }

        let record = encode(event);
        if !self.writer.try_write(record.as_bytes()) {
            self.rejected += 1;
            let available = self.writer.write_available();
            trace!(
                needed = record.len(),
                available,
                "ring full, record rejected"
            );
            return Err(TransportError::InsufficientSpace {
                needed: record.len(),
                available,
            });
        }

        self.enqueued += 1;
        Ok(())
    }

    /// Ruang kosong saat ini dalam bytes
    #[inline(always)]
    pub fn write_available(&self) -> usize {
        self.writer.write_available()
    }

    #[inline(always)]
    pub fn read_available(&self) -> usize {
        self.writer.read_available()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.writer.capacity()
    }

    /// Jumlah record yang berhasil di-enqueue
    pub fn enqueued(&self) -> u64 {
        self.enqueued
    }

    /// Jumlah enqueue yang ditolak karena buffer penuh
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// True jika consumer sudah menandai stream rusak
    pub fn is_desynchronized(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TransportError;
    use crate::protocol::Event;
    use crate::transport::{create_transport, TransportConfig};

    #[test]
    fn test_enqueue_counts() {
        let (mut producer, _consumer) =
            create_transport(TransportConfig::with_capacity(32), ()).unwrap();

        producer.enqueue(&Event::one(1, 1)).unwrap(); // 24 bytes
        assert_eq!(producer.read_available(), 24);

        let err = producer.enqueue(&Event::ack(1)).unwrap_err(); // 12 bytes, hanya 8 sisa
        assert!(matches!(
            err,
            TransportError::InsufficientSpace {
                needed: 12,
                available: 8
            }
        ));

        producer.enqueue(&Event::Two).unwrap(); // 8 bytes, pas
        assert_eq!(producer.write_available(), 0);
        assert_eq!(producer.enqueued(), 2);
        assert_eq!(producer.rejected(), 1);
    }

    #[test]
    fn test_invalid_event_rejected_transport_usable() {
        let (mut producer, mut consumer) =
            create_transport(TransportConfig::with_capacity(64), ()).unwrap();

        let err = producer.enqueue(&Event::one(1, -1)).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Codec(crate::error::CodecError::InvalidPayload { tag: 0, .. })
        ));
        assert!(matches!(
            producer.enqueue(&Event::one(-3, 0)),
            Err(TransportError::Codec(_))
        ));
        assert_eq!(producer.read_available(), 0);
        assert_eq!(producer.enqueued(), 0);
        assert_eq!(producer.rejected(), 0);
        assert!(!producer.is_desynchronized());

        // Transport masih jalan normal
        producer.enqueue(&Event::Two).unwrap();
        assert_eq!(consumer.on_cycle().unwrap(), 1);
        assert!(!consumer.is_desynchronized());
        producer.enqueue(&Event::Two).unwrap();
    }
}
