//! Consumer (real-time thread)
//!
//! `on_cycle` dipanggil sekali per siklus oleh scheduler eksternal (mis.
//! callback audio). Setiap panggilan memproses paling banyak
//! `max_records_per_cycle` record.
//!
//! Real-time safety di dalam `on_cycle`:
//! - Tidak ada alokasi (scratch buffer ada di struct)
//! - Tidak ada lock, syscall, atau logging
//! - Error dikembalikan sebagai value, tidak pernah panic

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::RingReader;
use crate::error::{CodecError, Result, TransportError};
use crate::protocol::{
    decode_header, decode_payload, Event, HEADER_SIZE, MAX_PAYLOAD_SIZE, MAX_RECORD_SIZE,
};

/// Handler untuk setiap tag event.
///
/// Dipanggil dari thread real-time: implementasi tidak boleh blocking
/// atau alokasi. Default setiap method adalah no-op.
pub trait EventHandler {
    fn on_event_one(&mut self, _track_num: i32, _slot_num: i32, _reserved: u64) {}

    fn on_event_two(&mut self) {}

    fn on_event_ack(&mut self, _waste: i32) {}
}

/// Handler yang membuang semua event
impl EventHandler for () {}

/// Sisi baca transport. Hanya boleh ada satu per transport.
pub struct Consumer<H> {
    reader: RingReader,
    handler: H,
    max_records_per_cycle: usize,
    poisoned: Arc<AtomicBool>,
    scratch: [u8; MAX_RECORD_SIZE],
    dispatched: u64,
}

impl<H: EventHandler> Consumer<H> {
    pub(crate) fn new(
        reader: RingReader,
        handler: H,
        max_records_per_cycle: usize,
        poisoned: Arc<AtomicBool>,
    ) -> Self {
        Self {
            reader,
            handler,
            max_records_per_cycle,
            poisoned,
            scratch: [0u8; MAX_RECORD_SIZE],
            dispatched: 0,
        }
    }

    /// Entry point per siklus real-time.
    ///
    /// Returns jumlah record yang di-dispatch pada siklus ini. Buffer kosong
    /// atau record belum lengkap bukan error. Error hanya untuk stream yang
    /// rusak (`Truncated`, `Codec`); setelah itu transport ditandai
    /// desynchronized dan semua panggilan berikutnya mengembalikan
    /// `Desynchronized` tanpa menyentuh buffer.
    pub fn on_cycle(&mut self) -> Result<usize> {
        if self.poisoned.load(Ordering::Acquire) {
            return Err(TransportError::Desynchronized);
        }

        let mut count = 0;
        while count < self.max_records_per_cycle {
            match self.next_event() {
                Ok(Some(event)) => {
                    self.dispatch(event);
                    count += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    self.poisoned.store(true, Ordering::Release);
                    self.dispatched += count as u64;
                    return Err(e);
                }
            }
        }

        self.dispatched += count as u64;
        Ok(count)
    }

    /// Baca satu record lengkap. `Ok(None)` = belum ada header lengkap.
    #[inline(always)]
    fn next_event(&mut self) -> Result<Option<Event>> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        if !self.reader.peek(&mut header_bytes) {
            return Ok(None);
        }

        let header = decode_header(&header_bytes)?;
        let payload_len = header.payload_len as usize;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(CodecError::InvalidPayload {
                tag: header.tag as u32,
                reason: "payload length exceeds maximum record size",
            }
            .into());
        }

        // payload_len sudah dibatasi MAX_PAYLOAD_SIZE, jadi tidak overflow
        let total = HEADER_SIZE + payload_len;

        // Producer selalu menulis record utuh, jadi record setengah = stream rusak
        let available = self.reader.read_available();
        if available < total {
            return Err(TransportError::Truncated {
                needed: total,
                available,
            });
        }

        let record = &mut self.scratch[..total];
        if !self.reader.peek(record) || !self.reader.skip(total) {
            return Err(TransportError::Truncated {
                needed: total,
                available: self.reader.read_available(),
            });
        }

        let event = decode_payload(header, &record[HEADER_SIZE..])?;
        Ok(Some(event))
    }

    #[inline(always)]
    fn dispatch(&mut self, event: Event) {
        match event {
            Event::One {
                track_num,
                slot_num,
                reserved,
            } => self.handler.on_event_one(track_num, slot_num, reserved),
            Event::Two => self.handler.on_event_two(),
            Event::Ack { waste } => self.handler.on_event_ack(waste),
        }
    }
}

impl<H> Consumer<H> {
    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Total record yang sudah di-dispatch sejak transport dibuat
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn max_records_per_cycle(&self) -> usize {
        self.max_records_per_cycle
    }

    #[inline(always)]
    pub fn read_available(&self) -> usize {
        self.reader.read_available()
    }

    #[inline(always)]
    pub fn write_available(&self) -> usize {
        self.reader.write_available()
    }

    pub fn is_desynchronized(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{create_transport, TransportConfig};

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl EventHandler for Recorder {
        fn on_event_one(&mut self, track_num: i32, slot_num: i32, reserved: u64) {
            self.events.push(Event::One {
                track_num,
                slot_num,
                reserved,
            });
        }

        fn on_event_two(&mut self) {
            self.events.push(Event::Two);
        }

        fn on_event_ack(&mut self, waste: i32) {
            self.events.push(Event::Ack { waste });
        }
    }

    #[test]
    fn test_concrete_scenario() {
        let config = TransportConfig::with_capacity(64).max_records_per_cycle(3);
        let (mut producer, mut consumer) = create_transport(config, Recorder::default()).unwrap();

        producer.enqueue(&Event::one(3, 2)).unwrap();
        producer.enqueue(&Event::Two).unwrap();
        producer.enqueue(&Event::ack(7)).unwrap();
        assert_eq!(consumer.read_available(), 24 + 8 + 12);

        assert_eq!(consumer.on_cycle().unwrap(), 3);
        assert_eq!(
            consumer.handler().events,
            vec![Event::one(3, 2), Event::Two, Event::ack(7)]
        );
        assert_eq!(consumer.read_available(), 0);
    }

    #[test]
    fn test_empty_cycle_is_not_error() {
        let (_producer, mut consumer) =
            create_transport(TransportConfig::default(), Recorder::default()).unwrap();
        assert_eq!(consumer.on_cycle().unwrap(), 0);
        assert_eq!(consumer.on_cycle().unwrap(), 0);
        assert!(!consumer.is_desynchronized());
    }

    #[test]
    fn test_bounded_drain() {
        let config = TransportConfig::with_capacity(2048).max_records_per_cycle(8);
        let (mut producer, mut consumer) = create_transport(config, Recorder::default()).unwrap();

        for i in 0..100 {
            producer.enqueue(&Event::ack(i)).unwrap();
        }

        assert_eq!(consumer.on_cycle().unwrap(), 8);
        assert_eq!(consumer.handler().events.len(), 8);

        let mut cycles = 1;
        while consumer.on_cycle().unwrap() > 0 {
            cycles += 1;
        }
        assert_eq!(cycles, 13); // ceil(100 / 8)
        assert_eq!(consumer.dispatched(), 100);

        let expected: Vec<Event> = (0..100).map(Event::ack).collect();
        assert_eq!(consumer.handler().events, expected);
    }

    #[test]
    fn test_corrupt_tag_reports_unknown_tag() {
        let (mut producer, mut consumer) =
            create_transport(TransportConfig::with_capacity(64), Recorder::default()).unwrap();

        producer.enqueue(&Event::ack(1)).unwrap();
        producer.enqueue(&Event::ack(2)).unwrap();

        // Tag record kedua ada di offset 12
        consumer.reader.overwrite_unread(12, 0x7F);

        let err = consumer.on_cycle().unwrap_err();
        assert!(matches!(
            err,
            TransportError::Codec(CodecError::UnknownTag(0x7F))
        ));
        // Record pertama masih sempat di-dispatch, yang rusak tidak
        assert_eq!(consumer.handler().events, vec![Event::ack(1)]);

        assert!(consumer.is_desynchronized());
        assert!(producer.is_desynchronized());
        assert!(matches!(
            consumer.on_cycle(),
            Err(TransportError::Desynchronized)
        ));
        assert!(matches!(
            producer.enqueue(&Event::Two),
            Err(TransportError::Desynchronized)
        ));
    }

    #[test]
    fn test_oversized_length_is_corruption() {
        let (mut producer, mut consumer) =
            create_transport(TransportConfig::with_capacity(64), Recorder::default()).unwrap();

        producer.enqueue(&Event::Two).unwrap();
        consumer.reader.overwrite_unread(4, 200);

        let err = consumer.on_cycle().unwrap_err();
        assert!(err.is_corruption());
        assert!(matches!(
            err,
            TransportError::Codec(CodecError::InvalidPayload { tag: 1, .. })
        ));
    }

    #[test]
    fn test_length_beyond_published_is_truncated() {
        let (mut producer, mut consumer) =
            create_transport(TransportConfig::with_capacity(64), Recorder::default()).unwrap();

        // Ack 12 bytes, header diubah supaya mengklaim payload 16 bytes
        producer.enqueue(&Event::ack(5)).unwrap();
        consumer.reader.overwrite_unread(4, 16);

        let err = consumer.on_cycle().unwrap_err();
        assert!(matches!(
            err,
            TransportError::Truncated {
                needed: 24,
                available: 12
            }
        ));
        assert!(consumer.handler().events.is_empty());
    }

    #[test]
    fn test_invalid_field_is_corruption() {
        let (mut producer, mut consumer) =
            create_transport(TransportConfig::with_capacity(64), Recorder::default()).unwrap();

        producer.enqueue(&Event::one(1, 1)).unwrap();
        // Byte tertinggi slot_num (payload offset 4..8, record offset 12..16):
        // 0xFF membuat slot negatif
        consumer.reader.overwrite_unread(15, 0xFF);

        let err = consumer.on_cycle().unwrap_err();
        assert!(matches!(
            err,
            TransportError::Codec(CodecError::InvalidPayload {
                tag: 0,
                reason: "negative slot index"
            })
        ));
        assert!(consumer.handler().events.is_empty());
        assert!(consumer.is_desynchronized());
        assert!(matches!(
            producer.enqueue(&Event::Two),
            Err(TransportError::Desynchronized)
        ));
    }
}
