//! evring - Lock-Free Event Transport untuk thread real-time
//!
//! Arsitektur:
//! - Lock-Free: SPSC byte ring buffer, hanya atomic Acquire/Release
//! - No-Allocation: Storage mmap dialokasikan sekali, bisa di-mlock
//! - Binary Protocol: header 8 byte (tag, payload_len) + payload per tag
//! - Bounded: Consumer memproses paling banyak K record per siklus
//!
//! ```no_run
//! use evring::protocol::Event;
//! use evring::transport::{create_transport, EventHandler, TransportConfig};
//!
//! struct Engine;
//!
//! impl EventHandler for Engine {
//!     fn on_event_ack(&mut self, waste: i32) {
//!         let _ = waste;
//!     }
//! }
//!
//! let (mut producer, mut consumer) =
//!     create_transport(TransportConfig::with_capacity(4096), Engine).unwrap();
//!
//! // Thread non-real-time
//! producer.enqueue(&Event::ack(7)).unwrap();
//!
//! // Callback real-time, sekali per siklus
//! consumer.on_cycle().unwrap();
//! ```

pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;

pub use error::{CodecError, Result, TransportError};
