//! Core module: Lock-Free Byte Ring Buffer dengan mmap backing
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic operations, tidak ada Mutex/RwLock
//! - No-Allocation: Storage dialokasikan sekali saat init
//! - Pinnable: Storage bisa di-mlock sebelum dipakai thread real-time

mod ring_buffer;
mod storage;

pub use ring_buffer::{ByteRingBuffer, RingReader, RingWriter};
