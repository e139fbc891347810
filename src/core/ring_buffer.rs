//! Lock-Free Single-Producer Single-Consumer (SPSC) Byte Ring Buffer
//!
//! Lamport queue versi byte: writer menyalin slice byte ke storage lalu
//! mem-publish `write_index` dengan Release; reader me-load `write_index`
//! dengan Acquire sebelum menyentuh region yang belum dibaca.
//! Tidak ada Mutex, tidak ada alokasi setelah `new`.
//!
//! Index disimpan dalam range `[0, 2 * capacity)` sehingga penuh dan kosong
//! bisa dibedakan tanpa slot kosong, dan capacity tidak harus power of 2.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::info;

use super::storage::Storage;
use crate::error::{Result, TransportError};

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Lock-free SPSC ring buffer untuk byte.
///
/// Dibuat sekali, lalu di-[`split`](Self::split) menjadi satu [`RingWriter`]
/// dan satu [`RingReader`]. Karena kedua half tidak `Clone` dan operasi yang
/// memajukan index butuh `&mut self`, hanya ada satu writer dan satu reader.
#[repr(C)]
pub struct ByteRingBuffer {
    // Producer side - cache line aligned
    write_index: CacheLinePadded<AtomicUsize>,
    // Consumer side - cache line aligned
    read_index: CacheLinePadded<AtomicUsize>,
    storage: Storage,
    capacity: usize,
    // 2 * capacity, modulus untuk kedua index
    wrap: usize,
}

// SAFETY: ByteRingBuffer aman untuk Send/Sync karena:
// - Hanya RingWriter yang menulis write_index dan region kosong
// - Hanya RingReader yang menulis read_index
// - Region yang sedang ditulis writer tidak pernah overlap dengan region
//   yang dibaca reader (dijaga oleh pasangan Acquire/Release pada index)
unsafe impl Send for ByteRingBuffer {}
unsafe impl Sync for ByteRingBuffer {}

impl ByteRingBuffer {
    /// Membuat ring buffer dengan `capacity` bytes.
    ///
    /// Satu-satunya alokasi terjadi di sini. Capacity 0 (atau terlalu besar
    /// untuk aritmatika index) ditolak dengan `InvalidCapacity`.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > usize::MAX / 4 {
            return Err(TransportError::InvalidCapacity(capacity));
        }

        let storage = Storage::anonymous(capacity).map_err(TransportError::Storage)?;
        info!(capacity, "ring buffer created");

        Ok(Self {
            write_index: CacheLinePadded::new(AtomicUsize::new(0)),
            read_index: CacheLinePadded::new(AtomicUsize::new(0)),
            storage,
            capacity,
            wrap: capacity * 2,
        })
    }

    /// Kapasitas buffer dalam bytes
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pin storage ke memori fisik (mlock).
    ///
    /// Bukan real-time safe. Panggil sekali setelah `new` dan sebelum
    /// consumer mulai jalan.
    pub fn lock_memory(&self) -> Result<()> {
        self.storage.lock().map_err(TransportError::MemoryLock)?;
        info!(bytes = self.storage.len(), "ring storage locked into memory");
        Ok(())
    }

    /// Pecah menjadi writer (producer thread) dan reader (consumer thread)
    pub fn split(self) -> (RingWriter, RingReader) {
        let shared = Arc::new(self);
        (
            RingWriter {
                ring: Arc::clone(&shared),
            },
            RingReader { ring: shared },
        )
    }

    #[inline(always)]
    fn distance(&self, write: usize, read: usize) -> usize {
        if write >= read {
            write - read
        } else {
            write + self.wrap - read
        }
    }

    #[inline(always)]
    fn advance(&self, index: usize, n: usize) -> usize {
        let next = index + n;
        if next >= self.wrap {
            next - self.wrap
        } else {
            next
        }
    }

    #[inline(always)]
    fn offset(&self, index: usize) -> usize {
        if index >= self.capacity {
            index - self.capacity
        } else {
            index
        }
    }

    /// Salin `src` ke storage mulai `offset`, wrap ke awal jika perlu.
    ///
    /// # Safety
    /// Range tujuan harus berada di region kosong milik writer.
    #[inline(always)]
    unsafe fn copy_in(&self, offset: usize, src: &[u8]) {
        let base = self.storage.as_ptr();
        let first_part = (self.capacity - offset).min(src.len());
        std::ptr::copy_nonoverlapping(src.as_ptr(), base.add(offset), first_part);

        if first_part < src.len() {
            let second_part = src.len() - first_part;
            std::ptr::copy_nonoverlapping(src.as_ptr().add(first_part), base, second_part);
        }
    }

    /// Salin dari storage mulai `offset` ke `dst`, wrap ke awal jika perlu.
    ///
    /// # Safety
    /// Range sumber harus sudah dipublish writer dan belum dikonsumsi.
    #[inline(always)]
    unsafe fn copy_out(&self, offset: usize, dst: &mut [u8]) {
        let base = self.storage.as_ptr() as *const u8;
        let first_part = (self.capacity - offset).min(dst.len());
        std::ptr::copy_nonoverlapping(base.add(offset), dst.as_mut_ptr(), first_part);

        if first_part < dst.len() {
            let second_part = dst.len() - first_part;
            std::ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(first_part), second_part);
        }
    }
}

/// Writer half - hanya dipakai oleh producer thread
pub struct RingWriter {
    ring: Arc<ByteRingBuffer>,
}

impl RingWriter {
    /// Tulis seluruh `bytes` atau tidak sama sekali.
    ///
    /// Returns `true` jika berhasil, `false` jika ruang tidak cukup (buffer
    /// tidak berubah). Zero-allocation, lock-free, tidak pernah blocking.
    #[inline(always)]
    pub fn try_write(&mut self, bytes: &[u8]) -> bool {
        let ring = &*self.ring;
        let write = ring.write_index.value.load(Ordering::Relaxed);
        // Acquire: reader sudah selesai menyalin byte sebelum read_index maju
        let read = ring.read_index.value.load(Ordering::Acquire);

        if bytes.len() > ring.capacity - ring.distance(write, read) {
            return false;
        }
        if bytes.is_empty() {
            return true;
        }

        // SAFETY: bytes.len() <= write_available, jadi range ini kosong
        unsafe {
            ring.copy_in(ring.offset(write), bytes);
        }

        // Release: isi byte visible sebelum write_index terlihat maju
        ring.write_index
            .value
            .store(ring.advance(write, bytes.len()), Ordering::Release);

        true
    }

    /// Ruang kosong dilihat dari writer (write_index milik sendiri, exact)
    #[inline(always)]
    pub fn write_available(&self) -> usize {
        let ring = &*self.ring;
        let write = ring.write_index.value.load(Ordering::Relaxed);
        let read = ring.read_index.value.load(Ordering::Acquire);
        ring.capacity - ring.distance(write, read)
    }

    #[inline(always)]
    pub fn read_available(&self) -> usize {
        self.ring.capacity - self.write_available()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}

/// Reader half - hanya dipakai oleh consumer thread
pub struct RingReader {
    ring: Arc<ByteRingBuffer>,
}

impl RingReader {
    /// Salin `dst.len()` byte pertama yang belum dibaca tanpa mengkonsumsi.
    ///
    /// Returns `false` jika byte yang dipublish kurang dari `dst.len()`.
    #[inline(always)]
    pub fn peek(&self, dst: &mut [u8]) -> bool {
        let ring = &*self.ring;
        let read = ring.read_index.value.load(Ordering::Relaxed);
        // Acquire: byte sampai write_index sudah lengkap ditulis
        let write = ring.write_index.value.load(Ordering::Acquire);

        if dst.len() > ring.distance(write, read) {
            return false;
        }

        // SAFETY: range [read, read + dst.len()) sudah dipublish writer
        unsafe {
            ring.copy_out(ring.offset(read), dst);
        }

        true
    }

    /// `peek` lalu konsumsi `dst.len()` byte
    #[inline(always)]
    pub fn read(&mut self, dst: &mut [u8]) -> bool {
        if !self.peek(dst) {
            return false;
        }
        self.consume(dst.len());
        true
    }

    /// Konsumsi `n` byte tanpa menyalin
    #[inline(always)]
    pub fn skip(&mut self, n: usize) -> bool {
        if n > self.read_available() {
            return false;
        }
        self.consume(n);
        true
    }

    #[inline(always)]
    fn consume(&mut self, n: usize) {
        let ring = &*self.ring;
        let read = ring.read_index.value.load(Ordering::Relaxed);
        // Release: copy di atas selesai sebelum writer boleh menimpa region ini
        ring.read_index
            .value
            .store(ring.advance(read, n), Ordering::Release);
    }

    /// Byte yang sudah dipublish dilihat dari reader (read_index milik sendiri, exact)
    #[inline(always)]
    pub fn read_available(&self) -> usize {
        let ring = &*self.ring;
        let read = ring.read_index.value.load(Ordering::Relaxed);
        let write = ring.write_index.value.load(Ordering::Acquire);
        ring.distance(write, read)
    }

    #[inline(always)]
    pub fn write_available(&self) -> usize {
        self.ring.capacity - self.read_available()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }

    /// Timpa byte ke-`n` dari region yang belum dibaca (simulasi korupsi)
    #[cfg(test)]
    pub(crate) fn overwrite_unread(&mut self, n: usize, byte: u8) {
        let ring = &*self.ring;
        assert!(n < self.read_available());
        let read = ring.read_index.value.load(Ordering::Relaxed);
        let offset = ring.offset(ring.advance(read, n));
        unsafe {
            *ring.storage.as_ptr().add(offset) = byte;
        }
    }
}
