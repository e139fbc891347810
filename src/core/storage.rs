//! Backing Storage untuk ring buffer
//!
//! Region byte dialokasikan sekali via anonymous mmap:
//! - Page-aligned, bisa di-pin ke memori fisik (mlock)
//! - Tidak ada alokasi lagi setelah init
//! - Dibebaskan otomatis saat di-drop (munmap juga melepas lock)

use memmap2::{MmapMut, MmapOptions};
use std::io;

/// Region byte tetap yang menjadi storage ring buffer
pub(crate) struct Storage {
    mmap: MmapMut,
    ptr: *mut u8,
    len: usize,
}

impl Storage {
    /// Alokasi region anonim sebesar `len` bytes (zero-filled oleh kernel)
    pub(crate) fn anonymous(len: usize) -> io::Result<Self> {
        let mut mmap = MmapOptions::new().len(len).map_anon()?;
        let ptr = mmap.as_mut_ptr();
        Ok(Self { mmap, ptr, len })
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Pointer ke awal region.
    ///
    /// Writer dan reader menulis/membaca lewat pointer ini secara bersamaan
    /// pada range yang tidak overlap; sinkronisasi diatur oleh index ring.
    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Kunci region ke memori fisik supaya tidak ada page fault di thread real-time.
    ///
    /// Bukan operasi real-time safe: panggil sekali sebelum region dipakai.
    pub(crate) fn lock(&self) -> io::Result<()> {
        #[cfg(unix)]
        {
            // SAFETY: range [ptr, ptr + len) adalah mapping milik kita sendiri
            let res = unsafe { libc::mlock(self.mmap.as_ptr() as *const libc::c_void, self.len) };
            if res != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }

        #[cfg(not(unix))]
        {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "memory locking is only supported on unix",
            ))
        }
    }
}
