//! Mutex-Protected Byte Ring Buffer di atas region milik caller
//!
//! Region dibagi dua: control header (`HEADER_SIZE` byte) di depan, sisanya
//! area data melingkar. Setiap operasi mengambil lock tepat satu kali:
//! pengukuran free space dan copy terjadi di critical section yang sama,
//! dan wrap-around diselesaikan dengan copy kedua dari offset 0, bukan
//! dengan memanggil ulang operasi yang sama.

use parking_lot::Mutex;
use std::fmt;
use std::io;

use super::error::RingError;
use super::header::{self, Cursor, HEADER_SIZE};

/// State yang dijaga lock: region (header + data) dan cursor
struct Inner<B> {
    region: B,
    cursor: Cursor,
    capacity: usize,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Inner<B> {
    #[inline(always)]
    fn data(&self) -> &[u8] {
        &self.region.as_ref()[HEADER_SIZE..]
    }

    #[inline(always)]
    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.region.as_mut()[HEADER_SIZE..]
    }

    #[inline(always)]
    fn free(&self) -> usize {
        self.capacity - self.cursor.len
    }

    /// Append `src` mulai dari tail. Caller sudah clamp ke free space.
    fn push(&mut self, src: &[u8]) {
        debug_assert!(src.len() <= self.free());

        let capacity = self.capacity;
        let tail = self.cursor.tail;

        // Segmen sebelum batas fisik array, lalu sisa dari offset 0
        let contiguous = (capacity - tail).min(src.len());
        let cutoff = src.len() - contiguous;

        let data = self.data_mut();
        data[tail..tail + contiguous].copy_from_slice(&src[..contiguous]);
        if cutoff > 0 {
            data[..cutoff].copy_from_slice(&src[contiguous..]);
        }

        self.cursor.tail = (tail + src.len()) % capacity;
        self.cursor.len += src.len();
        self.sync_header();
    }

    /// Copy `dst.len()` byte mulai dari head tanpa consume
    fn copy_out(&self, dst: &mut [u8]) {
        debug_assert!(dst.len() <= self.cursor.len);

        let head = self.cursor.head;
        let contiguous = (self.capacity - head).min(dst.len());
        let cutoff = dst.len() - contiguous;

        let data = self.data();
        dst[..contiguous].copy_from_slice(&data[head..head + contiguous]);
        if cutoff > 0 {
            dst[contiguous..].copy_from_slice(&data[..cutoff]);
        }
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.cursor.len);

        self.cursor.head = (self.cursor.head + n) % self.capacity;
        self.cursor.len -= n;
        self.sync_header();
    }

    fn reset(&mut self) {
        self.cursor = Cursor::default();
        self.sync_header();
    }

    #[inline(always)]
    fn sync_header(&mut self) {
        let cursor = self.cursor;
        header::store_cursor(self.region.as_mut(), cursor);
    }
}

/// Snapshot read-only untuk diagnostik
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingStats {
    /// Alamat awal area data (setelah header)
    pub data_addr: usize,
    pub capacity: usize,
    pub head: usize,
    pub tail: usize,
    pub len: usize,
    /// Status lock saat snapshot diambil
    pub locked: bool,
}

impl fmt::Display for RingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ringbuffer {{\n\
             \tdata = {:#x},\n\
             \tsize = {} byte,\n\
             \toffset head = {},\n\
             \toffset tail = {},\n\
             \tfill = {} byte,\n\
             \tmutex state = {}}}",
            self.data_addr,
            self.capacity,
            self.head,
            self.tail,
            self.len,
            if self.locked { "locked" } else { "unlocked" }
        )
    }
}

/// Byte ring buffer dengan kapasitas tetap
///
/// `B` adalah region milik caller: `Vec<u8>`, `Box<[u8]>`, `&mut [u8]`,
/// atau `memmap2::MmapMut`. Tidak ada alokasi setelah konstruksi.
///
/// Aman dipakai banyak producer dan consumer lewat `Arc` selama `B: Send`.
pub struct RingBuffer<B> {
    inner: Mutex<Inner<B>>,
    capacity: usize,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> RingBuffer<B> {
    /// Membuat ring buffer baru di dalam `region`.
    ///
    /// Header ditulis di awal region; kapasitas = `region.len() - HEADER_SIZE`.
    ///
    /// # Errors
    /// `RingError::RegionTooSmall` jika region tidak muat header + 1 byte data
    pub fn create(mut region: B) -> Result<Self, RingError> {
        let capacity = Self::capacity_of(&region)?;

        header::init(region.as_mut(), capacity);
        tracing::debug!(capacity, "ringbuffer created");

        Ok(Self::from_parts(region, capacity, Cursor::default()))
    }

    /// Re-attach ke region yang sudah berisi header (misal file mmap lama).
    ///
    /// Byte yang belum dibaca tetap tersedia.
    pub fn open(region: B) -> Result<Self, RingError> {
        let capacity = Self::capacity_of(&region)?;
        let cursor = header::load(region.as_ref(), capacity)?;

        tracing::debug!(
            capacity,
            head = cursor.head,
            tail = cursor.tail,
            len = cursor.len,
            "ringbuffer reopened"
        );

        Ok(Self::from_parts(region, capacity, cursor))
    }

    fn capacity_of(region: &B) -> Result<usize, RingError> {
        let size = region.as_ref().len();
        if size <= HEADER_SIZE {
            return Err(RingError::RegionTooSmall { size });
        }
        Ok(size - HEADER_SIZE)
    }

    fn from_parts(region: B, capacity: usize, cursor: Cursor) -> Self {
        Self {
            inner: Mutex::new(Inner {
                region,
                cursor,
                capacity,
            }),
            capacity,
        }
    }

    /// Append byte ke buffer (Producer side)
    ///
    /// Returns jumlah byte yang benar-benar ditulis. Jika `src` lebih besar
    /// dari free space, write dipotong dan warning di-log; buffer penuh
    /// mengembalikan 0.
    pub fn write(&self, src: &[u8]) -> usize {
        let (written, free) = {
            let mut inner = self.inner.lock();
            let free = inner.free();
            let n = src.len().min(free);
            if n > 0 {
                inner.push(&src[..n]);
            }
            (n, free)
        };

        // Log di luar lock, pakai nilai yang diambil di dalam lock
        if free == 0 {
            tracing::trace!(requested = src.len(), "ringbuffer full");
        } else if written < src.len() {
            tracing::warn!(
                requested = src.len(),
                free,
                "only {} bytes free, write truncated",
                free
            );
        }

        written
    }

    /// Ambil byte dari buffer (Consumer side)
    ///
    /// Returns `Ok(n)` dengan `n <= dst.len()`; `Ok(0)` jika buffer kosong.
    ///
    /// # Errors
    /// `RingError::CantRead` jika `dst.len()` melebihi kapasitas total,
    /// terlepas dari isi buffer. State tidak berubah.
    pub fn read(&self, dst: &mut [u8]) -> Result<usize, RingError> {
        self.check_request(dst.len())?;

        let mut inner = self.inner.lock();
        let n = dst.len().min(inner.cursor.len);
        if n > 0 {
            inner.copy_out(&mut dst[..n]);
            inner.consume(n);
        }
        Ok(n)
    }

    /// Seperti `read`, tapi byte tidak di-consume
    pub fn peek(&self, dst: &mut [u8]) -> Result<usize, RingError> {
        self.check_request(dst.len())?;

        let inner = self.inner.lock();
        let n = dst.len().min(inner.cursor.len);
        if n > 0 {
            inner.copy_out(&mut dst[..n]);
        }
        Ok(n)
    }

    /// Buang maksimal `n` byte tertua. Returns jumlah yang dibuang.
    pub fn skip(&self, n: usize) -> usize {
        let mut inner = self.inner.lock();
        let n = n.min(inner.cursor.len);
        if n > 0 {
            inner.consume(n);
        }
        n
    }

    /// Kosongkan buffer, head dan tail kembali ke 0
    pub fn clear(&self) {
        self.inner.lock().reset();
    }

    #[inline(always)]
    fn check_request(&self, requested: usize) -> Result<(), RingError> {
        if requested > self.capacity {
            tracing::debug!(
                requested,
                capacity = self.capacity,
                "read request exceeds capacity"
            );
            return Err(RingError::CantRead {
                requested,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Snapshot capacity, offset, dan status lock
    pub fn stats(&self) -> RingStats {
        // Status lock diambil sebelum kita sendiri mengunci
        let locked = self.inner.is_locked();
        let inner = self.inner.lock();

        RingStats {
            data_addr: inner.data().as_ptr() as usize,
            capacity: self.capacity,
            head: inner.cursor.head,
            tail: inner.cursor.tail,
            len: inner.cursor.len,
            locked,
        }
    }

    /// Tulis state buffer dalam format human-readable
    pub fn dbg_write<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.stats())
    }

    /// Print state buffer ke stdout
    pub fn dbg_print(&self) {
        println!("{}", self.stats());
    }

    /// Lepas lock dan kembalikan region ke caller. Header tetap di region.
    pub fn into_region(self) -> B {
        self.inner.into_inner().region
    }

    /// Jalankan `f` dengan region mentah di dalam lock
    pub(crate) fn with_region<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.region)
    }
}

impl<B> RingBuffer<B> {
    /// Kapasitas area data dalam byte
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jumlah byte yang belum dibaca
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.inner.lock().cursor.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Free space saat ini. Bisa langsung basi jika ada thread lain.
    #[inline(always)]
    pub fn free(&self) -> usize {
        self.capacity - self.len()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> fmt::Debug for RingBuffer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("RingBuffer")
            .field("capacity", &stats.capacity)
            .field("head", &stats.head)
            .field("tail", &stats.tail)
            .field("len", &stats.len)
            .finish()
    }
}
