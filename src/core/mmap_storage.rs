//! Memory-Mapped Region untuk Ring Buffer
//!
//! Ring buffer bisa hidup langsung di mmap:
//! - File-backed: header + data tersimpan ke disk, bisa di-reopen
//! - Anonymous: region tanpa file, tetap satu alokasi saat init

use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::Path;

use super::error::RingError;
use super::header::{self, HEADER_SIZE};
use super::ring_buffer::RingBuffer;

/// Ring buffer di atas mmap
pub type MmapRing = RingBuffer<MmapMut>;

impl RingBuffer<MmapMut> {
    /// Membuat atau membuka ring buffer file-backed
    ///
    /// File baru di-set ke `HEADER_SIZE + capacity` byte. File lama dengan
    /// header valid di-reopen dan byte yang belum dibaca tetap ada.
    ///
    /// # Arguments
    /// * `path` - Path ke file storage
    /// * `capacity` - Kapasitas data dalam bytes (tanpa header)
    pub fn open_file<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::RegionTooSmall { size: HEADER_SIZE });
        }

        let total_size = HEADER_SIZE + capacity;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        // Jangan resize file yang sudah berisi ring lain
        let existing = file.metadata()?.len();
        if existing == 0 {
            file.set_len(total_size as u64)?;
        } else if existing != total_size as u64 {
            return Err(RingError::CorruptHeader("file size does not match capacity"));
        }

        // SAFETY: File sudah dibuka dengan read/write permission dan ukurannya
        // sudah dicek. Mapping harus tidak dipakai proses lain bersamaan.
        let mmap = unsafe { MmapOptions::new().len(total_size).map_mut(&file)? };

        if header::has_magic(&mmap) {
            tracing::debug!(path = %path.as_ref().display(), "reopening file-backed ringbuffer");
            Self::open(mmap)
        } else {
            tracing::debug!(path = %path.as_ref().display(), "initializing file-backed ringbuffer");
            Self::create(mmap)
        }
    }

    /// Ring buffer di anonymous mapping (tanpa file)
    pub fn anonymous(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::RegionTooSmall { size: HEADER_SIZE });
        }

        let mmap = MmapOptions::new().len(HEADER_SIZE + capacity).map_anon()?;
        Self::create(mmap)
    }

    /// Flush header + data ke file (msync). No-op untuk anonymous mapping.
    pub fn flush(&self) -> Result<(), RingError> {
        self.with_region(|mmap| mmap.flush())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_mmap_ring_basic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ring.dat");

        let rb = MmapRing::open_file(&path, 4096).unwrap();
        assert_eq!(rb.capacity(), 4096);
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            (HEADER_SIZE + 4096) as u64
        );

        let data = b"Hello, ring!";
        assert_eq!(rb.write(data), data.len());

        let mut out = [0u8; 12];
        assert_eq!(rb.read(&mut out).unwrap(), data.len());
        assert_eq!(&out, data);
    }

    #[test]
    fn test_mmap_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.dat");

        // Write data
        {
            let rb = MmapRing::open_file(&path, 64).unwrap();
            rb.write(b"Persistent data");
            let mut skip = [0u8; 11];
            rb.read(&mut skip).unwrap();
            rb.flush().unwrap();
        }

        // Reopen and verify
        {
            let rb = MmapRing::open_file(&path, 64).unwrap();
            assert_eq!(rb.len(), 4);

            let mut out = [0u8; 4];
            rb.read(&mut out).unwrap();
            assert_eq!(&out, b"data");
        }
    }

    #[test]
    fn test_mmap_capacity_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mismatch.dat");

        MmapRing::open_file(&path, 64).unwrap();
        let err = MmapRing::open_file(&path, 128).unwrap_err();
        assert!(matches!(err, RingError::CorruptHeader(_)));
    }

    #[test]
    fn test_anonymous_ring() {
        let rb = MmapRing::anonymous(32).unwrap();
        assert_eq!(rb.capacity(), 32);
        assert_eq!(rb.write(&[7u8; 40]), 32);
        assert!(rb.is_full());
        rb.flush().unwrap();

        assert!(MmapRing::anonymous(0).is_err());
    }
}
