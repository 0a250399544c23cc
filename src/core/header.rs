//! Control Header di awal region
//!
//! Layout (64 bytes, satu cache line, little-endian):
//! ┌──────────┬─────────┬──────────┬──────────┬──────┬──────┬─────┬─────────┐
//! │ magic u64│ ver u32 │ rsvd u32 │ cap u64  │ head │ tail │ len │ padding │
//! └──────────┴─────────┴──────────┴──────────┴──────┴──────┴─────┴─────────┘
//!
//! Header di-encode field per field, bukan di-cast dari pointer, karena
//! region dari caller tidak dijamin aligned.

use super::error::RingError;

pub const MAGIC: u64 = 0x4259_5445_5249_4E47; // "BYTERING" in hex
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 64;

const MAGIC_AT: usize = 0;
const VERSION_AT: usize = 8;
const CAPACITY_AT: usize = 16;
const HEAD_AT: usize = 24;
const TAIL_AT: usize = 32;
const LEN_AT: usize = 40;

/// Posisi baca/tulis yang dijaga oleh lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Offset byte tertua yang belum dibaca
    pub head: usize,
    /// Offset satu setelah byte terbaru
    pub tail: usize,
    /// Jumlah byte valid, membedakan kosong dan penuh saat head == tail
    pub len: usize,
}

impl Cursor {
    /// Cek invariant offset terhadap kapasitas
    #[inline(always)]
    pub fn is_consistent(&self, capacity: usize) -> bool {
        self.head < capacity
            && self.tail < capacity
            && self.len <= capacity
            && (self.head + self.len) % capacity == self.tail
    }
}

#[inline(always)]
fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline(always)]
fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(raw)
}

/// Tulis header lengkap (magic, version, capacity, cursor)
pub fn init(buf: &mut [u8], capacity: usize) {
    buf[..HEADER_SIZE].fill(0);
    put_u64(buf, MAGIC_AT, MAGIC);
    buf[VERSION_AT..VERSION_AT + 4].copy_from_slice(&VERSION.to_le_bytes());
    put_u64(buf, CAPACITY_AT, capacity as u64);
    store_cursor(buf, Cursor::default());
}

/// Update hanya bagian cursor. Dipanggil di dalam critical section.
#[inline(always)]
pub fn store_cursor(buf: &mut [u8], cursor: Cursor) {
    put_u64(buf, HEAD_AT, cursor.head as u64);
    put_u64(buf, TAIL_AT, cursor.tail as u64);
    put_u64(buf, LEN_AT, cursor.len as u64);
}

/// Baca dan validasi header yang sudah ada
///
/// `expected_capacity` adalah ukuran region dikurangi header; header dari
/// region dengan ukuran lain ditolak.
pub fn load(buf: &[u8], expected_capacity: usize) -> Result<Cursor, RingError> {
    if buf.len() < HEADER_SIZE || expected_capacity == 0 {
        return Err(RingError::RegionTooSmall { size: buf.len() });
    }
    if get_u64(buf, MAGIC_AT) != MAGIC {
        return Err(RingError::CorruptHeader("bad magic"));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&buf[VERSION_AT..VERSION_AT + 4]);
    if u32::from_le_bytes(version) != VERSION {
        return Err(RingError::CorruptHeader("unsupported version"));
    }

    if get_u64(buf, CAPACITY_AT) != expected_capacity as u64 {
        return Err(RingError::CorruptHeader("capacity does not match region"));
    }

    let cursor = Cursor {
        head: get_u64(buf, HEAD_AT) as usize,
        tail: get_u64(buf, TAIL_AT) as usize,
        len: get_u64(buf, LEN_AT) as usize,
    };

    if !cursor.is_consistent(expected_capacity) {
        return Err(RingError::CorruptHeader("offsets out of range"));
    }

    Ok(cursor)
}

/// Cek cepat apakah region sudah membawa header bytering
pub fn has_magic(buf: &[u8]) -> bool {
    buf.len() >= HEADER_SIZE && get_u64(buf, MAGIC_AT) == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let mut buf = vec![0xAAu8; HEADER_SIZE + 32];
        init(&mut buf, 32);

        assert!(has_magic(&buf));
        assert_eq!(load(&buf, 32).unwrap(), Cursor::default());
        // Padding harus nol
        assert!(buf[48..HEADER_SIZE].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_cursor_persisted() {
        let mut buf = vec![0u8; HEADER_SIZE + 16];
        init(&mut buf, 16);

        let cursor = Cursor {
            head: 12,
            tail: 3,
            len: 7,
        };
        store_cursor(&mut buf, cursor);

        assert_eq!(load(&buf, 16).unwrap(), cursor);
    }

    #[test]
    fn test_reject_bad_magic() {
        let buf = vec![0u8; HEADER_SIZE + 16];
        assert!(!has_magic(&buf));
        assert!(matches!(
            load(&buf, 16),
            Err(RingError::CorruptHeader("bad magic"))
        ));
    }

    #[test]
    fn test_reject_capacity_mismatch() {
        let mut buf = vec![0u8; HEADER_SIZE + 16];
        init(&mut buf, 16);
        assert!(matches!(load(&buf, 8), Err(RingError::CorruptHeader(_))));
    }

    #[test]
    fn test_reject_inconsistent_offsets() {
        let mut buf = vec![0u8; HEADER_SIZE + 16];
        init(&mut buf, 16);

        // tail tidak sama dengan head + len
        store_cursor(
            &mut buf,
            Cursor {
                head: 2,
                tail: 9,
                len: 3,
            },
        );
        assert!(load(&buf, 16).is_err());

        // head di luar kapasitas
        store_cursor(
            &mut buf,
            Cursor {
                head: 16,
                tail: 0,
                len: 0,
            },
        );
        assert!(load(&buf, 16).is_err());
    }

    #[test]
    fn test_full_cursor_is_consistent() {
        let full = Cursor {
            head: 5,
            tail: 5,
            len: 16,
        };
        assert!(full.is_consistent(16));
    }
}
