//! Error kinds untuk operasi ring buffer
//!
//! Write yang melebihi free space dan read dari buffer kosong BUKAN error:
//! keduanya dilaporkan lewat jumlah byte yang dikembalikan.

use std::fmt;
use std::io;

/// Kode error kompatibel untuk read yang melebihi kapasitas
pub const CANT_READ: i32 = -1;

#[derive(Debug)]
pub enum RingError {
    /// Request read lebih besar dari kapasitas total buffer
    CantRead { requested: usize, capacity: usize },
    /// Region tidak cukup untuk header + minimal 1 byte data
    RegionTooSmall { size: usize },
    /// Header di region tidak valid saat re-attach
    CorruptHeader(&'static str),
    /// Gagal membuka atau memetakan file
    Io(io::Error),
}

impl RingError {
    /// Kode integer, `CANT_READ` (-1) untuk read yang terlalu besar
    pub fn code(&self) -> i32 {
        match self {
            Self::CantRead { .. } => CANT_READ,
            Self::RegionTooSmall { .. } => -2,
            Self::CorruptHeader(_) => -3,
            Self::Io(_) => -4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CantRead { .. } => "CANT_READ",
            Self::RegionTooSmall { .. } => "REGION_TOO_SMALL",
            Self::CorruptHeader(_) => "CORRUPT_HEADER",
            Self::Io(_) => "IO",
        }
    }
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CantRead {
                requested,
                capacity,
            } => write!(
                f,
                "cannot read {} byte, ringbuffer is only of size {} byte",
                requested, capacity
            ),
            Self::RegionTooSmall { size } => write!(
                f,
                "region of {} byte cannot hold the {} byte header and any data",
                size,
                super::HEADER_SIZE
            ),
            Self::CorruptHeader(reason) => write!(f, "corrupt ringbuffer header: {}", reason),
            Self::Io(e) => write!(f, "ringbuffer storage error: {}", e),
        }
    }
}

impl std::error::Error for RingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RingError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
