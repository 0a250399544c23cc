//! Core module: Byte Ring Buffer di atas region milik caller
//!
//! Prinsip desain:
//! - In-Place: Header dan data hidup di region yang diberikan caller
//! - Satu Lock per Operasi: Ukur free space dan copy di critical section yang sama
//! - No-Allocation: Tidak ada alokasi setelah konstruksi

mod error;
mod header;
mod mmap_storage;
mod ring_buffer;

pub use error::{RingError, CANT_READ};
pub use header::HEADER_SIZE;
pub use mmap_storage::MmapRing;
pub use ring_buffer::{RingBuffer, RingStats};
