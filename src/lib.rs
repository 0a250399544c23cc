//! bytering - Fixed-Capacity Byte Ring Buffer
//!
//! Ring buffer byte dengan kapasitas tetap yang dibangun in-place di atas
//! region memory milik caller (`Vec<u8>`, slice, atau mmap). Banyak producer
//! dan consumer bisa berbagi satu instance lewat `Arc`.
//!
//! ```
//! use bytering::{RingBuffer, HEADER_SIZE};
//!
//! let rb = RingBuffer::create(vec![0u8; HEADER_SIZE + 8]).unwrap();
//! assert_eq!(rb.write(b"hello world"), 8); // dipotong ke free space
//!
//! let mut out = [0u8; 8];
//! assert_eq!(rb.read(&mut out).unwrap(), 8);
//! assert_eq!(&out, b"hello wo");
//! ```

pub mod core;

pub use crate::core::{MmapRing, RingBuffer, RingError, RingStats, CANT_READ, HEADER_SIZE};
