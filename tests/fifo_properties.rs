//! Property test: ring buffer harus berperilaku seperti FIFO byte dengan
//! kapasitas terbatas, apapun urutan write/read-nya.

use std::collections::VecDeque;

use bytering::{RingBuffer, RingError, CANT_READ, HEADER_SIZE};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Write(Vec<u8>),
    Read(usize),
    Peek(usize),
    Skip(usize),
}

fn op_strategy(capacity: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::collection::vec(any::<u8>(), 0..=capacity + 8).prop_map(Op::Write),
        4 => (0..=capacity + 2).prop_map(Op::Read),
        1 => (0..=capacity).prop_map(Op::Peek),
        1 => (0..=capacity + 2).prop_map(Op::Skip),
    ]
}

fn scenario() -> impl Strategy<Value = (usize, Vec<Op>)> {
    (1usize..48).prop_flat_map(|capacity| {
        (
            Just(capacity),
            proptest::collection::vec(op_strategy(capacity), 1..64),
        )
    })
}

proptest! {
    #[test]
    fn matches_bounded_fifo_model((capacity, ops) in scenario()) {
        let ring = RingBuffer::create(vec![0u8; HEADER_SIZE + capacity]).unwrap();
        let mut model: VecDeque<u8> = VecDeque::new();

        for op in ops {
            match op {
                Op::Write(bytes) => {
                    let free = capacity - model.len();
                    let written = ring.write(&bytes);

                    // Truncation: hanya sebanyak free space, sisanya dibuang
                    prop_assert_eq!(written, bytes.len().min(free));
                    model.extend(&bytes[..written]);
                }
                Op::Read(n) => {
                    let mut out = vec![0u8; n];
                    match ring.read(&mut out) {
                        Ok(got) => {
                            prop_assert!(n <= capacity);
                            let expected: Vec<u8> =
                                model.drain(..n.min(model.len())).collect();
                            prop_assert_eq!(&out[..got], &expected[..]);
                        }
                        Err(err) => {
                            prop_assert!(n > capacity);
                            prop_assert_eq!(err.code(), CANT_READ);
                            let is_cant_read = matches!(err, RingError::CantRead { .. });
                            prop_assert!(is_cant_read);
                        }
                    }
                }
                Op::Peek(n) => {
                    let mut out = vec![0u8; n];
                    let got = ring.peek(&mut out).unwrap();
                    let expected: Vec<u8> = model.iter().take(n).copied().collect();
                    prop_assert_eq!(&out[..got], &expected[..]);
                }
                Op::Skip(n) => {
                    let skipped = ring.skip(n);
                    prop_assert_eq!(skipped, n.min(model.len()));
                    model.drain(..skipped);
                }
            }

            prop_assert_eq!(ring.len(), model.len());
            prop_assert_eq!(ring.is_empty(), model.is_empty());
            prop_assert_eq!(ring.is_full(), model.len() == capacity);
        }
    }

    #[test]
    fn round_trip_any_payload(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
        let capacity = payload.len().max(1);
        let ring = RingBuffer::create(vec![0u8; HEADER_SIZE + capacity]).unwrap();

        prop_assert_eq!(ring.write(&payload), payload.len());

        let mut out = vec![0u8; payload.len()];
        prop_assert_eq!(ring.read(&mut out).unwrap(), payload.len());
        prop_assert_eq!(out, payload);
    }

    #[test]
    fn oversized_read_always_rejected(capacity in 1usize..64, fill in 0usize..64) {
        let ring = RingBuffer::create(vec![0u8; HEADER_SIZE + capacity]).unwrap();
        ring.write(&vec![1u8; fill]);
        let before = ring.stats();

        let mut out = vec![0u8; capacity + 1];
        let err = ring.read(&mut out).unwrap_err();
        prop_assert_eq!(err.code(), CANT_READ);
        prop_assert_eq!(ring.stats(), before);
    }

    #[test]
    fn reopen_preserves_pending_bytes(
        capacity in 1usize..32,
        first in proptest::collection::vec(any::<u8>(), 0..40),
        consumed in 0usize..40,
        second in proptest::collection::vec(any::<u8>(), 0..40),
    ) {
        let ring = RingBuffer::create(vec![0u8; HEADER_SIZE + capacity]).unwrap();
        let mut model: VecDeque<u8> = VecDeque::new();

        let n = ring.write(&first);
        model.extend(&first[..n]);
        let n = ring.skip(consumed);
        model.drain(..n);
        let n = ring.write(&second);
        model.extend(&second[..n]);

        let ring = RingBuffer::open(ring.into_region()).unwrap();
        let mut out = vec![0u8; model.len()];
        prop_assert_eq!(ring.read(&mut out).unwrap(), model.len());
        prop_assert_eq!(out, model.into_iter().collect::<Vec<u8>>());
    }
}
