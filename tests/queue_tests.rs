//! Transaction queue capacity and ordering tests

use rust_i2c_sniffer::queue::TransactionQueue;
use rust_i2c_sniffer::transaction::{Direction, Transaction};

const N: usize = 8;

fn numbered(i: u8) -> Transaction {
    let mut tx = Transaction::with_data(i, Direction::Write, &[i], false);
    tx.timestamp_ms = i as u32;
    tx
}

#[test]
fn test_fill_then_one_more_overflows_once() {
    let queue = TransactionQueue::<N>::new();

    for i in 0..(N - 1) as u8 {
        assert!(queue.try_push(&numbered(i)));
    }
    assert_eq!(queue.len(), N - 1);
    assert_eq!(queue.overflows(), 0);

    // One slot is always kept empty
    assert!(!queue.try_push(&numbered(99)));
    assert_eq!(queue.overflows(), 1);

    for i in 0..(N - 1) as u8 {
        assert_eq!(queue.try_pop().unwrap().timestamp_ms, i as u32);
    }
    assert!(queue.try_pop().is_none());
}

#[test]
fn test_push_n_plus_one_keeps_first_n_minus_one() {
    let queue = TransactionQueue::<N>::new();

    let accepted = (0..=N as u8).filter(|&i| queue.try_push(&numbered(i))).count();

    assert_eq!(accepted, N - 1);
    assert_eq!(queue.overflows(), 2);
    assert_eq!(queue.pushed(), (N - 1) as u32);

    let drained: Vec<u8> = std::iter::from_fn(|| queue.try_pop())
        .map(|tx| tx.data()[0])
        .collect();
    assert_eq!(drained, (0..(N - 1) as u8).collect::<Vec<_>>());
}

#[test]
fn test_pop_empty() {
    let queue = TransactionQueue::<N>::new();
    assert!(queue.try_pop().is_none());
    assert!(queue.is_empty());
    assert_eq!(queue.capacity(), N - 1);
}

#[test]
fn test_space_reclaimed_after_pop() {
    let queue = TransactionQueue::<N>::new();
    for i in 0..(N - 1) as u8 {
        queue.try_push(&numbered(i));
    }

    assert_eq!(queue.try_pop().unwrap().timestamp_ms, 0);
    assert!(queue.try_push(&numbered(50)));
    assert!(!queue.try_push(&numbered(51)));

    let last = std::iter::from_fn(|| queue.try_pop()).last().unwrap();
    assert_eq!(last.timestamp_ms, 50);
}
