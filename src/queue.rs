//! Lock-free SPSC (Single Producer, Single Consumer) transaction queue.
//!
//! This is the only channel between the edge-handling context and the
//! consumer loop. Every decoded transaction flows through here.
//!
//! # Architecture
//!
//! ```text
//! Edge ISR ──▶ ProtocolDecoder ──▶ TransactionQueue ──▶ CaptureConsumer
//!  (RT)                              (lock-free)          (best effort)
//! ```
//!
//! # Rules
//!
//! - Only atomic operations for synchronization
//! - `try_push` and `try_pop` never block and never allocate
//! - One slot is always left empty, so a full queue holds `N - 1` items
//! - A push into a full queue drops the NEW transaction and counts it

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::DEFAULT_QUEUE_SIZE;
use crate::transaction::Transaction;

/// Fixed-capacity ring of transactions.
///
/// # Safety
///
/// This type uses `UnsafeCell` internally but is safe to use because:
/// - Single producer (the decoder) owns `head` and the slot at `head`
/// - Single consumer owns `tail` and the slot at `tail`
/// - A slot is published only after it is fully written (`Release` on `head`)
/// - A slot is recycled only after it is fully read (`Release` on `tail`)
///
/// # Memory Ordering
///
/// - Producer stores `head` with `Release`, consumer loads it with `Acquire`
/// - Consumer stores `tail` with `Release`, producer loads it with `Acquire`
pub struct TransactionQueue<const N: usize = DEFAULT_QUEUE_SIZE> {
    /// Ring slots, one cell each so producer and consumer never alias.
    slots: [UnsafeCell<Transaction>; N],

    /// Next slot the producer writes.
    head: AtomicU32,

    /// Next slot the consumer reads.
    tail: AtomicU32,

    /// Transactions accepted since the last reset.
    pushed: AtomicU32,

    /// Transactions dropped because the ring was full.
    overflows: AtomicU32,
}

// SAFETY: One producer, one consumer, atomic coordination on distinct slots.
unsafe impl<const N: usize> Sync for TransactionQueue<N> {}
unsafe impl<const N: usize> Send for TransactionQueue<N> {}

impl<const N: usize> TransactionQueue<N> {
    /// Mask for wrapping index to buffer size.
    const MASK: u32 = (N as u32).wrapping_sub(1);

    /// Create a new empty queue.
    ///
    /// # Panics
    ///
    /// Panics at compile time if N is not a power of 2 or is smaller than 2.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Queue size must be power of 2");
        assert!(N >= 2, "Queue needs at least one usable slot");

        const EMPTY_SLOT: UnsafeCell<Transaction> = UnsafeCell::new(Transaction::EMPTY);

        Self {
            slots: [EMPTY_SLOT; N],
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            pushed: AtomicU32::new(0),
            overflows: AtomicU32::new(0),
        }
    }

    /// Enqueue a finished transaction (producer side).
    ///
    /// Returns `false` if the queue is full; the transaction is dropped and
    /// the overflow counter incremented. Callers must not retry.
    ///
    /// # Timing
    ///
    /// O(1), one slot copy. Never blocks, never allocates.
    #[inline]
    pub fn try_push(&self, tx: &Transaction) -> bool {
        // Only the producer writes head
        let head = self.head.load(Ordering::Relaxed);
        let next = head.wrapping_add(1) & Self::MASK;

        if next == self.tail.load(Ordering::Acquire) {
            self.overflows.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: Slot `head` is not visible to the consumer until the
        // Release store below.
        unsafe {
            *self.slots[head as usize].get() = *tx;
        }

        self.head.store(next, Ordering::Release);
        self.pushed.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Dequeue the oldest transaction (consumer side).
    ///
    /// Returns `None` if the queue is empty.
    #[inline]
    pub fn try_pop(&self) -> Option<Transaction> {
        // Only the consumer writes tail
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: Slot `tail` was published by the producer's Release store
        // and will not be rewritten until tail moves past it.
        let tx = unsafe { *self.slots[tail as usize].get() };

        self.tail.store(tail.wrapping_add(1) & Self::MASK, Ordering::Release);
        Some(tx)
    }

    /// Discard everything queued and zero the counters (consumer side).
    ///
    /// Only the consumer cursor moves: it jumps to the producer cursor, so a
    /// push racing with the reset is either discarded or kept whole.
    pub fn reset(&self) {
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
        self.pushed.store(0, Ordering::Relaxed);
        self.overflows.store(0, Ordering::Relaxed);
    }

    /// Transactions waiting to be popped.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head.wrapping_sub(tail) & Self::MASK) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transactions accepted since the last reset.
    #[inline]
    pub fn pushed(&self) -> u32 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Transactions dropped on a full queue since the last reset.
    #[inline]
    pub fn overflows(&self) -> u32 {
        self.overflows.load(Ordering::Relaxed)
    }

    /// Usable capacity (`N - 1`).
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }
}

impl<const N: usize> Default for TransactionQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
