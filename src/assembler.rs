//! Transaction assembler.
//!
//! Owns the single in-progress [`Transaction`] while a frame is open.
//! The decoder feeds it completed bytes and acknowledge bits; on STOP the
//! record is handed out by value and the assembler is empty again.

use crate::transaction::{Direction, Transaction};

/// Builds one transaction at a time.
#[derive(Debug)]
pub struct TransactionAssembler {
    current: Transaction,
    open: bool,
}

impl TransactionAssembler {
    pub const fn new() -> Self {
        Self {
            current: Transaction::EMPTY,
            open: false,
        }
    }

    /// Start a fresh record stamped with `timestamp_ms`.
    ///
    /// Any record still open is discarded.
    #[inline]
    pub fn open(&mut self, timestamp_ms: u32) {
        self.current = Transaction::new(timestamp_ms);
        self.open = true;
    }

    /// Add a completed byte.
    ///
    /// The first byte of a frame carries the 7-bit address and the R/W bit;
    /// later bytes are data. Returns `false` if a data byte was dropped at
    /// the length bound.
    #[inline]
    pub fn append_byte(&mut self, byte: u8, is_first: bool) -> bool {
        if is_first {
            self.current.address = byte >> 1;
            self.current.direction = Direction::from_rw_bit(byte);
            true
        } else {
            self.current.push_data(byte)
        }
    }

    /// Record the acknowledge bit of the byte just completed.
    ///
    /// Overwritten per byte, so the finished record holds the last one.
    #[inline]
    pub fn set_ack(&mut self, nack: bool) {
        self.current.nack = nack;
    }

    /// Hand out the finished record, leaving the assembler empty.
    ///
    /// Returns `None` if no record was open.
    #[inline]
    pub fn finalize(&mut self) -> Option<Transaction> {
        if !self.open {
            return None;
        }
        self.open = false;
        Some(self.current)
    }

    /// Drop the open record without handing it out.
    #[inline]
    pub fn abandon(&mut self) {
        self.open = false;
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The record being built (only meaningful while open).
    #[inline]
    pub fn current(&self) -> &Transaction {
        &self.current
    }
}

impl Default for TransactionAssembler {
    fn default() -> Self {
        Self::new()
    }
}
