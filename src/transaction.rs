//! Module: transaction
//!
//! Purpose: The decoded unit of bus traffic. One `Transaction` covers
//! everything between a START and the matching STOP condition.
//!
//! Architecture:
//! - Fixed-size, `Copy` record so queue slots are pre-allocated
//! - Data bytes beyond `MAX_DATA_LEN` are counted, not stored
//! - Immutable once handed to the queue
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

use crate::config::MAX_DATA_LEN;

/// Transfer direction, taken from bit 0 of the address byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Bit 0 clear: controller writes to target.
    Write,
    /// Bit 0 set: controller reads from target.
    Read,
}

impl Direction {
    /// Decode from the R/W bit of an address byte.
    #[inline]
    pub const fn from_rw_bit(byte: u8) -> Self {
        if byte & 0x01 != 0 {
            Direction::Read
        } else {
            Direction::Write
        }
    }

    /// Single-letter tag used in the report line.
    #[inline]
    pub const fn tag(self) -> char {
        match self {
            Direction::Write => 'W',
            Direction::Read => 'R',
        }
    }

    #[inline]
    pub const fn is_read(self) -> bool {
        matches!(self, Direction::Read)
    }
}

/// One decoded bus exchange.
///
/// Size is dominated by the inline data array; the queue holds these by
/// value, so nothing here may point at heap memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Time source reading (ms) when the START was seen.
    pub timestamp_ms: u32,

    /// 7-bit target address.
    pub address: u8,

    /// Read or write, from the low bit of the first byte.
    pub direction: Direction,

    /// True if the last acknowledge bit before STOP was a NACK.
    pub nack: bool,

    /// Data bytes that arrived after the buffer was full.
    pub dropped_bytes: u16,

    len: u8,
    data: [u8; MAX_DATA_LEN],
}

impl Transaction {
    /// An empty transaction: address 0, write, no data, acknowledged.
    pub const EMPTY: Self = Self {
        timestamp_ms: 0,
        address: 0,
        direction: Direction::Write,
        nack: false,
        dropped_bytes: 0,
        len: 0,
        data: [0; MAX_DATA_LEN],
    };

    /// Create an empty transaction stamped with `timestamp_ms`.
    pub const fn new(timestamp_ms: u32) -> Self {
        let mut tx = Self::EMPTY;
        tx.timestamp_ms = timestamp_ms;
        tx
    }

    /// Build a transaction from known fields. Excess data is dropped and
    /// counted exactly as the decoder would.
    pub fn with_data(address: u8, direction: Direction, data: &[u8], nack: bool) -> Self {
        let mut tx = Self::EMPTY;
        tx.address = address & 0x7F;
        tx.direction = direction;
        tx.nack = nack;
        for &byte in data {
            tx.push_data(byte);
        }
        tx
    }

    /// Stored data bytes, in arrival order.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Number of stored data bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if any data byte was dropped at the length bound.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.dropped_bytes > 0
    }

    /// The address byte as it appeared on the wire (address + R/W bit).
    #[inline]
    pub fn address_byte(&self) -> u8 {
        (self.address << 1) | self.direction.is_read() as u8
    }

    /// Append a data byte, or count it as dropped once full.
    ///
    /// Returns `false` if the byte was dropped.
    #[inline]
    pub(crate) fn push_data(&mut self, byte: u8) -> bool {
        if (self.len as usize) < MAX_DATA_LEN {
            self.data[self.len as usize] = byte;
            self.len += 1;
            true
        } else {
            self.dropped_bytes = self.dropped_bytes.saturating_add(1);
            false
        }
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::EMPTY
    }
}
