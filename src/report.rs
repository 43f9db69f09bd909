//! Line-oriented rendering of transactions and statistics.
//!
//! Pure formatting into any `core::fmt::Write`. No protocol logic.
//!
//! ```text
//! [    1234] 0x52 R: FF [NACK]
//! [    1240]  82 W:   0 175
//! ```

use core::fmt::{self, Write};

use crate::consumer::StatsSnapshot;
use crate::transaction::Transaction;

/// Number rendering for address and data bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Radix {
    /// Two-digit zero-padded hexadecimal.
    Hex,
    /// Three-wide decimal.
    Decimal,
}

impl Radix {
    /// The other mode.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Radix::Hex => Radix::Decimal,
            Radix::Decimal => Radix::Hex,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Radix::Hex => "HEX",
            Radix::Decimal => "DECIMAL",
        }
    }
}

/// Milliseconds from `start_ms` to `timestamp_ms` on the wrapping counter.
///
/// A timestamp earlier than `start_ms` (frame opened before a reset) reads
/// as 0.
#[inline]
pub fn elapsed_since(start_ms: u32, timestamp_ms: u32) -> u32 {
    let elapsed = timestamp_ms.wrapping_sub(start_ms);
    if elapsed > i32::MAX as u32 {
        0
    } else {
        elapsed
    }
}

/// Write one transaction line, newline included.
///
/// The timestamp is shown relative to `start_ms`, see [`elapsed_since`].
pub fn write_transaction(
    out: &mut dyn Write,
    tx: &Transaction,
    start_ms: u32,
    radix: Radix,
) -> fmt::Result {
    write!(out, "[{:8}] ", elapsed_since(start_ms, tx.timestamp_ms))?;

    match radix {
        Radix::Hex => write!(out, "0x{:02X} ", tx.address)?,
        Radix::Decimal => write!(out, "{:3} ", tx.address)?,
    }

    write!(out, "{}: ", tx.direction.tag())?;

    for byte in tx.data() {
        match radix {
            Radix::Hex => write!(out, "{:02X} ", byte)?,
            Radix::Decimal => write!(out, "{:3} ", byte)?,
        }
    }

    if tx.nack {
        out.write_str("[NACK]")?;
    }

    writeln!(out)
}

/// Write the statistics block.
pub fn write_stats(out: &mut dyn Write, stats: &StatsSnapshot) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "--- Statistics ---")?;
    writeln!(out, "Transactions: {}", stats.transactions)?;
    writeln!(out, "Errors/overflows: {}", stats.overflows)?;
    writeln!(out, "Truncated: {}", stats.anomalies.truncated)?;
    writeln!(out, "Spurious stops: {}", stats.anomalies.spurious_stops)?;
    writeln!(out, "Repeated starts: {}", stats.anomalies.repeated_starts)?;
    writeln!(out, "Abandoned frames: {}", stats.anomalies.abandoned_frames)?;
    writeln!(out, "Last anomaly: {}", stats.anomalies.last.as_str())?;
    writeln!(out, "Output errors: {}", stats.render_errors)?;
    writeln!(out, "Runtime: {} seconds", stats.elapsed_secs())?;
    writeln!(out, "Avg rate: {:.1} tx/sec", stats.rate())?;
    writeln!(out, "------------------")?;
    writeln!(out)
}
