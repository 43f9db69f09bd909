//! Non-fatal capture anomalies.
//!
//! Nothing seen on the bus is ever fatal. Malformed sequences are absorbed
//! by the decoder state machine and counted here, so the consumer can
//! report them without the edge handlers ever stopping.
//!
//! Queue overflow is counted by [`TransactionQueue`](crate::queue::TransactionQueue)
//! itself, next to the slot that could not be written.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Kinds of anomaly the decoder absorbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Anomaly {
    /// Nothing recorded yet.
    None = 0,

    /// A transaction carried more data bytes than fit; extras were dropped.
    Truncated = 1,

    /// STOP condition while no frame was open.
    SpuriousStop = 2,

    /// START condition inside an open frame (repeated start).
    RepeatedStart = 3,

    /// Frame left open across a pause and discarded on resume.
    AbandonedFrame = 4,
}

impl Anomaly {
    /// Number of countable kinds (excludes `None`).
    pub const COUNT: usize = 4;

    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Anomaly::Truncated,
            2 => Anomaly::SpuriousStop,
            3 => Anomaly::RepeatedStart,
            4 => Anomaly::AbandonedFrame,
            _ => Anomaly::None,
        }
    }

    /// Short label for reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Anomaly::None => "none",
            Anomaly::Truncated => "truncated",
            Anomaly::SpuriousStop => "spurious stop",
            Anomaly::RepeatedStart => "repeated start",
            Anomaly::AbandonedFrame => "abandoned frame",
        }
    }

    #[inline]
    fn slot(self) -> Option<usize> {
        match self {
            Anomaly::None => None,
            other => Some(other as usize - 1),
        }
    }
}

/// Lock-free anomaly counters.
///
/// Written by the edge handlers, read and reset by the consumer.
pub struct AnomalyCounters {
    /// Most recent anomaly code.
    last: AtomicU8,

    /// One counter per `Anomaly` kind.
    counts: [AtomicU32; Anomaly::COUNT],
}

impl AnomalyCounters {
    /// Create zeroed counters.
    pub const fn new() -> Self {
        const ZERO: AtomicU32 = AtomicU32::new(0);
        Self {
            last: AtomicU8::new(Anomaly::None as u8),
            counts: [ZERO; Anomaly::COUNT],
        }
    }

    /// Record one occurrence.
    #[inline]
    pub fn record(&self, anomaly: Anomaly) {
        if let Some(slot) = anomaly.slot() {
            self.counts[slot].fetch_add(1, Ordering::Relaxed);
            self.last.store(anomaly as u8, Ordering::Release);
        }
    }

    /// Occurrences since the last reset.
    #[inline]
    pub fn count(&self, anomaly: Anomaly) -> u32 {
        anomaly
            .slot()
            .map_or(0, |slot| self.counts[slot].load(Ordering::Relaxed))
    }

    /// Most recently recorded kind.
    #[inline]
    pub fn last(&self) -> Anomaly {
        Anomaly::from_u8(self.last.load(Ordering::Acquire))
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for count in &self.counts {
            count.store(0, Ordering::Relaxed);
        }
        self.last.store(Anomaly::None as u8, Ordering::Release);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> AnomalySnapshot {
        AnomalySnapshot {
            last: self.last(),
            truncated: self.count(Anomaly::Truncated),
            spurious_stops: self.count(Anomaly::SpuriousStop),
            repeated_starts: self.count(Anomaly::RepeatedStart),
            abandoned_frames: self.count(Anomaly::AbandonedFrame),
        }
    }
}

impl Default for AnomalyCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Anomaly counters at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnomalySnapshot {
    pub last: Anomaly,
    pub truncated: u32,
    pub spurious_stops: u32,
    pub repeated_starts: u32,
    pub abandoned_frames: u32,
}

impl Default for Anomaly {
    fn default() -> Self {
        Anomaly::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_basic() {
        let counters = AnomalyCounters::new();
        assert_eq!(counters.last(), Anomaly::None);

        counters.record(Anomaly::SpuriousStop);
        counters.record(Anomaly::SpuriousStop);
        counters.record(Anomaly::Truncated);

        assert_eq!(counters.count(Anomaly::SpuriousStop), 2);
        assert_eq!(counters.count(Anomaly::Truncated), 1);
        assert_eq!(counters.count(Anomaly::RepeatedStart), 0);
        assert_eq!(counters.last(), Anomaly::Truncated);
    }

    #[test]
    fn test_recording_none_is_ignored() {
        let counters = AnomalyCounters::new();
        counters.record(Anomaly::None);
        assert_eq!(counters.snapshot(), AnomalySnapshot::default());
    }

    #[test]
    fn test_reset_clears_everything() {
        let counters = AnomalyCounters::new();
        counters.record(Anomaly::AbandonedFrame);
        counters.record(Anomaly::RepeatedStart);

        counters.reset();

        let snap = counters.snapshot();
        assert_eq!(snap, AnomalySnapshot::default());
    }

    #[test]
    fn test_from_u8_roundtrip() {
        for code in 0..=4u8 {
            assert_eq!(Anomaly::from_u8(code) as u8, code);
        }
        assert_eq!(Anomaly::from_u8(200), Anomaly::None);
    }
}
