//! Hardware Abstraction Layer for RustI2cSniffer.
//!
//! Two seams separate the decoder from the board:
//! - [`BusLines`]: synchronous level reads of SCL and SDA
//! - [`TimeSource`]: monotonic millisecond counter
//!
//! Business logic stays in core modules, HAL is just I/O.

use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
pub mod esp;

/// Current levels of the two bus lines.
///
/// Implementations must read the physical line at call time. The decoder
/// samples SDA inside the SCL edge handler and must not see a cached value.
pub trait BusLines {
    /// Clock line level (`true` = high / released).
    fn scl(&self) -> bool;

    /// Data line level (`true` = high / released).
    fn sda(&self) -> bool;
}

/// Monotonic millisecond clock. Wraps at `u32::MAX`.
pub trait TimeSource {
    fn now_ms(&self) -> u32;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    #[inline]
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Settable clock for host tests and simulation.
///
/// Shared by reference between producer and consumer, so it is atomic.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub const fn new(start_ms: u32) -> Self {
        Self {
            now: AtomicU32::new(start_ms),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Release);
    }

    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::AcqRel);
    }
}

impl TimeSource for ManualClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Acquire)
    }
}
