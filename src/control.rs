//! Capture gate shared between the edge handlers and the consumer loop.
//!
//! The gate is checked at the very top of both edge handlers, before any
//! decoder state is touched. Resuming bumps an epoch so the decoder can
//! abandon a frame that straddled the pause.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Pause/resume switch for capture.
///
/// # Usage
///
/// ```ignore
/// static CONTROL: CaptureControl = CaptureControl::new();
///
/// // In edge handler:
/// if CONTROL.is_paused() {
///     return;
/// }
///
/// // In console:
/// CONTROL.toggle_pause();
/// ```
pub struct CaptureControl {
    /// True while capture is suspended.
    paused: AtomicBool,

    /// Incremented on every pause -> running transition.
    epoch: AtomicU32,
}

impl CaptureControl {
    /// Create a running (unpaused) gate.
    pub const fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            epoch: AtomicU32::new(0),
        }
    }

    /// Check if capture is suspended.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Resume epoch. Changes each time capture resumes.
    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Suspend capture. No effect if already paused.
    #[inline]
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume capture. No effect if already running.
    #[inline]
    pub fn resume(&self) {
        // Epoch first: an edge that sees `paused == false` must also see
        // the new epoch.
        if self.is_paused() {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            self.paused.store(false, Ordering::Release);
        }
    }

    /// Flip between paused and running.
    ///
    /// Returns `true` if capture is now paused.
    pub fn toggle_pause(&self) -> bool {
        if self.is_paused() {
            self.resume();
            false
        } else {
            self.pause();
            true
        }
    }
}

impl Default for CaptureControl {
    fn default() -> Self {
        Self::new()
    }
}
