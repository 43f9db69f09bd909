//! Consumer loop for RustI2cSniffer.
//!
//! Runs at ordinary priority. Each cycle drains whatever the decoder has
//! queued (bounded by the occupancy seen at the start of the cycle), renders
//! it, and serves the runtime controls.
//!
//! # Contract
//!
//! "I process when I can. I never block the producer."
//!
//! Never touches decoder state. Reset clears the queue and the counters but
//! a frame open in the decoder at that moment is left as is.

use core::fmt::Write;

use crate::anomaly::{AnomalyCounters, AnomalySnapshot};
use crate::config::{DEFAULT_QUEUE_SIZE, CONFIG};
use crate::control::CaptureControl;
use crate::hal::TimeSource;
use crate::logging::LogStream;
use crate::queue::TransactionQueue;
use crate::report::{self, Radix};
use crate::transaction::Transaction;

/// Run statistics at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Transactions delivered to the queue since reset.
    pub transactions: u32,
    /// Transactions dropped on a full queue since reset.
    pub overflows: u32,
    /// Milliseconds since reset (or start-up).
    pub elapsed_ms: u32,
    /// Transaction lines the output refused since reset.
    pub render_errors: u32,
    pub anomalies: AnomalySnapshot,
}

impl StatsSnapshot {
    /// Whole seconds elapsed.
    #[inline]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_ms / 1000
    }

    /// Transactions per elapsed second, zero before the first full second.
    pub fn rate(&self) -> f32 {
        match self.elapsed_secs() {
            0 => 0.0,
            secs => self.transactions as f32 / secs as f32,
        }
    }
}

/// Best-effort consumer of decoded transactions.
///
/// # Example
///
/// ```ignore
/// static QUEUE: TransactionQueue = TransactionQueue::new();
/// static CONTROL: CaptureControl = CaptureControl::new();
/// static ANOMALIES: AnomalyCounters = AnomalyCounters::new();
///
/// let mut consumer = CaptureConsumer::new(&QUEUE, &CONTROL, &ANOMALIES, &CLOCK);
///
/// loop {
///     consumer.poll(&mut serial);
///     delay_ms(10);
/// }
/// ```
pub struct CaptureConsumer<'a, T: TimeSource, const N: usize = DEFAULT_QUEUE_SIZE> {
    queue: &'a TransactionQueue<N>,
    control: &'a CaptureControl,
    anomalies: &'a AnomalyCounters,
    clock: &'a T,
    log: Option<&'a LogStream>,
    start_ms: u32,
    radix: Radix,
    render_errors: u32,
}

impl<'a, T: TimeSource, const N: usize> CaptureConsumer<'a, T, N> {
    /// Create a consumer; the run clock starts now.
    pub fn new(
        queue: &'a TransactionQueue<N>,
        control: &'a CaptureControl,
        anomalies: &'a AnomalyCounters,
        clock: &'a T,
    ) -> Self {
        Self {
            queue,
            control,
            anomalies,
            clock,
            log: None,
            start_ms: clock.now_ms(),
            radix: CONFIG.default_radix,
            render_errors: 0,
        }
    }

    /// Send diagnostics to `log`. Must be a stream only this context pushes to.
    pub fn with_log(mut self, log: &'a LogStream) -> Self {
        self.log = Some(log);
        self
    }

    /// One consumer cycle: render every transaction queued right now.
    ///
    /// Returns the number of transactions written. A line the output
    /// refuses is counted in [`StatsSnapshot::render_errors`] and logged.
    pub fn poll(&mut self, out: &mut dyn Write) -> usize {
        let start_ms = self.start_ms;
        let radix = self.radix;
        let mut written = 0;
        let mut failed = 0u32;

        for tx in self.drain() {
            match report::write_transaction(out, &tx, start_ms, radix) {
                Ok(()) => written += 1,
                Err(_) => failed += 1,
            }
        }

        if failed > 0 {
            self.render_errors = self.render_errors.saturating_add(failed);
            if let Some(log) = self.log {
                crate::rt_warn!(log, self.clock.now_ms(), "output failed, {} lines lost", failed);
            }
        }
        written
    }

    /// Pop transactions queued at the time of the call.
    ///
    /// Stops after the current occupancy even if the producer keeps
    /// pushing, so one cycle cannot starve the rest of the loop.
    pub fn drain(&mut self) -> DrainIterator<'_, N> {
        DrainIterator {
            queue: self.queue,
            remaining: self.queue.len(),
        }
    }

    /// Clear the queue and statistics and restart the run clock.
    pub fn reset(&mut self) {
        self.queue.reset();
        self.anomalies.reset();
        self.render_errors = 0;
        self.start_ms = self.clock.now_ms();

        if let Some(log) = self.log {
            crate::rt_info!(log, self.start_ms, "capture reset");
        }
    }

    /// Suspend capture.
    pub fn pause(&mut self) {
        self.control.pause();
        self.log_capture_state();
    }

    /// Resume capture. A frame left open by the pause is discarded.
    pub fn resume(&mut self) {
        self.control.resume();
        self.log_capture_state();
    }

    /// Flip pause state; returns `true` if now paused.
    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.control.toggle_pause();
        self.log_capture_state();
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    /// Statistics as of now.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            transactions: self.queue.pushed(),
            overflows: self.queue.overflows(),
            elapsed_ms: self.clock.now_ms().wrapping_sub(self.start_ms),
            render_errors: self.render_errors,
            anomalies: self.anomalies.snapshot(),
        }
    }

    pub fn radix(&self) -> Radix {
        self.radix
    }

    pub fn set_radix(&mut self, radix: Radix) {
        self.radix = radix;
    }

    /// Flip hex/decimal; returns the new mode.
    pub fn toggle_radix(&mut self) -> Radix {
        self.radix = self.radix.toggled();
        self.radix
    }

    /// Time source reading taken at the last reset.
    pub fn start_ms(&self) -> u32 {
        self.start_ms
    }

    fn log_capture_state(&self) {
        if let Some(log) = self.log {
            let state = if self.control.is_paused() { "paused" } else { "running" };
            crate::rt_info!(log, self.clock.now_ms(), "capture {}", state);
        }
    }
}

/// Iterator over the transactions queued when it was created.
pub struct DrainIterator<'q, const N: usize> {
    queue: &'q TransactionQueue<N>,
    remaining: usize,
}

impl<'q, const N: usize> Iterator for DrainIterator<'q, N> {
    type Item = Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.queue.try_pop()
    }
}
