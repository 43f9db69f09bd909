//! Edge-driven I2C protocol decoder.
//!
//! Pure logic, no hardware dependencies. Consumes edge notifications plus
//! synchronous line reads, produces finished transactions into the queue.
//! Fully testable on host.
//!
//! # Edge handling
//!
//! | Edge                     | SCL  | Meaning                         |
//! |--------------------------|------|---------------------------------|
//! | SDA falls                | high | START (or repeated START)       |
//! | SDA rises                | high | STOP                            |
//! | SDA changes              | low  | data setup, ignored             |
//! | SCL rises                | -    | sample SDA as data or ACK bit   |
//!
//! # Known limitation
//!
//! There is no timeout on an open frame. If SCL never rises again the
//! decoder stays parked in the open frame until the next START or STOP.
//! This matches passive observation: the sniffer never drives the bus.

use crate::anomaly::{Anomaly, AnomalyCounters};
use crate::assembler::TransactionAssembler;
use crate::config::DEFAULT_QUEUE_SIZE;
use crate::control::CaptureControl;
use crate::hal::{BusLines, TimeSource};
use crate::logging::LogStream;
use crate::queue::TransactionQueue;
use crate::transaction::Transaction;

/// Decoder phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Bus idle, waiting for START. Clock edges are ignored.
    Idle,
    /// Inside a frame, shifting in data bits.
    FrameOpen,
    /// Eight bits in, next clock edge is the ACK/NACK bit.
    AckWait,
}

/// Edge notification kinds delivered by the signal source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// SCL went high.
    ClockRising,
    /// SDA changed level (either direction).
    DataChanged,
}

/// I2C decoder state machine.
///
/// Owned exclusively by the edge-handling context. Shares only the queue,
/// the capture gate and the anomaly counters with the consumer.
///
/// # Example
///
/// ```
/// use rust_i2c_sniffer::anomaly::AnomalyCounters;
/// use rust_i2c_sniffer::control::CaptureControl;
/// use rust_i2c_sniffer::decoder::ProtocolDecoder;
/// use rust_i2c_sniffer::hal::ManualClock;
/// use rust_i2c_sniffer::queue::TransactionQueue;
///
/// let queue = TransactionQueue::<16>::new();
/// let control = CaptureControl::new();
/// let anomalies = AnomalyCounters::new();
/// let clock = ManualClock::new(0);
///
/// let decoder = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);
/// assert!(!decoder.is_frame_open());
/// ```
pub struct ProtocolDecoder<'a, T: TimeSource, const N: usize = DEFAULT_QUEUE_SIZE> {
    queue: &'a TransactionQueue<N>,
    control: &'a CaptureControl,
    anomalies: &'a AnomalyCounters,
    clock: &'a T,
    log: Option<&'a LogStream>,

    phase: Phase,
    /// Bits shifted into `current_byte` (0-8).
    bit_count: u8,
    /// Byte being assembled, MSB first.
    current_byte: u8,
    /// Completed bytes in this frame, address byte included.
    bytes_in_frame: u16,
    /// Capture epoch this state belongs to.
    epoch: u32,
    assembler: TransactionAssembler,
}

impl<'a, T: TimeSource, const N: usize> ProtocolDecoder<'a, T, N> {
    /// Create an idle decoder.
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
            phase: Phase::Idle,
            bit_count: 0,
            current_byte: 0,
            bytes_in_frame: 0,
            epoch: control.epoch(),
            assembler: TransactionAssembler::new(),
        }
    }

    /// Send diagnostics to `log`. Must be a stream only this context pushes to.
    pub fn with_log(mut self, log: &'a LogStream) -> Self {
        self.log = Some(log);
        self
    }

    /// Dispatch an edge notification.
    #[inline]
    pub fn on_edge(&mut self, edge: Edge, lines: &impl BusLines) {
        match edge {
            Edge::ClockRising => self.on_clock_rising(lines),
            Edge::DataChanged => self.on_data_change(lines),
        }
    }

    /// SCL rising edge handler.
    ///
    /// SDA is read here, at the moment the clock edge is handled.
    ///
    /// # Timing
    ///
    /// O(1), no allocation, never blocks.
    #[inline]
    pub fn on_clock_rising(&mut self, lines: &impl BusLines) {
        if !self.gate() {
            return;
        }

        let sda = lines.sda();

        match self.phase {
            Phase::Idle => {}
            Phase::FrameOpen => {
                self.current_byte = (self.current_byte << 1) | sda as u8;
                self.bit_count += 1;
                if self.bit_count == 8 {
                    self.phase = Phase::AckWait;
                }
            }
            Phase::AckWait => self.complete_byte(sda),
        }
    }

    /// SDA change handler.
    ///
    /// Only transitions while SCL is high are framing conditions.
    #[inline]
    pub fn on_data_change(&mut self, lines: &impl BusLines) {
        if !self.gate() {
            return;
        }

        if !lines.scl() {
            return;
        }

        if lines.sda() {
            self.stop_condition();
        } else {
            self.start_condition();
        }
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True between START and STOP.
    #[inline]
    pub fn is_frame_open(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Bits collected for the byte in progress.
    #[inline]
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    /// The record being built, if a frame is open.
    #[inline]
    pub fn open_transaction(&self) -> Option<&Transaction> {
        self.assembler.is_open().then(|| self.assembler.current())
    }

    /// Pause gate plus resume-epoch check.
    ///
    /// Returns `false` if the edge must be ignored.
    #[inline]
    fn gate(&mut self) -> bool {
        if self.control.is_paused() {
            return false;
        }

        let epoch = self.control.epoch();
        if epoch != self.epoch {
            self.epoch = epoch;
            if self.is_frame_open() {
                self.anomalies.record(Anomaly::AbandonedFrame);
                self.assembler.abandon();
                self.phase = Phase::Idle;
            }
        }
        true
    }

    fn start_condition(&mut self) {
        if self.phase == Phase::Idle {
            self.assembler.open(self.clock.now_ms());
            self.bytes_in_frame = 0;
        } else {
            // Repeated start: the record stays open, only byte framing restarts.
            self.anomalies.record(Anomaly::RepeatedStart);
            if let Some(log) = self.log {
                crate::rt_trace!(log, self.clock.now_ms(), "repeated start after {} bytes", self.bytes_in_frame);
            }
        }

        self.phase = Phase::FrameOpen;
        self.bit_count = 0;
        self.current_byte = 0;
    }

    fn stop_condition(&mut self) {
        if self.phase == Phase::Idle {
            self.anomalies.record(Anomaly::SpuriousStop);
            return;
        }

        self.phase = Phase::Idle;
        self.bit_count = 0;
        self.current_byte = 0;

        let Some(tx) = self.assembler.finalize() else {
            return;
        };

        if tx.is_truncated() {
            self.anomalies.record(Anomaly::Truncated);
            if let Some(log) = self.log {
                crate::rt_debug!(log, self.clock.now_ms(), "0x{:02X}: {} bytes dropped", tx.address, tx.dropped_bytes);
            }
        }

        if !self.queue.try_push(&tx) {
            if let Some(log) = self.log {
                crate::rt_warn!(log, self.clock.now_ms(), "queue full, dropped 0x{:02X} ({} total)", tx.address, self.queue.overflows());
            }
        }
    }

    /// Ninth clock: latch the byte and its acknowledge bit.
    fn complete_byte(&mut self, sda: bool) {
        let is_first = self.bytes_in_frame == 0;
        self.assembler.append_byte(self.current_byte, is_first);
        // SDA high on the ninth clock = NACK
        self.assembler.set_ack(sda);

        self.bytes_in_frame = self.bytes_in_frame.saturating_add(1);
        self.phase = Phase::FrameOpen;
        self.bit_count = 0;
        self.current_byte = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::ManualClock;

    struct Lines {
        scl: bool,
        sda: bool,
    }

    impl BusLines for Lines {
        fn scl(&self) -> bool {
            self.scl
        }
        fn sda(&self) -> bool {
            self.sda
        }
    }

    fn lines(scl: bool, sda: bool) -> Lines {
        Lines { scl, sda }
    }

    #[test]
    fn test_start_opens_frame() {
        let queue = TransactionQueue::<8>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(42);
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);

        dec.on_data_change(&lines(true, false));
        assert_eq!(dec.phase(), Phase::FrameOpen);
        assert_eq!(dec.open_transaction().unwrap().timestamp_ms, 42);
    }

    #[test]
    fn test_data_change_with_clock_low_ignored() {
        let queue = TransactionQueue::<8>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(0);
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);

        dec.on_data_change(&lines(false, false));
        dec.on_data_change(&lines(false, true));
        assert_eq!(dec.phase(), Phase::Idle);
        assert_eq!(anomalies.count(Anomaly::SpuriousStop), 0);
    }

    #[test]
    fn test_clock_ignored_while_idle() {
        let queue = TransactionQueue::<8>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(0);
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);

        for _ in 0..20 {
            dec.on_clock_rising(&lines(true, true));
        }
        assert_eq!(dec.phase(), Phase::Idle);
        assert_eq!(dec.bit_count(), 0);
    }

    #[test]
    fn test_eight_bits_then_ack_wait() {
        let queue = TransactionQueue::<8>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(0);
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);

        dec.on_data_change(&lines(true, false));
        for i in 0..8 {
            assert_eq!(dec.phase(), Phase::FrameOpen);
            dec.on_edge(Edge::ClockRising, &lines(true, i % 2 == 0));
        }
        assert_eq!(dec.phase(), Phase::AckWait);

        dec.on_clock_rising(&lines(true, false));
        assert_eq!(dec.phase(), Phase::FrameOpen);
        assert_eq!(dec.bit_count(), 0);

        // 0b1010_1010 -> address 0x55, write
        let open = dec.open_transaction().unwrap();
        assert_eq!(open.address, 0x55);
        assert!(!open.nack);
    }

    #[test]
    fn test_stop_pushes_and_idles() {
        let queue = TransactionQueue::<8>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(0);
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);

        dec.on_data_change(&lines(true, false));
        dec.on_data_change(&lines(true, true));

        assert_eq!(dec.phase(), Phase::Idle);
        assert!(dec.open_transaction().is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_spurious_stop_counted() {
        let queue = TransactionQueue::<8>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(0);
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);

        dec.on_data_change(&lines(true, true));
        assert_eq!(dec.phase(), Phase::Idle);
        assert!(queue.is_empty());
        assert_eq!(anomalies.count(Anomaly::SpuriousStop), 1);
    }

    #[test]
    fn test_overflow_logged() {
        let queue = TransactionQueue::<2>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(0);
        let log = LogStream::new();
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock).with_log(&log);

        // Capacity 1: second frame overflows
        for _ in 0..2 {
            dec.on_data_change(&lines(true, false));
            dec.on_data_change(&lines(true, true));
        }

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.overflows(), 1);

        let entry = log.drain().unwrap();
        assert_eq!(entry.level, crate::logging::LogLevel::Warn);
        assert!(entry.message().starts_with("queue full"));
    }
}
