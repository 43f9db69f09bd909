//! Synthetic bus driver.
//!
//! Plays the role of the signal source on the host: holds two line levels,
//! and every level change that would raise a GPIO interrupt is delivered to
//! the decoder as the matching edge notification.
//!
//! Used by the tests and by the host build of the binary.

use crate::decoder::{Edge, ProtocolDecoder};
use crate::hal::{BusLines, TimeSource};
use crate::transaction::Transaction;

/// Two line levels, readable through [`BusLines`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimBus {
    pub scl: bool,
    pub sda: bool,
}

impl SimBus {
    /// Both lines released (pulled high).
    pub const IDLE: Self = Self { scl: true, sda: true };
}

impl Default for SimBus {
    fn default() -> Self {
        Self::IDLE
    }
}

impl BusLines for SimBus {
    #[inline]
    fn scl(&self) -> bool {
        self.scl
    }

    #[inline]
    fn sda(&self) -> bool {
        self.sda
    }
}

/// Drives a decoder the way a controller on a real bus would.
///
/// Interrupt wiring matches the firmware: rising edges on SCL, both edges
/// on SDA.
pub struct BusDriver<'d, 'a, T: TimeSource, const N: usize> {
    bus: SimBus,
    decoder: &'d mut ProtocolDecoder<'a, T, N>,
}

impl<'d, 'a, T: TimeSource, const N: usize> BusDriver<'d, 'a, T, N> {
    /// Start with an idle bus.
    pub fn new(decoder: &'d mut ProtocolDecoder<'a, T, N>) -> Self {
        Self {
            bus: SimBus::IDLE,
            decoder,
        }
    }

    /// Current line levels.
    pub fn bus(&self) -> SimBus {
        self.bus
    }

    /// Access the driven decoder.
    pub fn decoder(&self) -> &ProtocolDecoder<'a, T, N> {
        self.decoder
    }

    /// Set SCL, notifying on a rising edge.
    pub fn set_scl(&mut self, level: bool) {
        if self.bus.scl == level {
            return;
        }
        self.bus.scl = level;
        if level {
            self.decoder.on_edge(Edge::ClockRising, &self.bus);
        }
    }

    /// Set SDA, notifying on any change.
    pub fn set_sda(&mut self, level: bool) {
        if self.bus.sda == level {
            return;
        }
        self.bus.sda = level;
        self.decoder.on_edge(Edge::DataChanged, &self.bus);
    }

    /// START from idle: SDA falls while SCL is high, then SCL low.
    pub fn start(&mut self) {
        self.set_sda(true);
        self.set_scl(true);
        self.set_sda(false);
        self.set_scl(false);
    }

    /// Repeated START from inside a frame (SCL low on entry).
    pub fn repeated_start(&mut self) {
        self.set_scl(false);
        self.set_sda(true);
        self.set_scl(true);
        self.set_sda(false);
        self.set_scl(false);
    }

    /// STOP: SDA rises while SCL is high. Leaves the bus idle.
    pub fn stop(&mut self) {
        self.set_scl(false);
        self.set_sda(false);
        self.set_scl(true);
        self.set_sda(true);
    }

    /// One bit: set SDA while SCL is low, then pulse SCL.
    pub fn bit(&mut self, level: bool) {
        self.set_scl(false);
        self.set_sda(level);
        self.set_scl(true);
        self.set_scl(false);
    }

    /// Eight data bits MSB first, then the acknowledge bit.
    pub fn byte(&mut self, value: u8, nack: bool) {
        for i in (0..8).rev() {
            self.bit(value & (1 << i) != 0);
        }
        self.bit(nack);
    }

    /// Raw clock pulses, e.g. for truncated frames.
    pub fn bits(&mut self, levels: &[bool]) {
        for &level in levels {
            self.bit(level);
        }
    }

    /// Play a complete transaction: START, address byte, data, STOP.
    ///
    /// Every byte is acknowledged except that the last one carries
    /// `tx.nack`. Dropped bytes are not replayed.
    pub fn transaction(&mut self, tx: &Transaction) {
        self.start();
        self.transaction_body(tx);
        self.stop();
    }

    /// Address and data bytes with acknowledge bits, no framing.
    pub fn transaction_body(&mut self, tx: &Transaction) {
        let data = tx.data();
        self.byte(tx.address_byte(), data.is_empty() && tx.nack);
        for (i, &value) in data.iter().enumerate() {
            let last = i + 1 == data.len();
            self.byte(value, last && tx.nack);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyCounters;
    use crate::control::CaptureControl;
    use crate::decoder::Phase;
    use crate::hal::ManualClock;
    use crate::queue::TransactionQueue;
    use crate::transaction::Direction;

    #[test]
    fn test_start_stop_leave_bus_idle() {
        let queue = TransactionQueue::<8>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(0);
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);
        let mut drv = BusDriver::new(&mut dec);

        drv.start();
        assert_eq!(drv.bus(), SimBus { scl: false, sda: false });
        assert_eq!(drv.decoder().phase(), Phase::FrameOpen);

        drv.stop();
        assert_eq!(drv.bus(), SimBus::IDLE);
        assert_eq!(drv.decoder().phase(), Phase::Idle);
    }

    #[test]
    fn test_transaction_replay() {
        let queue = TransactionQueue::<8>::new();
        let control = CaptureControl::new();
        let anomalies = AnomalyCounters::new();
        let clock = ManualClock::new(0);
        let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);

        let sent = Transaction::with_data(0x3C, Direction::Write, &[0x00, 0xAF], true);
        BusDriver::new(&mut dec).transaction(&sent);

        let got = queue.try_pop().unwrap();
        assert_eq!(got, sent);
    }
}
