//! Decoder tests: synthetic bus traffic in, transactions out

use rust_i2c_sniffer::anomaly::{Anomaly, AnomalyCounters};
use rust_i2c_sniffer::config::MAX_DATA_LEN;
use rust_i2c_sniffer::control::CaptureControl;
use rust_i2c_sniffer::decoder::{Phase, ProtocolDecoder};
use rust_i2c_sniffer::hal::ManualClock;
use rust_i2c_sniffer::queue::TransactionQueue;
use rust_i2c_sniffer::sim::BusDriver;
use rust_i2c_sniffer::transaction::{Direction, Transaction};

struct Rig {
    queue: TransactionQueue<16>,
    control: CaptureControl,
    anomalies: AnomalyCounters,
    clock: ManualClock,
}

impl Rig {
    fn new() -> Self {
        Self {
            queue: TransactionQueue::new(),
            control: CaptureControl::new(),
            anomalies: AnomalyCounters::new(),
            clock: ManualClock::new(0),
        }
    }

    fn decoder(&self) -> ProtocolDecoder<'_, ManualClock, 16> {
        ProtocolDecoder::new(&self.queue, &self.control, &self.anomalies, &self.clock)
    }
}

fn payload(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i as u8).wrapping_mul(37).wrapping_add(5)).collect()
}

#[test]
fn test_example_read_with_nack() {
    let rig = Rig::new();
    let mut dec = rig.decoder();
    let mut bus = BusDriver::new(&mut dec);

    // 0xA5: address 0x52 with the read bit set
    bus.start();
    bus.byte(0xA5, false);
    bus.byte(0xFF, true);
    bus.stop();

    let tx = rig.queue.try_pop().unwrap();
    assert_eq!(tx.address, 0x52);
    assert_eq!(tx.direction, Direction::Read);
    assert_eq!(tx.data(), &[0xFF]);
    assert!(tx.nack);
    assert!(rig.queue.try_pop().is_none());
}

#[test]
fn test_address_byte_a4_is_write_to_0x52() {
    let rig = Rig::new();
    let mut dec = rig.decoder();
    let mut bus = BusDriver::new(&mut dec);

    bus.start();
    bus.byte(0xA4, false);
    bus.byte(0xFF, true);
    bus.stop();

    let tx = rig.queue.try_pop().unwrap();
    assert_eq!(tx.address, 0x52);
    assert_eq!(tx.direction, Direction::Write);
    assert_eq!(tx.data(), &[0xFF]);
    assert!(tx.nack);
}

#[test]
fn test_well_formed_frames_all_lengths() {
    for n in 0..=MAX_DATA_LEN {
        let rig = Rig::new();
        let mut dec = rig.decoder();
        let data = payload(n);
        let nack = n % 3 == 0;
        let direction = if n % 2 == 0 { Direction::Write } else { Direction::Read };
        let sent = Transaction::with_data(0x50 + (n as u8 % 8), direction, &data, nack);

        BusDriver::new(&mut dec).transaction(&sent);

        let got = rig.queue.try_pop().unwrap();
        assert_eq!(got.address, sent.address, "len {}", n);
        assert_eq!(got.direction, direction, "len {}", n);
        assert_eq!(got.data(), &data[..], "len {}", n);
        assert_eq!(got.nack, nack, "len {}", n);
        assert_eq!(got.dropped_bytes, 0, "len {}", n);
    }
}

#[test]
fn test_excess_bytes_truncated_at_bound() {
    let rig = Rig::new();
    let mut dec = rig.decoder();
    let data = payload(MAX_DATA_LEN + 5);

    {
        let mut bus = BusDriver::new(&mut dec);
        bus.start();
        bus.byte(0x20, false);
        for (i, &b) in data.iter().enumerate() {
            bus.byte(b, i + 1 == data.len());
        }
        bus.stop();
    }

    let tx = rig.queue.try_pop().unwrap();
    assert_eq!(tx.len(), MAX_DATA_LEN);
    assert_eq!(tx.data(), &data[..MAX_DATA_LEN]);
    assert_eq!(tx.dropped_bytes, 5);
    // Ack of the last byte on the wire, even though it was not stored
    assert!(tx.nack);
    assert_eq!(rig.anomalies.count(Anomaly::Truncated), 1);
}

#[test]
fn test_round_trip_bit_exact() {
    let rig = Rig::new();
    let mut dec = rig.decoder();
    let cases = [
        Transaction::with_data(0x00, Direction::Write, &[], false),
        Transaction::with_data(0x7F, Direction::Read, &[0x00, 0xFF, 0x80, 0x01], true),
        Transaction::with_data(0x2A, Direction::Write, &[0x55, 0xAA], false),
    ];

    {
        let mut bus = BusDriver::new(&mut dec);
        for tx in &cases {
            bus.transaction(tx);
        }
    }

    for sent in &cases {
        assert_eq!(&rig.queue.try_pop().unwrap(), sent);
    }
}

#[test]
fn test_timestamp_taken_at_start() {
    let rig = Rig::new();
    let mut dec = rig.decoder();
    let mut bus = BusDriver::new(&mut dec);

    rig.clock.set(1_000);
    bus.start();
    rig.clock.set(1_250);
    bus.byte(0x10, false);
    bus.stop();

    assert_eq!(rig.queue.try_pop().unwrap().timestamp_ms, 1_000);
}

#[test]
fn test_repeated_start_keeps_record_and_restarts_byte() {
    let rig = Rig::new();
    let mut dec = rig.decoder();

    {
        let mut bus = BusDriver::new(&mut dec);
        rig.clock.set(10);
        bus.start();
        bus.byte(0xA0, false); // 0x50 write
        bus.byte(0x12, false);
        // Half a byte, then repeated start
        bus.bits(&[true, false, true]);
        rig.clock.set(20);
        bus.repeated_start();
        bus.byte(0xA1, false);
        bus.byte(0x99, true);
        bus.stop();
    }

    // One record for the whole exchange; the partial byte is gone
    let tx = rig.queue.try_pop().unwrap();
    assert_eq!(tx.timestamp_ms, 10);
    assert_eq!(tx.address, 0x50);
    assert_eq!(tx.direction, Direction::Write);
    assert_eq!(tx.data(), &[0x12, 0xA1, 0x99]);
    assert!(tx.nack);
    assert!(rig.queue.try_pop().is_none());
    assert_eq!(rig.anomalies.count(Anomaly::RepeatedStart), 1);
}

#[test]
fn test_repeated_start_before_address_complete() {
    let rig = Rig::new();
    let mut dec = rig.decoder();

    {
        let mut bus = BusDriver::new(&mut dec);
        bus.start();
        bus.bits(&[true, true, false, false]);
        bus.repeated_start();
        bus.byte(0x91, false);
        bus.stop();
    }

    // First full byte after the restart is still the address
    let tx = rig.queue.try_pop().unwrap();
    assert_eq!(tx.address, 0x48);
    assert_eq!(tx.direction, Direction::Read);
    assert!(tx.is_empty());
}

#[test]
fn test_stop_while_idle_is_ignored() {
    let rig = Rig::new();
    let mut dec = rig.decoder();

    {
        let mut bus = BusDriver::new(&mut dec);
        bus.stop();
        bus.stop();
    }

    assert_eq!(dec.phase(), Phase::Idle);
    assert!(rig.queue.is_empty());
    assert_eq!(rig.anomalies.count(Anomaly::SpuriousStop), 2);
}

#[test]
fn test_truncated_frame_recovers_at_next_start() {
    let rig = Rig::new();
    let mut dec = rig.decoder();

    {
        let mut bus = BusDriver::new(&mut dec);
        // Frame cut mid-byte by a STOP
        bus.start();
        bus.byte(0x40, false);
        bus.bits(&[true, true, true]);
        bus.stop();

        bus.transaction(&Transaction::with_data(0x11, Direction::Read, &[0x01, 0x02], true));
    }

    let cut = rig.queue.try_pop().unwrap();
    assert_eq!(cut.address, 0x20);
    assert!(cut.is_empty());

    let next = rig.queue.try_pop().unwrap();
    assert_eq!(next.address, 0x11);
    assert_eq!(next.data(), &[0x01, 0x02]);
}

#[test]
fn test_stuck_clock_leaves_frame_open() {
    let rig = Rig::new();
    let mut dec = rig.decoder();

    {
        let mut bus = BusDriver::new(&mut dec);
        bus.start();
        bus.bits(&[true, false]);
    }

    // Nothing more arrives: the frame stays open, nothing is queued
    assert!(dec.is_frame_open());
    assert_eq!(dec.bit_count(), 2);
    assert!(rig.queue.is_empty());
}

#[test]
fn test_overflow_drops_newest() {
    let queue = TransactionQueue::<4>::new();
    let control = CaptureControl::new();
    let anomalies = AnomalyCounters::new();
    let clock = ManualClock::new(0);
    let mut dec = ProtocolDecoder::new(&queue, &control, &anomalies, &clock);

    {
        let mut bus = BusDriver::new(&mut dec);
        for addr in 1..=5u8 {
            bus.transaction(&Transaction::with_data(addr, Direction::Write, &[], false));
        }
    }

    assert_eq!(queue.overflows(), 2);
    for addr in 1..=3u8 {
        assert_eq!(queue.try_pop().unwrap().address, addr);
    }
    assert!(queue.try_pop().is_none());
}
