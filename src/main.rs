//! RustI2cSniffer - Main entry point
//!
//! On the chip:
//! 1. Configure SDA/SCL as plain inputs
//! 2. Subscribe the edge callbacks to the decoder
//! 3. Run the consumer loop: print transactions, drain logs, serve console
//!
//! On the host the same pipeline runs against a simulated bus, with the
//! decoder on its own thread and console characters read from stdin.

#![cfg_attr(target_os = "espidf", no_std, no_main)]

#[cfg(target_os = "espidf")]
mod firmware {
    use core::cell::UnsafeCell;

    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::interrupt;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::sys as esp_idf_sys;
    use esp_idf_sys::EspError;

    use rust_i2c_sniffer::{
        console::Console,
        hal::esp::{EspBusLines, EspClock, SerialConsole},
        log_sink::drain_logs,
        AnomalyCounters, CaptureConsumer, CaptureControl, Edge, ProtocolDecoder, TransactionQueue,
        BG_LOG_STREAM, CONFIG, RT_LOG_STREAM,
    };

    // Wrapper to make UnsafeCell Sync for the capture slot.
    // SAFETY: Written once before the pin interrupts are enabled, then only
    // touched from the GPIO ISR service, which never nests its handlers.
    #[repr(transparent)]
    struct SyncCell<T>(UnsafeCell<T>);
    unsafe impl<T> Sync for SyncCell<T> {}

    impl<T> SyncCell<T> {
        const fn new(value: T) -> Self {
            Self(UnsafeCell::new(value))
        }

        fn get(&self) -> *mut T {
            self.0.get()
        }
    }

    /// Everything the edge ISRs own.
    struct Capture {
        decoder: ProtocolDecoder<'static, EspClock>,
        lines: EspBusLines,
    }

    // Static allocations: nothing on the capture path allocates.
    static QUEUE: TransactionQueue = TransactionQueue::new();
    static CONTROL: CaptureControl = CaptureControl::new();
    static ANOMALIES: AnomalyCounters = AnomalyCounters::new();
    static CLOCK: EspClock = EspClock;
    static CAPTURE: SyncCell<Option<Capture>> = SyncCell::new(None);

    /// Edge callback, ISR context.
    fn on_edge(edge: Edge) {
        // SAFETY: see SyncCell; the slot is filled before interrupts are on
        if let Some(capture) = unsafe { (*CAPTURE.get()).as_mut() } {
            capture.decoder.on_edge(edge, &capture.lines);
            let _ = capture.lines.rearm(edge);
        }
    }

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        if let Err(err) = run() {
            panic!("sniffer init failed: {}", err);
        }
    }

    fn run() -> Result<(), EspError> {
        let peripherals = Peripherals::take()?;
        let mut serial = SerialConsole::new(peripherals.uart0, &CONFIG)?;

        let mut lines = EspBusLines::new(&CONFIG)?;
        // SAFETY: the callbacks only reach CAPTURE, which task context
        // leaves alone once the interrupts are enabled
        unsafe {
            lines.subscribe(|| on_edge(Edge::ClockRising), || on_edge(Edge::DataChanged))?;
        }

        let decoder =
            ProtocolDecoder::new(&QUEUE, &CONTROL, &ANOMALIES, &CLOCK).with_log(&RT_LOG_STREAM);

        // Interrupts masked on this core, which also hosts the ISR service,
        // so no callback can see the slot while it is being filled.
        interrupt::free(|| {
            // SAFETY: no ISR can run inside the critical section
            let slot = unsafe { &mut *CAPTURE.get() };
            slot.insert(Capture { decoder, lines }).lines.enable()
        })?;

        let mut consumer =
            CaptureConsumer::new(&QUEUE, &CONTROL, &ANOMALIES, &CLOCK).with_log(&BG_LOG_STREAM);
        let console = Console::new();
        console.print_banner(&CONFIG, &mut serial);

        loop {
            consumer.poll(&mut serial);
            drain_logs(&RT_LOG_STREAM, &BG_LOG_STREAM, &mut serial);

            while let Some(byte) = serial.read_byte() {
                let _ = console.process_byte(byte, &mut consumer, &mut serial);
            }

            FreeRtos::delay_ms(CONFIG.poll_interval_ms);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::fmt;
    use std::io::{self, Read, Write as _};
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    use rust_i2c_sniffer::{
        console::Console,
        hal::TimeSource,
        log_sink::drain_logs,
        sim::BusDriver,
        AnomalyCounters, CaptureConsumer, CaptureControl, Direction, ProtocolDecoder, Transaction,
        TransactionQueue, BG_LOG_STREAM, CONFIG, RT_LOG_STREAM,
    };

    static QUEUE: TransactionQueue = TransactionQueue::new();
    static CONTROL: CaptureControl = CaptureControl::new();
    static ANOMALIES: AnomalyCounters = AnomalyCounters::new();

    /// Wall clock since process start.
    struct HostClock {
        epoch: Instant,
    }

    impl TimeSource for HostClock {
        fn now_ms(&self) -> u32 {
            self.epoch.elapsed().as_millis() as u32
        }
    }

    /// `fmt::Write` adapter for a std writer.
    struct Out<W: io::Write>(W);

    impl<W: io::Write> fmt::Write for Out<W> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.write_all(s.as_bytes()).map_err(|_| fmt::Error)
        }
    }

    /// Scripted traffic: sensor writes, an EEPROM random read with a
    /// repeated start, and an address probe nobody answers.
    fn play_round<T: TimeSource, const N: usize>(bus: &mut BusDriver<'_, '_, T, N>) {
        bus.transaction(&Transaction::with_data(0x76, Direction::Write, &[0xF4, 0x27], false));

        bus.start();
        bus.byte(0xA0, false);
        bus.byte(0x00, false);
        bus.repeated_start();
        bus.byte(0xA1, false);
        bus.byte(0x42, true);
        bus.stop();

        bus.transaction(&Transaction::with_data(0x3C, Direction::Write, &[], true));
    }

    pub fn run() {
        let clock: &'static HostClock = Box::leak(Box::new(HostClock {
            epoch: Instant::now(),
        }));

        let mut out = Out(io::stdout());
        let mut err = Out(io::stderr());

        let console = Console::new();
        console.print_banner(&CONFIG, &mut out);

        thread::spawn(move || {
            let mut decoder =
                ProtocolDecoder::new(&QUEUE, &CONTROL, &ANOMALIES, clock).with_log(&RT_LOG_STREAM);
            let mut bus = BusDriver::new(&mut decoder);
            loop {
                play_round(&mut bus);
                thread::sleep(Duration::from_millis(250));
            }
        });

        let (tx, rx) = mpsc::channel::<u8>();
        thread::spawn(move || {
            for byte in io::stdin().lock().bytes() {
                match byte {
                    Ok(b) if tx.send(b).is_ok() => {}
                    _ => break,
                }
            }
        });

        let mut consumer =
            CaptureConsumer::new(&QUEUE, &CONTROL, &ANOMALIES, clock).with_log(&BG_LOG_STREAM);

        loop {
            consumer.poll(&mut out);
            drain_logs(&RT_LOG_STREAM, &BG_LOG_STREAM, &mut err);

            while let Ok(byte) = rx.try_recv() {
                let _ = console.process_byte(byte, &mut consumer, &mut out);
            }

            let _ = out.0.flush();
            thread::sleep(Duration::from_millis(CONFIG.poll_interval_ms as u64));
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    host::run();
}
