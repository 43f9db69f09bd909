//! ESP-IDF signal source, clock and console UART.
//!
//! Built on the `esp-idf-hal` drivers. The GPIO ISR service dispatches
//! every pin from one interrupt, so the SCL and SDA callbacks never preempt
//! each other on the same core.

use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::gpio::{self, AnyIOPin, Input, InterruptType, PinDriver, Pull};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use super::{BusLines, TimeSource};
use crate::config::SnifferConfig;
use crate::decoder::Edge;

/// The two bus pins as floating inputs with edge interrupts.
///
/// SCL interrupts on rising edges only, SDA on both edges. Interrupts stay
/// off until [`enable`](Self::enable). The driver disables a pin's
/// interrupt each time it fires, so callbacks must [`rearm`](Self::rearm).
pub struct EspBusLines {
    scl: PinDriver<'static, AnyIOPin, Input>,
    sda: PinDriver<'static, AnyIOPin, Input>,
}

impl EspBusLines {
    /// Claim the configured pins.
    ///
    /// Internal pulls stay off: the bus under observation has its own pull-ups.
    pub fn new(config: &SnifferConfig) -> Result<Self, EspError> {
        // SAFETY: the bus pins are claimed only here
        let (scl, sda) = unsafe { (AnyIOPin::new(config.scl_pin), AnyIOPin::new(config.sda_pin)) };

        let mut scl = PinDriver::input(scl)?;
        scl.set_pull(Pull::Floating)?;
        scl.set_interrupt_type(InterruptType::PosEdge)?;

        let mut sda = PinDriver::input(sda)?;
        sda.set_pull(Pull::Floating)?;
        sda.set_interrupt_type(InterruptType::AnyEdge)?;

        Ok(Self { scl, sda })
    }

    /// Register the edge callbacks.
    ///
    /// # Safety
    ///
    /// Both callbacks run in ISR context: no blocking, no allocation, and
    /// whatever they share must not be touched from task context while the
    /// interrupts are enabled.
    pub unsafe fn subscribe<C, D>(&mut self, on_clock_rising: C, on_data_change: D) -> Result<(), EspError>
    where
        C: FnMut() + Send + 'static,
        D: FnMut() + Send + 'static,
    {
        self.scl.subscribe(on_clock_rising)?;
        self.sda.subscribe(on_data_change)?;
        Ok(())
    }

    /// Enable both pin interrupts.
    pub fn enable(&mut self) -> Result<(), EspError> {
        self.scl.enable_interrupt()?;
        self.sda.enable_interrupt()
    }

    /// Re-enable the interrupt that delivered `edge`.
    #[inline]
    pub fn rearm(&mut self, edge: Edge) -> Result<(), EspError> {
        match edge {
            Edge::ClockRising => self.scl.enable_interrupt(),
            Edge::DataChanged => self.sda.enable_interrupt(),
        }
    }
}

impl BusLines for EspBusLines {
    #[inline]
    fn scl(&self) -> bool {
        self.scl.is_high()
    }

    #[inline]
    fn sda(&self) -> bool {
        self.sda.is_high()
    }
}

/// Milliseconds from the high-resolution `esp_timer`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EspClock;

impl TimeSource for EspClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        // SAFETY: esp_timer_get_time is ISR-safe and always callable
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u32
    }
}

/// Console UART: non-blocking reads, blocking writes.
pub struct SerialConsole {
    uart: UartDriver<'static>,
}

impl SerialConsole {
    /// Open `uart` on the configured console pins and baud rate.
    pub fn new(
        uart: impl Peripheral<P = impl uart::Uart> + 'static,
        config: &SnifferConfig,
    ) -> Result<Self, EspError> {
        let uart_config = uart::config::Config::default().baudrate(Hertz(config.baud_rate));

        // SAFETY: the console pins are claimed only here
        let (tx, rx) = unsafe {
            (
                AnyIOPin::new(config.console_tx_pin),
                AnyIOPin::new(config.console_rx_pin),
            )
        };

        let uart = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<gpio::AnyIOPin>::None, // CTS
            Option::<gpio::AnyIOPin>::None, // RTS
            &uart_config,
        )?;

        Ok(Self { uart })
    }

    /// Next received byte, if any. Never waits.
    pub fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte, NON_BLOCK) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

impl core::fmt::Write for SerialConsole {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            let n = self.uart.write(bytes).map_err(|_| core::fmt::Error)?;
            if n == 0 {
                return Err(core::fmt::Error);
            }
            bytes = &bytes[n..];
        }
        Ok(())
    }
}
