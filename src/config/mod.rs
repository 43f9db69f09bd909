//! Module: config
//!
//! Purpose: Build-time configuration for RustI2cSniffer.
//!
//! Architecture:
//! - Buffer bounds are `const` so every capture buffer is sized at compile time
//! - Board wiring and console settings live in `SnifferConfig`
//! - `CONFIG` is the single source of defaults for the firmware binary
//!
//! Safety: RT-safe. Plain constants, no interior mutability.

use crate::report::Radix;

/// Transaction queue slots. Must be a power of 2; one slot stays empty.
pub const DEFAULT_QUEUE_SIZE: usize = 256;

/// Maximum data bytes stored per transaction (address byte excluded).
pub const MAX_DATA_LEN: usize = 64;

/// Board and console configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnifferConfig {
    /// GPIO wired to SDA.
    pub sda_pin: i32,
    /// GPIO wired to SCL.
    pub scl_pin: i32,
    /// Console UART TX pin (UART0 default on ESP32-S3).
    pub console_tx_pin: i32,
    /// Console UART RX pin.
    pub console_rx_pin: i32,
    /// Console UART baud rate.
    pub baud_rate: u32,
    /// Delay between consumer loop cycles.
    pub poll_interval_ms: u32,
    /// Rendering mode at start-up and after power cycle.
    pub default_radix: Radix,
}

impl SnifferConfig {
    pub const DEFAULT: Self = Self {
        sda_pin: 4,
        scl_pin: 5,
        console_tx_pin: 43,
        console_rx_pin: 44,
        baud_rate: 115_200,
        poll_interval_ms: 10,
        default_radix: Radix::Hex,
    };
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Global configuration.
pub const CONFIG: SnifferConfig = SnifferConfig::DEFAULT;
