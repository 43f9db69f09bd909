//! # RustI2cSniffer
//!
//! Passive I2C bus sniffer with a lock-free capture pipeline.
//!
//! ## Architecture
//!
//! ```text
//! SCL/SDA edges ──▶ ProtocolDecoder ──▶ TransactionQueue ──▶ CaptureConsumer ──▶ console
//!   (ISR, RT)        (state machine)      (lock-free SPSC)      (best effort)
//! ```
//!
//! - The decoder is owned by the edge-handling context and never blocks
//! - The consumer never touches decoder state
//! - The queue, the capture gate and the counters are the only shared state,
//!   all accessed through atomics. No mutexes.

#![cfg_attr(not(test), no_std)]

pub mod anomaly;
pub mod assembler;
pub mod config;
pub mod console;
pub mod consumer;
pub mod control;
pub mod decoder;
pub mod hal;
pub mod log_globals;
pub mod log_sink;
pub mod logging;
pub mod queue;
pub mod report;
pub mod sim;
pub mod transaction;

pub use anomaly::{Anomaly, AnomalyCounters};
pub use config::CONFIG;
pub use consumer::{CaptureConsumer, StatsSnapshot};
pub use control::CaptureControl;
pub use decoder::{Edge, Phase, ProtocolDecoder};
pub use log_globals::{BG_LOG_STREAM, RT_LOG_STREAM};
pub use queue::TransactionQueue;
pub use report::Radix;
pub use transaction::{Direction, Transaction};
