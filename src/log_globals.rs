//! Global log stream instances.
//!
//! One stream per execution context, so each has a single producer.

use crate::logging::LogStream;

/// Log stream for the edge-handling context only.
///
/// Single producer (decoder), single consumer (log sink in consumer loop).
pub static RT_LOG_STREAM: LogStream = LogStream::new();

/// Log stream for the consumer loop and console.
pub static BG_LOG_STREAM: LogStream = LogStream::new();
