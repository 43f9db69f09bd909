//! Serial console for capture control.
//!
//! Single-character commands, polled from the consumer loop.
//! Zero heap allocation.

pub mod commands;
pub mod console;
pub mod error;
pub mod parser;

pub use commands::{execute, CaptureSession, COMMANDS};
pub use console::{Console, VERSION};
pub use error::ConsoleError;
pub use parser::{parse_command, Command};
