//! Main console struct: byte input to command execution

use core::fmt::Write;

use super::{commands, execute, parse_command, CaptureSession, ConsoleError};
use crate::config::SnifferConfig;

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");

/// Single-character command console
pub struct Console;

impl Console {
    /// Create new console
    pub const fn new() -> Self {
        Self
    }

    /// Process a single input byte
    ///
    /// Returns `Some(result)` if the byte ran a command, `None` if it was
    /// ignored. Unknown characters never produce an error.
    pub fn process_byte(
        &self,
        byte: u8,
        session: &mut dyn CaptureSession,
        out: &mut dyn Write,
    ) -> Option<Result<(), ConsoleError>> {
        parse_command(byte).map(|cmd| execute(cmd, session, out))
    }

    /// Print welcome banner with wiring and command list
    pub fn print_banner(&self, config: &SnifferConfig, out: &mut dyn Write) {
        let _ = writeln!(out);
        let _ = writeln!(out, "========================================");
        let _ = writeln!(out, "  {}", VERSION);
        let _ = writeln!(out, "  Passive I2C bus analyzer");
        let _ = writeln!(out, "========================================");
        let _ = writeln!(out, "  SDA: GPIO{}", config.sda_pin);
        let _ = writeln!(out, "  SCL: GPIO{}", config.scl_pin);
        let _ = writeln!(out, "========================================");
        let _ = writeln!(out);
        let _ = writeln!(out, "Commands:");
        let _ = commands::write_help(out);
        let _ = writeln!(out);
        let _ = writeln!(out, "Waiting for I2C traffic...");
        let _ = writeln!(out);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
