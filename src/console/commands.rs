//! Command handlers

use core::fmt::Write;

use super::parser::Command;
use super::ConsoleError;
use crate::consumer::{CaptureConsumer, StatsSnapshot};
use crate::hal::TimeSource;
use crate::report::{self, Radix};

/// What the console can do to a running capture.
///
/// Implemented by [`CaptureConsumer`]; handlers only see this trait.
pub trait CaptureSession {
    /// Clear queue and statistics.
    fn reset(&mut self);
    /// Statistics as of now.
    fn stats(&self) -> StatsSnapshot;
    /// Flip hex/decimal, returning the new mode.
    fn toggle_radix(&mut self) -> Radix;
    /// Flip pause state, returning `true` if now paused.
    fn toggle_pause(&mut self) -> bool;
}

impl<'a, T: TimeSource, const N: usize> CaptureSession for CaptureConsumer<'a, T, N> {
    fn reset(&mut self) {
        CaptureConsumer::reset(self)
    }

    fn stats(&self) -> StatsSnapshot {
        CaptureConsumer::stats(self)
    }

    fn toggle_radix(&mut self) -> Radix {
        CaptureConsumer::toggle_radix(self)
    }

    fn toggle_pause(&mut self) -> bool {
        CaptureConsumer::toggle_pause(self)
    }
}

type Handler = fn(&mut dyn CaptureSession, &mut dyn Write) -> Result<(), ConsoleError>;

/// Command descriptor
pub struct CommandDescriptor {
    pub command: Command,
    pub brief: &'static str,
    pub handler: Handler,
}

/// All available commands
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor { command: Command::Reset, brief: "Reset/clear buffer", handler: cmd_reset },
    CommandDescriptor { command: Command::Stats, brief: "Show stats", handler: cmd_stats },
    CommandDescriptor { command: Command::ToggleRadix, brief: "Toggle hex/decimal output", handler: cmd_toggle_radix },
    CommandDescriptor { command: Command::TogglePause, brief: "Pause/resume capture", handler: cmd_toggle_pause },
];

/// Execute a parsed command
pub fn execute(
    cmd: Command,
    session: &mut dyn CaptureSession,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let descriptor = COMMANDS
        .iter()
        .find(|c| c.command == cmd)
        .ok_or(ConsoleError::UnknownCommand)?;

    (descriptor.handler)(session, out)
}

/// Write the command list, one per line
pub fn write_help(out: &mut dyn Write) -> Result<(), ConsoleError> {
    for c in COMMANDS {
        writeln!(out, "  {} - {}", c.command.key(), c.brief)?;
    }
    Ok(())
}

// --- Command Implementations ---

fn cmd_reset(session: &mut dyn CaptureSession, out: &mut dyn Write) -> Result<(), ConsoleError> {
    session.reset();
    writeln!(out, "[Reset]")?;
    Ok(())
}

fn cmd_stats(session: &mut dyn CaptureSession, out: &mut dyn Write) -> Result<(), ConsoleError> {
    report::write_stats(out, &session.stats())?;
    Ok(())
}

fn cmd_toggle_radix(session: &mut dyn CaptureSession, out: &mut dyn Write) -> Result<(), ConsoleError> {
    let radix = session.toggle_radix();
    writeln!(out, "Output mode: {}", radix.as_str())?;
    Ok(())
}

fn cmd_toggle_pause(session: &mut dyn CaptureSession, out: &mut dyn Write) -> Result<(), ConsoleError> {
    let paused = session.toggle_pause();
    writeln!(out, "Capture: {}", if paused { "PAUSED" } else { "RUNNING" })?;
    Ok(())
}
