//! Command character parser
//!
//! One byte, one command. Case-insensitive.

/// Console commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `r`: clear queue and statistics
    Reset,
    /// `s`: print statistics
    Stats,
    /// `h`: toggle hex/decimal output
    ToggleRadix,
    /// `p`: toggle pause/resume
    TogglePause,
}

impl Command {
    /// The character that triggers this command
    pub fn key(self) -> char {
        match self {
            Command::Reset => 'r',
            Command::Stats => 's',
            Command::ToggleRadix => 'h',
            Command::TogglePause => 'p',
        }
    }
}

/// Parse one input byte
///
/// Returns `None` for anything that is not a command character.
pub fn parse_command(byte: u8) -> Option<Command> {
    match byte.to_ascii_lowercase() {
        b'r' => Some(Command::Reset),
        b's' => Some(Command::Stats),
        b'h' => Some(Command::ToggleRadix),
        b'p' => Some(Command::TogglePause),
        _ => None,
    }
}
