//! Command representation.

use std::borrow::Cow;
use std::time::Duration;

use crate::error::ShellError;
use crate::frame::SENTINEL;

/// A command to be evaluated by the companion REPL.
///
/// Text commands are sent as UTF-8. The command must not read from stdin
/// and must not print a NUL byte; either would break frame boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Raw command bytes, without the trailing sentinel.
    pub bytes: Vec<u8>,
    /// Per-command deadline, overriding the shell default.
    pub timeout: Option<Duration>,
}

impl Command {
    /// Create a new command from text or raw bytes.
    pub fn new(command: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: command.into(),
            timeout: None,
        }
    }

    /// Set the deadline for each frame of this command.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// The command as text, lossily decoded.
    pub fn display(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Reject commands that contain the sentinel byte.
    pub fn validate(&self) -> crate::Result<()> {
        match self.bytes.iter().position(|&b| b == SENTINEL) {
            Some(offset) => Err(ShellError::InvalidCommand(offset)),
            None => Ok(()),
        }
    }
}

impl From<&str> for Command {
    fn from(command: &str) -> Self {
        Self::new(command)
    }
}

impl From<String> for Command {
    fn from(command: String) -> Self {
        Self::new(command)
    }
}

impl From<&String> for Command {
    fn from(command: &String) -> Self {
        Self::new(command.as_str())
    }
}

impl From<&[u8]> for Command {
    fn from(command: &[u8]) -> Self {
        Self::new(command)
    }
}

impl From<Vec<u8>> for Command {
    fn from(command: Vec<u8>) -> Self {
        Self::new(command)
    }
}
