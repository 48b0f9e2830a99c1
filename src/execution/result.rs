//! Execution result types.

use std::borrow::Cow;
use std::time::Duration;

/// Captured output and exit status of one command.
///
/// A nonzero status is an ordinary result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Everything the command wrote to standard output.
    pub stdout: Vec<u8>,
    /// Everything the command wrote to standard error.
    pub stderr: Vec<u8>,
    /// The command's exit status.
    pub status: i32,
    /// Time from submission to receipt of the status frame.
    pub duration: Duration,
}

impl CommandResult {
    /// Create a new command result.
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>, status: i32) -> Self {
        Self {
            stdout,
            stderr,
            status,
            duration: Duration::ZERO,
        }
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Check if the command succeeded (status 0).
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Standard output as text, lossily decoded.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Standard error as text, lossily decoded.
    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Split into the `(stdout, stderr, status)` triple.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>, i32) {
        (self.stdout, self.stderr, self.status)
    }
}

/// Parse a status frame as a base-10 integer.
///
/// Surrounding ASCII whitespace is ignored.
pub(crate) fn parse_status(frame: &[u8]) -> crate::Result<i32> {
    std::str::from_utf8(frame)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            crate::error::ShellError::InvalidStatus(String::from_utf8_lossy(frame).into_owned())
        })
}
