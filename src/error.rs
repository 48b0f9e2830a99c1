//! Error types for shell-driver.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::process::StreamKind;
use crate::session::RunnerState;

/// Main error type for shell-driver operations.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The child process could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command contains the sentinel byte and would corrupt framing.
    #[error("command contains a NUL byte at offset {0}")]
    InvalidCommand(usize),

    /// An output stream ended before the expected sentinel arrived.
    #[error("{0} closed before the frame was complete")]
    StreamClosed(StreamKind),

    /// The status frame was not a base-10 integer.
    #[error("invalid exit status frame: {0:?}")]
    InvalidStatus(String),

    /// No frame arrived within the configured deadline.
    #[error("timed out after {after:?} while {stage:?}")]
    Timeout { stage: RunnerState, after: Duration },

    /// The runner cannot accept a command in its current state.
    #[error("shell not ready: current state is {0:?}")]
    NotReady(RunnerState),

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: RunnerState, to: RunnerState },

    /// The input queue is closed; the session has ended.
    #[error("session closed")]
    SessionClosed,

    /// A requested plugin file does not exist.
    #[error("plugin does not exist: {name} (looked for {})", .path.display())]
    PluginNotFound { name: String, path: PathBuf },

    /// The interpreter could not report the installed virtualfish version.
    #[error("cannot determine virtualfish version via {interpreter}: {reason}")]
    VersionUnknown { interpreter: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for shell-driver operations.
pub type Result<T> = std::result::Result<T, ShellError>;
