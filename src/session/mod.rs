//! Shell session management.

mod id;
mod shell;
mod state;

pub use id::SessionId;
pub use shell::{Shell, ShellConfig, DEFAULT_EXECUTABLE, DEFAULT_SHUTDOWN_GRACE};
pub use state::RunnerState;
