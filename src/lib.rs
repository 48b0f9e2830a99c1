//! # shell-driver
//!
//! Drive a persistent shell over plain pipes and get back each command's
//! standard output, standard error and exit status, separately and without
//! ambiguity about where one command's output ends.
//!
//! The child runs a small companion REPL script. Commands and results are
//! delimited by a NUL sentinel: for every command the script writes the
//! captured stdout, a NUL, the captured stderr (on stderr), a NUL, then the
//! exit status in decimal followed by a NUL on stdout.
//!
//! ## Features
//!
//! - **Deadlock-free pipes**: each standard stream has its own pump thread
//! - **Persistent state**: variables and working directory survive between commands
//! - **Typed failures**: launch errors, dead children and bad frames are errors;
//!   nonzero exit statuses are ordinary results
//! - **Optional deadlines**: per shell or per command
//!
//! ## Quick Start
//!
//! ```no_run
//! use shell_driver::{Shell, ShellConfig};
//!
//! #[tokio::main]
//! async fn main() -> shell_driver::Result<()> {
//!     shell_driver::logging::try_init().ok();
//!
//!     let mut shell = Shell::launch(ShellConfig::default())?;
//!
//!     shell.run("set foo bar").await?;
//!     let result = shell.run("echo $foo").await?;
//!     assert_eq!(result.stdout, b"bar\n");
//!     assert_eq!(result.status, 0);
//!
//!     shell.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod frame;
pub mod loader;
pub mod logging;
pub mod process;
pub mod queue;
pub mod script;
pub mod session;

// Re-export commonly used types
pub use error::{Result, ShellError};
pub use execution::{Command, CommandResult, CommandRunner};
pub use frame::{FrameReader, SENTINEL};
pub use loader::InitScript;
pub use process::{Launcher, ProcessHandle, StreamKind};
pub use queue::{byte_queue, QueueReceiver, QueueSender};
pub use session::{RunnerState, SessionId, Shell, ShellConfig};
