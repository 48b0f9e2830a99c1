//! Command execution over a framed session.
//!
//! - [`Command`]: command bytes plus per-call options
//! - [`CommandRunner`]: sends a command and harvests its three frames
//! - [`CommandResult`]: the `(stdout, stderr, status)` outcome

mod command;
mod result;
mod runner;

pub use command::Command;
pub use result::CommandResult;
pub use runner::CommandRunner;
