//! Child process management.
//!
//! The child runs the companion REPL script with all three standard streams
//! connected to pipes. Each pipe is serviced by its own [`Pump`].

mod launcher;
mod pump;

pub use launcher::{Launcher, SpawnedProcess};
pub use pump::{Pump, ReadPump, WritePump, DEFAULT_CHUNK_SIZE};

use std::fmt;
use std::process::{Child, ExitStatus};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Interval between exit polls while waiting for the child.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One of the child's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamKind::Stdin => "stdin",
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        };
        f.write_str(name)
    }
}

/// Owns the child process.
///
/// Dropping the handle kills the child if it is still running and reaps it.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    program: String,
    exit_status: Option<ExitStatus>,
}

impl ProcessHandle {
    pub(crate) fn new(child: Child, program: String) -> Self {
        Self {
            child,
            program,
            exit_status: None,
        }
    }

    /// Process ID of the child.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Program the child was started from.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check for exit without blocking.
    pub fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        if self.exit_status.is_none() {
            self.exit_status = self.child.try_wait()?;
        }
        Ok(self.exit_status)
    }

    /// Poll for exit until `grace` elapses.
    ///
    /// Returns `None` if the child is still running afterwards.
    pub fn wait_for(&mut self, grace: Duration) -> std::io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + grace;
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Ask the child to exit with SIGTERM.
    #[cfg(unix)]
    pub fn terminate(&mut self) -> std::io::Result<()> {
        if self.try_wait()?.is_some() {
            return Ok(());
        }
        let pid = self.pid() as libc::pid_t;
        // SAFETY: `pid` is our own unreaped child, so it cannot have been recycled.
        if unsafe { libc::kill(pid, libc::SIGTERM) } == -1 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    /// Ask the child to exit. Without signals this is a kill.
    #[cfg(not(unix))]
    pub fn terminate(&mut self) -> std::io::Result<()> {
        self.kill().map(|_| ())
    }

    /// Kill the child and wait for it.
    pub fn kill(&mut self) -> std::io::Result<ExitStatus> {
        if let Some(status) = self.try_wait()? {
            return Ok(status);
        }
        self.child.kill()?;
        let status = self.child.wait()?;
        self.exit_status = Some(status);
        Ok(status)
    }

    /// Stop the child, escalating from waiting to SIGTERM to SIGKILL.
    ///
    /// The caller is expected to have closed the child's stdin first, so a
    /// well-behaved REPL is already on its way out.
    pub fn stop(&mut self, grace: Duration) -> std::io::Result<ExitStatus> {
        if let Some(status) = self.wait_for(grace)? {
            debug!(pid = self.pid(), "child exited: {}", status);
            return Ok(status);
        }

        debug!(pid = self.pid(), "child still running, sending SIGTERM");
        self.terminate()?;
        if let Some(status) = self.wait_for(grace)? {
            return Ok(status);
        }

        warn!(pid = self.pid(), "child ignored SIGTERM, killing");
        self.kill()
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if let Ok(None) = self.try_wait() {
            debug!(pid = self.pid(), "killing child on drop");
            if let Err(e) = self.kill() {
                warn!(pid = self.pid(), "failed to kill child: {}", e);
            }
        }
    }
}
