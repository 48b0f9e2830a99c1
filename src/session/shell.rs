//! The shell session: one child process, three pumps, one runner.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::{debug, info, info_span, warn, Instrument};

use super::{RunnerState, SessionId};
use crate::execution::{Command, CommandResult, CommandRunner};
use crate::process::{Launcher, ProcessHandle, Pump, SpawnedProcess};
use crate::script;
use crate::Result;

/// Interpreter used when none is configured.
pub const DEFAULT_EXECUTABLE: &str = "fish";

/// How long shutdown waits at each escalation step.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Configuration for launching a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Interpreter to run (e.g. `fish`, `/usr/bin/bash`).
    pub executable: PathBuf,
    /// Companion REPL script passed as the interpreter's only argument.
    /// `None` uses the script bundled for the interpreter.
    pub script: Option<PathBuf>,
    /// Initial working directory.
    pub working_dir: Option<PathBuf>,
    /// Default per-frame deadline. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Grace period per shutdown escalation step.
    pub shutdown_grace: Duration,
}

impl ShellConfig {
    /// Create a configuration for the given interpreter and script.
    pub fn new(executable: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            script: Some(script.into()),
            working_dir: None,
            timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Create a configuration that runs the bundled companion script.
    pub fn bundled(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            script: None,
            working_dir: None,
            timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Set the initial working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the default per-frame deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the shutdown grace period.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::bundled(DEFAULT_EXECUTABLE)
    }
}

/// A persistent shell session.
///
/// Shell state such as variables and the working directory carries over
/// from one command to the next. Commands run one at a time; share a
/// `Shell` between tasks only behind a mutex.
///
/// Dropping a `Shell` kills the child. Prefer [`Shell::shutdown`], which lets
/// the companion script exit on its own first.
#[derive(Debug)]
pub struct Shell {
    id: SessionId,
    process: ProcessHandle,
    runner: CommandRunner,
    pumps: Vec<Pump>,
    shutdown_grace: Duration,
    execution_count: u64,
    // Declared last so the child is gone before the file is removed.
    bundled_script: Option<NamedTempFile>,
}

impl Shell {
    /// Spawn the interpreter with its companion script and start the pumps.
    pub fn launch(config: ShellConfig) -> Result<Self> {
        let (script_path, bundled_script) = match config.script {
            Some(ref path) => (path.clone(), None),
            None => {
                let file = script::materialize(&config.executable)?;
                (file.path().to_path_buf(), Some(file))
            }
        };

        let mut launcher = Launcher::new(&config.executable, script_path);
        if let Some(ref dir) = config.working_dir {
            launcher = launcher.working_dir(dir);
        }

        let SpawnedProcess {
            process,
            stdin,
            stdout,
            stderr,
            pumps,
        } = launcher.launch()?;

        let id = SessionId::new();
        info!(session = %id, pid = process.pid(), "session started");

        Ok(Self {
            id,
            process,
            runner: CommandRunner::new(stdin, stdout, stderr).with_timeout(config.timeout),
            pumps,
            shutdown_grace: config.shutdown_grace,
            execution_count: 0,
            bundled_script,
        })
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Process ID of the child.
    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    /// Current runner state.
    pub fn state(&self) -> RunnerState {
        self.runner.state()
    }

    /// Number of commands submitted so far.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Run a command and return its stdout, stderr and exit status.
    ///
    /// Waits indefinitely unless a timeout is configured on the shell or the
    /// command.
    pub async fn run(&mut self, command: impl Into<Command>) -> Result<CommandResult> {
        let command = command.into();
        let span = self.next_span();
        self.runner.run(&command).instrument(span).await
    }

    /// Blocking variant of [`Shell::run`].
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context.
    pub fn run_blocking(&mut self, command: impl Into<Command>) -> Result<CommandResult> {
        let command = command.into();
        let span = self.next_span();
        let _guard = span.enter();
        self.runner.run_blocking(&command)
    }

    /// Run commands in order, stopping at the first driver error.
    ///
    /// Nonzero exit statuses do not stop the sequence.
    pub async fn run_all<I, C>(&mut self, commands: I) -> Result<Vec<CommandResult>>
    where
        I: IntoIterator<Item = C>,
        C: Into<Command>,
    {
        let mut results = Vec::new();
        for command in commands {
            results.push(self.run(command).await?);
        }
        Ok(results)
    }

    /// End the session.
    ///
    /// Closes the child's stdin so the companion loop can finish, escalates
    /// to SIGTERM and then SIGKILL if it does not, and joins the pumps.
    ///
    /// This blocks the calling thread for up to about three grace periods.
    /// From async code, run it on a blocking thread:
    ///
    /// ```no_run
    /// # async fn example(shell: shell_driver::Shell) -> Result<(), Box<dyn std::error::Error>> {
    /// let status = tokio::task::spawn_blocking(move || shell.shutdown()).await??;
    /// # Ok(())
    /// # }
    /// ```
    pub fn shutdown(mut self) -> Result<ExitStatus> {
        self.runner.close();
        let status = self.process.stop(self.shutdown_grace)?;
        info!(session = %self.id, "session ended: {}", status);

        let deadline = Instant::now() + self.shutdown_grace;
        for pump in self.pumps.drain(..) {
            while !pump.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(5));
            }
            if pump.is_finished() {
                pump.join();
            } else {
                // A grandchild may still hold the pipe open.
                warn!(session = %self.id, "{} pump still running, detaching", pump.stream());
            }
        }
        debug!(session = %self.id, "pumps stopped");
        Ok(status)
    }

    fn next_span(&mut self) -> tracing::Span {
        self.execution_count += 1;
        info_span!("run", session = %self.id, seq = self.execution_count)
    }
}
