//! Command runner.
//!
//! Sends one command plus a sentinel to the child, then harvests exactly three
//! frames in fixed order: stdout, stderr, exit status. Nothing here
//! synchronizes the stdout and stderr queues with each other; the order is a
//! property of the companion script's write sequence.

use std::time::{Duration, Instant};

use tracing::debug;

use super::command::Command;
use super::result::{parse_status, CommandResult};
use crate::error::ShellError;
use crate::frame::{FrameReader, SENTINEL};
use crate::process::StreamKind;
use crate::queue::{QueueReceiver, QueueSender};
use crate::session::RunnerState;
use crate::Result;

/// Executes commands over a session's three queues, one at a time.
///
/// `run` takes `&mut self`, so overlapping commands are impossible without
/// external locking. After a timeout or a protocol error the runner stays in
/// the state it failed in and refuses further commands, since the next
/// frames on the wire would belong to the abandoned command.
#[derive(Debug)]
pub struct CommandRunner {
    stdin: Option<QueueSender>,
    stdout: FrameReader,
    stderr: FrameReader,
    state: RunnerState,
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Create a runner over the child's stdin, stdout and stderr queues.
    pub fn new(stdin: QueueSender, stdout: QueueReceiver, stderr: QueueReceiver) -> Self {
        Self {
            stdin: Some(stdin),
            stdout: FrameReader::new(stdout, StreamKind::Stdout),
            stderr: FrameReader::new(stderr, StreamKind::Stderr),
            state: RunnerState::Idle,
            timeout: None,
        }
    }

    /// Set the default per-frame deadline. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current state.
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Run one command and collect its result.
    pub async fn run(&mut self, command: &Command) -> Result<CommandResult> {
        let start = Instant::now();
        let deadline = command.timeout.or(self.timeout);
        self.submit(command)?;

        let stdout = read_stage(&mut self.stdout, RunnerState::AwaitingStdout, deadline).await?;
        self.state.transition_to(RunnerState::AwaitingStderr)?;

        let stderr = read_stage(&mut self.stderr, RunnerState::AwaitingStderr, deadline).await?;
        self.state.transition_to(RunnerState::AwaitingStatus)?;

        let frame = read_stage(&mut self.stdout, RunnerState::AwaitingStatus, deadline).await?;
        let status = parse_status(&frame)?;
        self.state.transition_to(RunnerState::Idle)?;

        let result = CommandResult::new(stdout, stderr, status).with_duration(start.elapsed());
        debug!(
            status,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            elapsed = ?result.duration,
            "command finished"
        );
        Ok(result)
    }

    /// Run one command, blocking the current thread until it completes.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context.
    pub fn run_blocking(&mut self, command: &Command) -> Result<CommandResult> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        rt.block_on(self.run(command))
    }

    /// Close the input queue. The child sees EOF on stdin once the stdin
    /// pump drains.
    pub fn close(&mut self) {
        self.stdin = None;
        if !self.state.is_terminal() {
            self.state = RunnerState::Closed;
        }
    }

    fn submit(&mut self, command: &Command) -> Result<()> {
        if !self.state.can_run() {
            return Err(ShellError::NotReady(self.state));
        }
        command.validate()?;

        let delivered = match self.stdin {
            Some(ref stdin) => stdin.put(command.bytes.as_slice()) && stdin.put([SENTINEL]),
            None => false,
        };
        if !delivered {
            debug!("stdin queue closed, session is gone");
            self.close();
            return Err(ShellError::SessionClosed);
        }

        debug!(command = %command.display(), "command sent");
        self.state.transition_to(RunnerState::AwaitingStdout)
    }
}

async fn read_stage(
    reader: &mut FrameReader,
    stage: RunnerState,
    deadline: Option<Duration>,
) -> Result<Vec<u8>> {
    match deadline {
        None => reader.read_frame().await,
        Some(after) => tokio::time::timeout(after, reader.read_frame())
            .await
            .map_err(|_| ShellError::Timeout { stage, after })?,
    }
}
