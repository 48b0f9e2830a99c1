//! Spawning the child and wiring its pipes to pumps.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::info;

use super::{ProcessHandle, Pump, ReadPump, StreamKind, WritePump, DEFAULT_CHUNK_SIZE};
use crate::error::ShellError;
use crate::queue::{byte_queue, QueueReceiver, QueueSender};
use crate::Result;

/// Starts `<executable> <script>` with piped standard streams.
#[derive(Debug, Clone)]
pub struct Launcher {
    executable: PathBuf,
    script: PathBuf,
    working_dir: Option<PathBuf>,
    chunk_size: usize,
}

impl Launcher {
    /// Create a launcher for the given interpreter and companion script.
    pub fn new(executable: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            script: script.into(),
            working_dir: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Start the child in `dir` instead of the current directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the read size of the output pumps.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Spawn the child and start its three pumps.
    ///
    /// Fails with [`ShellError::Launch`] if the script is missing or the
    /// executable cannot be started.
    pub fn launch(&self) -> Result<SpawnedProcess> {
        let program = self.executable.display().to_string();

        if !self.script.is_file() {
            return Err(ShellError::Launch {
                program,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("companion script not found: {}", self.script.display()),
                ),
            });
        }

        let mut cmd = Command::new(&self.executable);
        cmd.arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ShellError::Launch {
            program: program.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let process = ProcessHandle::new(child, program);

        let (Some(stdin), Some(stdout), Some(stderr)) = (stdin, stdout, stderr) else {
            return Err(ShellError::Io(std::io::Error::other(
                "child standard streams were not captured",
            )));
        };

        info!(
            pid = process.pid(),
            program = process.program(),
            script = %self.script.display(),
            "launched shell"
        );

        let (stdin_tx, stdin_rx) = byte_queue();
        let (stdout_tx, stdout_rx) = byte_queue();
        let (stderr_tx, stderr_rx) = byte_queue();

        // A pump that fails to start leaves `process` to be killed on drop.
        let pumps = vec![
            WritePump::new(stdin, stdin_rx).spawn()?,
            ReadPump::new(stdout, stdout_tx, StreamKind::Stdout)
                .with_chunk_size(self.chunk_size)
                .spawn()?,
            ReadPump::new(stderr, stderr_tx, StreamKind::Stderr)
                .with_chunk_size(self.chunk_size)
                .spawn()?,
        ];

        Ok(SpawnedProcess {
            process,
            stdin: stdin_tx,
            stdout: stdout_rx,
            stderr: stderr_rx,
            pumps,
        })
    }

    /// Path of the interpreter.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Path of the companion script.
    pub fn script(&self) -> &Path {
        &self.script
    }
}

/// A running child with its queues already connected to live pumps.
#[derive(Debug)]
pub struct SpawnedProcess {
    /// The child process.
    pub process: ProcessHandle,
    /// Chunks put here are written to the child's stdin.
    pub stdin: QueueSender,
    /// Chunks read from the child's stdout.
    pub stdout: QueueReceiver,
    /// Chunks read from the child's stderr.
    pub stderr: QueueReceiver,
    /// The stdin, stdout and stderr pumps, in that order.
    pub pumps: Vec<Pump>,
}
