//! Background pumps between child pipes and byte queues.
//!
//! Every pump runs on its own OS thread and only ever blocks on its own pipe
//! or its own queue. No pump depends on another pump or on the caller making
//! progress, which is what keeps a chatty child from deadlocking against a
//! full kernel pipe buffer.

use std::io::{Read, Write};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace};

use super::StreamKind;
use crate::queue::{QueueReceiver, QueueSender};

/// Default read size for output pumps.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Handle to a running pump thread.
#[derive(Debug)]
pub struct Pump {
    stream: StreamKind,
    handle: JoinHandle<()>,
}

impl Pump {
    /// The stream this pump serves.
    pub fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Check whether the pump thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the pump thread to exit.
    pub fn join(self) {
        if self.handle.join().is_err() {
            error!("{} pump panicked", self.stream);
        }
    }
}

/// Moves bytes from a child output stream onto a queue.
pub struct ReadPump<R: Read + Send + 'static> {
    reader: R,
    tx: QueueSender,
    stream: StreamKind,
    chunk_size: usize,
}

impl<R: Read + Send + 'static> ReadPump<R> {
    /// Create a new read pump.
    ///
    /// # Arguments
    ///
    /// * `reader` - The child's stdout or stderr pipe (blocking).
    /// * `tx` - Queue receiving every chunk read.
    /// * `stream` - Which stream this is, for logging and errors.
    pub fn new(reader: R, tx: QueueSender, stream: StreamKind) -> Self {
        Self {
            reader,
            tx,
            stream,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Read at most `size` bytes per chunk. A size of 1 reads byte by byte.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Start the pump on a dedicated thread.
    ///
    /// The thread exits when:
    /// - The stream reaches EOF
    /// - The queue consumer is dropped
    /// - An unrecoverable read error occurs
    pub fn spawn(self) -> std::io::Result<Pump> {
        let stream = self.stream;
        let handle = thread::Builder::new()
            .name(format!("{}-pump", stream))
            .spawn(move || self.run())?;
        Ok(Pump { stream, handle })
    }

    fn run(mut self) {
        let stream = self.stream;
        let mut buf = vec![0u8; self.chunk_size];
        debug!("{} pump: started", stream);

        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    debug!("{} pump: EOF", stream);
                    break;
                }
                Ok(n) => {
                    trace!("{} pump: read {} bytes", stream, n);
                    if !self.tx.put(&buf[..n]) {
                        debug!("{} pump: queue closed", stream);
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("{} pump read error: {}", stream, e);
                    break;
                }
            }
        }
    }
}

/// Moves chunks from a queue into the child's stdin.
pub struct WritePump<W: Write + Send + 'static> {
    writer: W,
    rx: QueueReceiver,
}

impl<W: Write + Send + 'static> WritePump<W> {
    /// Create a new write pump.
    ///
    /// # Arguments
    ///
    /// * `writer` - The child's stdin pipe (blocking).
    /// * `rx` - Queue of chunks to forward.
    pub fn new(writer: W, rx: QueueReceiver) -> Self {
        Self { writer, rx }
    }

    /// Start the pump on a dedicated thread.
    ///
    /// Each chunk is flushed as soon as it is written. The thread exits when
    /// the queue producer is dropped or the pipe breaks; either way the
    /// writer is dropped, so the child sees EOF on stdin.
    pub fn spawn(self) -> std::io::Result<Pump> {
        let handle = thread::Builder::new()
            .name(format!("{}-pump", StreamKind::Stdin))
            .spawn(move || self.run())?;
        Ok(Pump {
            stream: StreamKind::Stdin,
            handle,
        })
    }

    fn run(mut self) {
        debug!("stdin pump: started");
        while let Some(chunk) = self.rx.blocking_get() {
            trace!("stdin pump: writing {} bytes", chunk.len());
            if let Err(e) = self.writer.write_all(&chunk) {
                if e.kind() == std::io::ErrorKind::BrokenPipe {
                    debug!("stdin pump: broken pipe");
                } else {
                    error!("stdin pump write error: {}", e);
                }
                return;
            }
            if let Err(e) = self.writer.flush() {
                error!("stdin pump flush error: {}", e);
                return;
            }
        }
        debug!("stdin pump: queue closed");
    }
}
