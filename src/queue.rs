//! Unbounded, order-preserving byte-chunk queue.
//!
//! One queue exists per stream direction. Each has exactly one producer and
//! one consumer: a pump on one side and the command runner on the other.
//! There is no capacity limit, so a child that writes faster than the runner
//! consumes grows memory without bound.

use tokio::sync::mpsc;

/// Create a new byte queue, returning its producer and consumer halves.
pub fn byte_queue() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Producer half of a [`byte_queue`].
#[derive(Debug)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl QueueSender {
    /// Append a chunk to the tail of the queue.
    ///
    /// Never blocks. Returns `false` once the consumer is gone, at which
    /// point the chunk is discarded.
    pub fn put(&self, chunk: impl Into<Vec<u8>>) -> bool {
        self.tx.send(chunk.into()).is_ok()
    }

    /// Check whether the consumer half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of a [`byte_queue`].
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl QueueReceiver {
    /// Wait for the next chunk.
    ///
    /// Returns `None` once the producer is gone and every queued chunk has
    /// been taken.
    pub async fn get(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Block the current thread until the next chunk is available.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context.
    pub fn blocking_get(&mut self) -> Option<Vec<u8>> {
        self.rx.blocking_recv()
    }
}
