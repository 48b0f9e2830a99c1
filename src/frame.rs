//! Sentinel-delimited frame assembly.
//!
//! A frame is every byte the child wrote on one stream before a [`SENTINEL`].
//! Pumps read in chunks, so a single chunk may end one frame and begin the
//! next. Bytes after a sentinel are held back for the following frame on the
//! same stream; no byte ever belongs to two frames.

use crate::error::ShellError;
use crate::process::StreamKind;
use crate::queue::QueueReceiver;
use crate::Result;

/// Frame terminator. Must never appear inside a payload.
pub const SENTINEL: u8 = 0x00;

/// Reassembles frames from one output queue.
#[derive(Debug)]
pub struct FrameReader {
    rx: QueueReceiver,
    stream: StreamKind,
    pending: Vec<u8>,
    // Prefix of `pending` already known to hold no sentinel.
    scanned: usize,
}

impl FrameReader {
    /// Create a reader over the queue fed by `stream`'s pump.
    pub fn new(rx: QueueReceiver, stream: StreamKind) -> Self {
        Self {
            rx,
            stream,
            pending: Vec::new(),
            scanned: 0,
        }
    }

    /// The stream this reader assembles frames from.
    pub fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Wait for the next complete frame, sentinel excluded.
    ///
    /// A sentinel with nothing before it yields an empty frame. Fails with
    /// [`ShellError::StreamClosed`] if the stream ends mid-frame.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(frame) = self.take_frame() {
                return Ok(frame);
            }
            match self.rx.get().await {
                Some(chunk) => self.pending.extend_from_slice(&chunk),
                None => return Err(ShellError::StreamClosed(self.stream)),
            }
        }
    }

    /// Number of bytes received past the last complete frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Split off the first complete frame in `pending`, if any.
    ///
    /// Only bytes that arrived since the last call are searched, so a frame
    /// of any size is assembled in linear time.
    fn take_frame(&mut self) -> Option<Vec<u8>> {
        let Some(offset) = self.pending[self.scanned..]
            .iter()
            .position(|&b| b == SENTINEL)
        else {
            self.scanned = self.pending.len();
            return None;
        };
        let end = self.scanned + offset;
        let rest = self.pending.split_off(end + 1);
        let mut frame = std::mem::replace(&mut self.pending, rest);
        frame.truncate(end);
        self.scanned = 0;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::byte_queue;

    fn reader_with(chunks: &[&[u8]]) -> FrameReader {
        let (tx, rx) = byte_queue();
        for chunk in chunks {
            tx.put(*chunk);
        }
        FrameReader::new(rx, StreamKind::Stdout)
    }

    #[tokio::test]
    async fn test_single_byte_chunks() {
        let mut reader = reader_with(&[b"1", b"\n", b"\0"]);
        assert_eq!(reader.stream(), StreamKind::Stdout);
        assert_eq!(reader.read_frame().await.unwrap(), b"1\n");
    }

    #[tokio::test]
    async fn test_empty_frame() {
        let mut reader = reader_with(&[b"\0", b"0\0"]);
        assert_eq!(reader.read_frame().await.unwrap(), b"");
        assert_eq!(reader.read_frame().await.unwrap(), b"0");
    }

    #[tokio::test]
    async fn test_chunk_spanning_frames() {
        // Output frame and status frame arrive in one read.
        let mut reader = reader_with(&[b"hello\n\x000\0"]);
        assert_eq!(reader.read_frame().await.unwrap(), b"hello\n");
        assert_eq!(reader.pending_len(), 2);
        assert_eq!(reader.read_frame().await.unwrap(), b"0");
        assert_eq!(reader.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_frame_split_across_chunks() {
        let mut reader = reader_with(&[b"hel", b"lo", b"\0next", b"\0"]);
        assert_eq!(reader.read_frame().await.unwrap(), b"hello");
        assert_eq!(reader.read_frame().await.unwrap(), b"next");
    }

    #[tokio::test]
    async fn test_stream_closed_mid_frame() {
        let (tx, rx) = byte_queue();
        tx.put(b"partial".to_vec());
        drop(tx);

        let mut reader = FrameReader::new(rx, StreamKind::Stderr);
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, ShellError::StreamClosed(StreamKind::Stderr)));
    }

    #[tokio::test]
    async fn test_sentinel_after_partial_scan() {
        let (tx, rx) = byte_queue();
        let mut reader = FrameReader::new(rx, StreamKind::Stdout);
        tx.put(b"abc".to_vec());
        tx.put(b"def\0gh".to_vec());
        tx.put(b"i\0".to_vec());

        assert_eq!(reader.read_frame().await.unwrap(), b"abcdef");
        assert_eq!(reader.read_frame().await.unwrap(), b"ghi");
        assert_eq!(reader.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_large_frame_assembled_in_linear_time() {
        const SIZE: usize = 16 * 1024 * 1024;
        let (tx, rx) = byte_queue();
        let block = vec![b'o'; 4096];
        for _ in 0..SIZE / block.len() {
            tx.put(block.clone());
        }
        tx.put([SENTINEL]);

        let mut reader = FrameReader::new(rx, StreamKind::Stdout);
        let start = std::time::Instant::now();
        let frame = reader.read_frame().await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(frame.len(), SIZE);
        // Rescanning from the start after each chunk takes minutes here.
        assert!(
            elapsed < std::time::Duration::from_secs(10),
            "16 MiB frame took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_arbitrary_payload_preserved() {
        let payload: Vec<u8> = (1..=255u8).cycle().take(10_000).collect();
        let mut chunks: Vec<&[u8]> = payload.chunks(333).collect();
        chunks.push(b"\0");

        let mut reader = reader_with(&chunks);
        assert_eq!(reader.read_frame().await.unwrap(), payload);
    }
}
