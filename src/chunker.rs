//! External collaborators at the sender/receiver's I/O edges: the chunk
//! source the sender reads from, and the delivery sink the receiver writes
//! to. Kept as trait objects so callers can plug in a file, an in-memory
//! buffer, or anything else without the engines knowing the difference.

use bytes::Bytes;

use crate::error::Result;

/// Supplies the sender with fixed-size chunks of the file being transferred.
pub trait ChunkSource: Send {
    /// Returns the next chunk, or `None` once the source is exhausted.
    fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// Receives in-order payload bytes as the receiver delivers them.
pub trait DeliverySink: Send {
    fn deliver(&mut self, payload: Bytes) -> Result<()>;

    /// Called once the receiver has processed an END segment.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory chunk source splitting a byte buffer into `chunk_size` pieces.
pub struct SliceChunker {
    data: Bytes,
    offset: usize,
    chunk_size: usize,
}

impl SliceChunker {
    pub fn new(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self {
            data: data.into(),
            offset: 0,
            chunk_size,
        }
    }
}

impl ChunkSource for SliceChunker {
    fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.offset >= self.data.len() {
            return Ok(None);
        }
        let end = (self.offset + self.chunk_size).min(self.data.len());
        let chunk = self.data.slice(self.offset..end);
        self.offset = end;
        Ok(Some(chunk))
    }
}

/// In-memory, order-preserving delivery sink.
#[derive(Default)]
pub struct VecSink {
    pub received: Vec<u8>,
    pub finished: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeliverySink for VecSink {
    fn deliver(&mut self, payload: Bytes) -> Result<()> {
        self.received.extend_from_slice(&payload);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
