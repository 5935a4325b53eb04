//! Byte-stream transport abstraction: the engines treat the channel below
//! them as an opaque, ordered, reliable carrier of frame bytes, so any
//! transport that preserves ordering can be substituted.
//!
//! A single channel trait covers both directions, since this protocol needs
//! only one message shape per direction and treats the transport itself as
//! opaque. Frames are carried as length-prefixed datagrams so a stream
//! transport (`TcpFrameChannel`) and a message-passing one (`LocalChannel`)
//! share the same interface.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use crossbeam_queue::SegQueue;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;

use crate::error::{Result, TcpliteError};

/// A transport carrying opaque frame bytes in one direction per method:
/// `send` pushes a frame out, `recv` waits for the next inbound one.
pub trait FrameChannel: Send {
    fn send_frame(&mut self, payload: Bytes) -> impl std::future::Future<Output = Result<()>> + Send;
    fn recv_frame(&mut self) -> impl std::future::Future<Output = Result<Bytes>> + Send;
}

/// Adapter over a `tokio::net::TcpStream`, framing each datagram with a
/// `u32` big-endian length prefix since TCP itself has no message
/// boundaries.
pub struct TcpFrameChannel {
    stream: TcpStream,
}

impl TcpFrameChannel {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

impl FrameChannel for TcpFrameChannel {
    async fn send_frame(&mut self, payload: Bytes) -> Result<()> {
        let mut header = BytesMut::with_capacity(4);
        header.put_u32(payload.len() as u32);
        self.stream
            .write_all(&header)
            .await
            .map_err(|_| TcpliteError::ChannelClosed)?;
        self.stream
            .write_all(&payload)
            .await
            .map_err(|_| TcpliteError::ChannelClosed)?;
        Ok(())
    }

    async fn recv_frame(&mut self) -> Result<Bytes> {
        let mut header = [0u8; 4];
        self.stream
            .read_exact(&mut header)
            .await
            .map_err(|_| TcpliteError::ChannelClosed)?;
        let len = (&header[..]).get_u32() as usize;
        let mut buf = vec![0u8; len];
        self.stream
            .read_exact(&mut buf)
            .await
            .map_err(|_| TcpliteError::ChannelClosed)?;
        Ok(Bytes::from(buf))
    }
}

struct QueuePair {
    queue: SegQueue<Bytes>,
    notify: Notify,
}

impl QueuePair {
    fn new() -> Self {
        Self {
            queue: SegQueue::new(),
            notify: Notify::new(),
        }
    }

    fn push(&self, item: Bytes) {
        self.queue.push(item);
        self.notify.notify_one();
    }

    async fn pop(&self) -> Bytes {
        loop {
            if let Some(item) = self.queue.pop() {
                return item;
            }
            self.notify.notified().await;
        }
    }
}

/// In-memory, lock-free channel pair backed by `crossbeam_queue::SegQueue`.
/// Used by integration tests and benches to drive the engines without a
/// real socket. `LocalChannel::pair` returns the two opposing ends.
pub struct LocalChannel {
    outbound: Arc<QueuePair>,
    inbound: Arc<QueuePair>,
}

impl LocalChannel {
    pub fn pair() -> (Self, Self) {
        let a = Arc::new(QueuePair::new());
        let b = Arc::new(QueuePair::new());
        (
            Self {
                outbound: a.clone(),
                inbound: b.clone(),
            },
            Self {
                outbound: b,
                inbound: a,
            },
        )
    }
}

impl FrameChannel for LocalChannel {
    async fn send_frame(&mut self, payload: Bytes) -> Result<()> {
        self.outbound.push(payload);
        Ok(())
    }

    async fn recv_frame(&mut self) -> Result<Bytes> {
        Ok(self.inbound.pop().await)
    }
}
