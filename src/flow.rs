//! Receiver-side flow control accounting.
//!
//! Saturating byte bookkeeping rather than a signed counter, covering the
//! single receive window this protocol needs.

use std::time::{Duration, Instant};

/// Tracks how much of the receive buffer is occupied and advertises the
/// remaining window to the sender.
pub struct FlowState {
    rcv_buffer: usize,
    /// Bytes delivered in-order to the application but not yet drained by
    /// the app-read loop.
    buffered_for_app: usize,
    last_drain: Option<Instant>,
    drain_interval: Duration,
    drain_size: usize,
}

impl FlowState {
    pub fn new(rcv_buffer: usize, drain_interval: Duration, drain_size: usize) -> Self {
        Self {
            rcv_buffer,
            buffered_for_app: 0,
            last_drain: None,
            drain_interval,
            drain_size,
        }
    }

    /// Bytes newly delivered in-order from the reorder buffer, pending
    /// application drain.
    pub fn on_delivered(&mut self, bytes: usize) {
        self.buffered_for_app = self.buffered_for_app.saturating_add(bytes);
    }

    /// Advertised receive window: `max(0, RCV_BUFFER - used - reorder_bytes)`.
    pub fn advertised_rwnd(&self, reorder_bytes: usize) -> i32 {
        let used = self.buffered_for_app.saturating_add(reorder_bytes);
        self.rcv_buffer.saturating_sub(used) as i32
    }

    /// Drain up to `drain_size` bytes to the application if the drain
    /// interval has elapsed. Returns the number of bytes freed.
    pub fn drain(&mut self, now: Instant) -> usize {
        let due = match self.last_drain {
            None => true,
            Some(last) => now.duration_since(last) >= self.drain_interval,
        };
        if !due {
            return 0;
        }
        self.last_drain = Some(now);
        let freed = self.buffered_for_app.min(self.drain_size);
        self.buffered_for_app -= freed;
        freed
    }
}
