//! Delayed-ACK scheduler implementing an "every-other-segment or timeout"
//! coalescing policy as an explicit, pollable state machine rather than a
//! spawned timer task.

use std::time::{Duration, Instant};

/// Outcome of feeding an event into the scheduler: whether an ACK should be
/// emitted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckAction {
    /// No ACK to send yet; a deadline is (or remains) pending.
    Deferred,
    /// Emit the cumulative ACK now.
    EmitNow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Pending,
}

/// Tracks whether an in-order delivery should trigger an immediate ACK or a
/// deferred one.
pub struct DelayedAckScheduler {
    state: State,
    deadline: Option<Instant>,
    delay: Duration,
}

impl DelayedAckScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: State::Idle,
            deadline: None,
            delay,
        }
    }

    /// Call on every in-order delivery. `now` is the current time.
    pub fn on_in_order_delivery(&mut self, now: Instant) -> AckAction {
        match self.state {
            State::Idle => {
                self.state = State::Pending;
                self.deadline = Some(now + self.delay);
                AckAction::Deferred
            }
            State::Pending => {
                self.state = State::Idle;
                self.deadline = None;
                AckAction::EmitNow
            }
        }
    }

    /// Call any time an immediate ACK is emitted for another reason
    /// (out-of-order arrival, duplicate, PROBE, buffer-full discard, END).
    /// Any pending deadline is considered satisfied.
    pub fn on_immediate_ack(&mut self) {
        self.state = State::Idle;
        self.deadline = None;
    }

    /// Poll for timer expiry. Returns `EmitNow` and resets to idle if the
    /// pending deadline has passed.
    pub fn poll(&mut self, now: Instant) -> AckAction {
        match (self.state, self.deadline) {
            (State::Pending, Some(deadline)) if now >= deadline => {
                self.state = State::Idle;
                self.deadline = None;
                AckAction::EmitNow
            }
            _ => AckAction::Deferred,
        }
    }

    /// Time remaining until the pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
