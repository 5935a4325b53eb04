//! Tahoe/Reno congestion control: slow start, congestion avoidance, fast
//! retransmit on the third duplicate ACK, and (Reno only) fast recovery with
//! partial-ACK window inflation.

use crate::config::Algorithm;

use super::{AckOutcome, CongestionController};

pub struct TahoeReno {
    algorithm: Algorithm,
    cwnd: u32,
    ssthresh: u32,
    dup_ack_count: u32,
    in_fast_recovery: bool,
    recovery_point: i32,
    max_window: u32,
}

impl TahoeReno {
    pub fn new(algorithm: Algorithm, max_window: u32) -> Self {
        Self {
            algorithm,
            cwnd: 1,
            ssthresh: max_window.max(2),
            dup_ack_count: 0,
            in_fast_recovery: false,
            recovery_point: 0,
            max_window,
        }
    }

    fn clamp(&mut self) {
        self.cwnd = self.cwnd.min(self.max_window).max(1);
        self.ssthresh = self.ssthresh.max(2);
    }
}

impl CongestionController for TahoeReno {
    fn cwnd(&self) -> u32 {
        self.cwnd
    }

    fn ssthresh(&self) -> u32 {
        self.ssthresh
    }

    fn in_fast_recovery(&self) -> bool {
        self.in_fast_recovery
    }

    fn dup_ack_count(&self) -> u32 {
        self.dup_ack_count
    }

    fn on_new_ack(&mut self, ack: i32, newly_acked: u32) {
        self.dup_ack_count = 0;

        if self.in_fast_recovery {
            if ack >= self.recovery_point {
                self.in_fast_recovery = false;
                self.cwnd = self.ssthresh;
            } else if self.algorithm == Algorithm::Reno {
                // Partial-ACK inflation.
                self.cwnd = self.cwnd.saturating_add(newly_acked);
            }
        } else if self.cwnd < self.ssthresh {
            // Slow start.
            self.cwnd = self.cwnd.saturating_add(newly_acked);
        } else {
            // Congestion avoidance: cwnd += max(1, newly_acked^2 / cwnd).
            let increase = ((newly_acked as u64 * newly_acked as u64) / self.cwnd as u64)
                .max(1) as u32;
            self.cwnd = self.cwnd.saturating_add(increase);
        }

        self.clamp();
    }

    fn on_duplicate_ack(&mut self, ack: i32) -> AckOutcome {
        self.dup_ack_count += 1;

        if self.dup_ack_count == 3 {
            self.ssthresh = (self.cwnd / 2).max(2);
            match self.algorithm {
                Algorithm::Tahoe => {
                    self.cwnd = 1;
                    self.in_fast_recovery = false;
                }
                Algorithm::Reno => {
                    self.cwnd = self.ssthresh + 3;
                    self.recovery_point = ack;
                    self.in_fast_recovery = true;
                }
            }
            self.dup_ack_count = 0;
            self.clamp();
            return AckOutcome {
                fast_retransmit_seq: Some(ack + 1),
            };
        }

        if self.in_fast_recovery && self.algorithm == Algorithm::Reno {
            self.cwnd = self.cwnd.saturating_add(1);
            self.clamp();
        }

        AckOutcome::NONE
    }

    fn on_timeout(&mut self) {
        self.ssthresh = (self.cwnd / 2).max(2);
        self.cwnd = 1;
        self.in_fast_recovery = false;
    }
}
