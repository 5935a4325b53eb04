//! RTT estimation using Jacobson/Karels smoothing.
//!
//! est_rtt <- (1-a)*est_rtt + a*S
//! dev_rtt <- (1-b)*dev_rtt + b*|S - est_rtt|
//! rto     <- max(RTO_MIN, est_rtt + 4*dev_rtt)
//!
//! Unlike RFC 6298 implementations that special-case the first sample, this
//! estimator starts from fixed initial constants and applies the same
//! smoothing formula to every sample, including the first.

use std::time::Duration;

const ALPHA: f64 = 0.125;
const BETA: f64 = 0.25;

const INITIAL_EST_RTT_MS: f64 = 1000.0;
const INITIAL_DEV_RTT_MS: f64 = 100.0;
const INITIAL_RTO_MS: f64 = 1400.0;

/// RTT estimator implementing Jacobson/Karels smoothing.
#[derive(Debug, Clone)]
pub struct RttEstimator {
    est_rtt_ms: f64,
    dev_rtt_ms: f64,
    rto_ms: f64,
    rto_min: Duration,
}

impl RttEstimator {
    pub fn new(rto_min: Duration) -> Self {
        Self {
            est_rtt_ms: INITIAL_EST_RTT_MS,
            dev_rtt_ms: INITIAL_DEV_RTT_MS,
            rto_ms: INITIAL_RTO_MS,
            rto_min,
        }
    }

    /// Feed a fresh RTT sample. Per Karn's rule, callers must never call this
    /// for a segment that was retransmitted before being acknowledged.
    pub fn update(&mut self, sample: Duration) {
        let sample_ms = sample.as_secs_f64() * 1000.0;
        self.est_rtt_ms = (1.0 - ALPHA) * self.est_rtt_ms + ALPHA * sample_ms;
        self.dev_rtt_ms =
            (1.0 - BETA) * self.dev_rtt_ms + BETA * (sample_ms - self.est_rtt_ms).abs();
        let floor_ms = self.rto_min.as_secs_f64() * 1000.0;
        self.rto_ms = (self.est_rtt_ms + 4.0 * self.dev_rtt_ms).max(floor_ms);
    }

    pub fn est_rtt(&self) -> Duration {
        Duration::from_secs_f64(self.est_rtt_ms / 1000.0)
    }

    pub fn dev_rtt(&self) -> Duration {
        Duration::from_secs_f64(self.dev_rtt_ms / 1000.0)
    }

    pub fn rto(&self) -> Duration {
        Duration::from_secs_f64(self.rto_ms / 1000.0)
    }
}
