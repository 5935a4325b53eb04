//! Tunable constants, collected into one config struct: every knob a
//! production deployment might want to change lives here with its
//! documented default, rather than scattered as bare `const`s through the
//! engine modules.

use std::time::Duration;

/// Congestion-control algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Tahoe,
    Reno,
}

/// All tunables for a sender/receiver pair.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Payload size per DATA segment, in bytes.
    pub chunk_size: usize,
    /// Receiver delivery-buffer capacity, in bytes.
    pub rcv_buffer: usize,
    /// Upper bound on cwnd, in segments.
    pub max_window: u32,
    /// Minimum gap between persist probes.
    pub persist_interval: Duration,
    /// Delayed-ACK deadline.
    pub delayed_ack: Duration,
    /// Minimum gap between timeout scans.
    pub timeout_check: Duration,
    /// Application-read drain cadence.
    pub app_drain_interval: Duration,
    /// Application-read drain size per tick.
    pub app_drain_size: usize,
    /// Minimum retransmission timeout.
    pub rto_min: Duration,
    /// Sender main-loop pacing delay.
    pub pacing_delay: Duration,
    /// Probability that an inbound DATA/PROBE/END frame is dropped.
    pub p_data_loss: f64,
    /// Probability that an outbound ACK frame is dropped.
    pub p_ack_loss: f64,
    /// Congestion-control algorithm.
    pub algorithm: Algorithm,
    /// Optional cap on retransmission attempts per segment before
    /// `TransferAborted` is raised. `None` means retry indefinitely.
    pub max_retries: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5120,
            rcv_buffer: 262_144,
            max_window: 128,
            persist_interval: Duration::from_millis(1000),
            delayed_ack: Duration::from_millis(200),
            timeout_check: Duration::from_millis(50),
            app_drain_interval: Duration::from_millis(100),
            app_drain_size: 8 * 1024,
            rto_min: Duration::from_millis(200),
            pacing_delay: Duration::from_millis(5),
            p_data_loss: 0.10,
            p_ack_loss: 0.01,
            algorithm: Algorithm::Reno,
            max_retries: None,
        }
    }
}

impl EngineConfig {
    /// A config with all loss simulation disabled; useful for deterministic
    /// tests that want to exercise windowing/ACK logic without randomness.
    pub fn lossless(mut self) -> Self {
        self.p_data_loss = 0.0;
        self.p_ack_loss = 0.0;
        self
    }

    /// Rwnd, advertised in bytes, expressed in whole segments.
    pub fn segments(&self, bytes: i32) -> i32 {
        (bytes as i64 / self.chunk_size as i64) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.chunk_size, 5120);
        assert_eq!(cfg.rcv_buffer, 262_144);
        assert_eq!(cfg.max_window, 128);
        assert_eq!(cfg.rto_min, Duration::from_millis(200));
        assert_eq!(cfg.p_data_loss, 0.10);
        assert_eq!(cfg.p_ack_loss, 0.01);
    }

    #[test]
    fn lossless_zeroes_probabilities() {
        let cfg = EngineConfig::default().lossless();
        assert_eq!(cfg.p_data_loss, 0.0);
        assert_eq!(cfg.p_ack_loss, 0.0);
    }

    #[test]
    fn segments_conversion_truncates() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.segments(10_240), 2);
        assert_eq!(cfg.segments(10_241), 2);
        assert_eq!(cfg.segments(0), 0);
    }
}
