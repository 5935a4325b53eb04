//! Independent Bernoulli loss simulation on the data and ACK paths.
//! Seedable so tests can reproduce a specific loss pattern.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Drop decisions for the two simulated paths. Each call draws an
/// independent Bernoulli sample.
pub struct LossSimulator {
    rng: StdRng,
    p_data_loss: f64,
    p_ack_loss: f64,
}

impl LossSimulator {
    /// Seed from OS entropy.
    pub fn new(p_data_loss: f64, p_ack_loss: f64) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            p_data_loss,
            p_ack_loss,
        }
    }

    /// Seed deterministically, for reproducible tests.
    pub fn from_seed(seed: u64, p_data_loss: f64, p_ack_loss: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            p_data_loss,
            p_ack_loss,
        }
    }

    /// Draw the ingress (data-path) drop decision.
    pub fn drop_data(&mut self) -> bool {
        self.p_data_loss > 0.0 && self.rng.random::<f64>() < self.p_data_loss
    }

    /// Draw the ACK-egress drop decision.
    pub fn drop_ack(&mut self) -> bool {
        self.p_ack_loss > 0.0 && self.rng.random::<f64>() < self.p_ack_loss
    }
}
