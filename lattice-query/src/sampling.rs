//! Deposit-address resolution sampling
//!
//! Bounds on-chain call volume for large batches. Small batches resolve
//! every address; large batches resolve while few salted commands remain
//! unresolved, and probabilistically past that. Unresolved addresses are
//! picked up by later enrichment passes.

use lattice_core::SamplingConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Mutex;

/// Decides whether a deposit address should be resolved this pass.
pub struct DepositSampler {
    config: SamplingConfig,
    rng: Mutex<StdRng>,
}

impl DepositSampler {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic sampler for tests.
    pub fn with_seed(config: SamplingConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Whether to attempt resolution for a command in a batch of
    /// `batch_size` commands, of which `unresolved_salted` carried a
    /// salt but no address before this pass started.
    pub fn should_resolve(&self, batch_size: usize, unresolved_salted: usize) -> bool {
        if batch_size < self.config.small_batch_max {
            return true;
        }
        if unresolved_salted < self.config.unresolved_salted_max {
            return true;
        }
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.random::<f64>() < self.config.sample_rate
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }
}

impl std::fmt::Debug for DepositSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositSampler")
            .field("config", &self.config)
            .finish()
    }
}
