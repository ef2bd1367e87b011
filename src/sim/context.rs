//! Explicit simulation context
//!
//! Carries the seeded RNG (and the log target used for this run) so nothing
//! in the simulation reaches for process-wide state.

use rand::SeedableRng;
use rand_pcg::Pcg32;

#[derive(Debug, Clone)]
pub struct SimContext {
    pub seed: u64,
    pub rng: Pcg32,
    /// `log` target for messages about this run
    pub log_target: String,
}

impl SimContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            log_target: "aim_sim::scenario".to_string(),
        }
    }

    pub fn with_log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }
}
