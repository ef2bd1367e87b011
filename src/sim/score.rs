//! Run statistics and scoring
//!
//! `score = hits × 10 × sqrt(hits / shots) × (60 / duration_seconds)`, which
//! rewards volume and accuracy and normalizes runs of any length to a nominal
//! minute. A run without shots has no score.

use serde::{Deserialize, Serialize};

use crate::consts::{NOMINAL_RUN_SECONDS, POINTS_PER_HIT};

/// Counters accumulated by one scenario run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStats {
    pub targets_hit: u32,
    pub shots_taken: u32,
    /// Fractional credit from partially drained targets
    #[serde(default)]
    pub partial_hits: f32,
    pub hit_percent: f32,
    pub score: f32,
    pub duration_seconds: f32,
}

impl ScenarioStats {
    /// Whole hits plus partial credit
    #[inline]
    pub fn effective_hits(&self) -> f32 {
        self.targets_hit as f32 + self.partial_hits
    }

    /// Fill in the derived fields. Returns false for a no-score run.
    pub fn finalize(&mut self, duration_seconds: f32) -> bool {
        self.duration_seconds = duration_seconds;
        match compute_score(self.effective_hits(), self.shots_taken, duration_seconds) {
            Some((hit_percent, score)) => {
                self.hit_percent = hit_percent;
                self.score = score;
                true
            }
            None => {
                self.hit_percent = 0.0;
                self.score = 0.0;
                false
            }
        }
    }
}

/// Compute `(hit_percent, score)`; `None` when there were no shots or no duration
pub fn compute_score(hits: f32, shots: u32, duration_seconds: f32) -> Option<(f32, f32)> {
    if shots == 0 {
        return None;
    }
    if duration_seconds <= 0.0 {
        log::warn!("cannot score a run of {duration_seconds} seconds");
        return None;
    }
    let hit_percent = hits / shots as f32;
    let score = hits * POINTS_PER_HIT * hit_percent.max(0.0).sqrt() * (NOMINAL_RUN_SECONDS / duration_seconds);
    Some((hit_percent, score))
}
