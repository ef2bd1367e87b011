//! High score leaderboards
//!
//! One top-10 board per scenario id, persisted as a JSON document.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence;
use crate::sim::score::ScenarioStats;

/// Maximum number of entries kept per scenario
pub const MAX_HIGH_SCORES: usize = 10;

/// A single finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: f32,
    pub hit_percent: f32,
    pub targets_hit: u32,
    pub shots_taken: u32,
    /// Unix timestamp (seconds) when achieved
    pub timestamp: u64,
}

impl HighScoreEntry {
    pub fn from_stats(stats: &ScenarioStats, timestamp: u64) -> Self {
        Self {
            score: stats.score,
            hit_percent: stats.hit_percent,
            targets_hit: stats.targets_hit,
            shots_taken: stats.shots_taken,
            timestamp,
        }
    }
}

/// Leaderboards keyed by scenario id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    #[serde(default)]
    pub boards: BTreeMap<String, Vec<HighScoreEntry>>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for a scenario, best first
    pub fn entries(&self, scenario_id: &str) -> &[HighScoreEntry] {
        self.boards.get(scenario_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if a score qualifies for a scenario's board
    pub fn qualifies(&self, scenario_id: &str, score: f32) -> bool {
        if score <= 0.0 {
            return false;
        }
        let entries = self.entries(scenario_id);
        if entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Must beat the lowest entry
        entries.last().is_none_or(|e| score > e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, scenario_id: &str, score: f32) -> Option<usize> {
        if !self.qualifies(scenario_id, score) {
            return None;
        }
        let entries = self.entries(scenario_id);
        let rank = entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(entries.len()) + 1)
    }

    /// Record a finished run. Returns the rank achieved (1-indexed) or None.
    pub fn add_score(&mut self, scenario_id: &str, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(scenario_id, entry.score) {
            return None;
        }
        let entries = self.boards.entry(scenario_id.to_string()).or_default();

        // Sorted descending by score; ties keep the older run first
        let rank = match entries.iter().position(|e| entry.score > e.score) {
            Some(i) => {
                entries.insert(i, entry);
                i + 1
            }
            None => {
                entries.push(entry);
                entries.len()
            }
        };
        entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.boards.values().all(Vec::is_empty)
    }

    /// Best score for a scenario (if any)
    pub fn top_score(&self, scenario_id: &str) -> Option<f32> {
        self.entries(scenario_id).first().map(|e| e.score)
    }

    /// Load leaderboards from a JSON file, starting fresh on any problem
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No high scores found, starting fresh");
            return Self::new();
        }
        match persistence::load_json::<HighScores>(path) {
            Ok(scores) => {
                log::info!("Loaded high scores for {} scenarios", scores.boards.len());
                scores
            }
            Err(err) => {
                log::warn!("{err}; starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) {
        match persistence::save_json(path, self) {
            Ok(()) => log::info!("High scores saved ({} scenarios)", self.boards.len()),
            Err(err) => log::warn!("{err}"),
        }
    }
}
