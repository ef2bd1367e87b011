//! Metronome driven by the run clock

use crate::consts::MICROS_PER_SECOND;

#[derive(Debug, Clone)]
pub struct Metronome {
    bpm: f32,
    enabled: bool,
    last_beat: Option<u64>,
}

impl Metronome {
    pub fn new(bpm: f32, enabled: bool) -> Self {
        Self {
            bpm,
            enabled,
            last_beat: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        self.last_beat = None;
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm;
        self.last_beat = None;
    }

    fn micros_per_beat(&self) -> Option<u64> {
        if self.bpm <= 0.0 {
            return None;
        }
        Some(((60.0 / f64::from(self.bpm)) * MICROS_PER_SECOND as f64) as u64).filter(|&m| m > 0)
    }

    /// True when `run_micros` has reached a beat not yet played
    pub fn tick(&mut self, run_micros: u64) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(per_beat) = self.micros_per_beat() else {
            return false;
        };
        let beat = run_micros / per_beat;
        if self.last_beat.is_some_and(|last| beat <= last) {
            return false;
        }
        self.last_beat = Some(beat);
        true
    }
}
