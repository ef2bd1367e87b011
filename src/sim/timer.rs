//! Scenario clocks
//!
//! Three clocks share one pausable stopwatch primitive:
//! - frame clock: wall time since the loop attached, only used to throttle renders
//! - run clock: pauses with the scenario, drives durations and movement
//! - replay frame counter: run time quantized to the replay frame rate
//!
//! The caller supplies "now" in microseconds from any monotonic source, which
//! keeps the simulation free of hidden wall-clock reads.

use std::time::Instant;

use crate::consts::MICROS_PER_SECOND;
use crate::micros_to_seconds;

/// Pausable elapsed-time accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    accumulated: u64,
    running_since: Option<u64>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) counting at `now`; no-op while running
    pub fn start(&mut self, now: u64) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Stop counting at `now`, keeping the time accumulated so far
    pub fn stop(&mut self, now: u64) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_sub(since);
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = 0;
        self.running_since = None;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Elapsed microseconds as of `now`
    #[inline]
    pub fn elapsed(&self, now: u64) -> u64 {
        self.accumulated
            + self
                .running_since
                .map_or(0, |since| now.saturating_sub(since))
    }
}

/// Monotonic microsecond source for live loops
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// The frame / run / replay-frame clocks of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioTimer {
    frame: Stopwatch,
    run: Stopwatch,
    micros_per_replay_frame: u64,
    render_budget_micros: u64,
    now: u64,
    replay_frame: u64,
    last_replay_frame: Option<u64>,
    last_render: Option<u64>,
}

impl ScenarioTimer {
    pub fn new(replay_fps: u32, render_budget_micros: u64) -> Self {
        Self {
            frame: Stopwatch::new(),
            run: Stopwatch::new(),
            micros_per_replay_frame: MICROS_PER_SECOND / u64::from(replay_fps.max(1)),
            render_budget_micros,
            now: 0,
            replay_frame: 0,
            last_replay_frame: None,
            last_render: None,
        }
    }

    /// Start both the frame and run clocks
    pub fn start(&mut self, now: u64) {
        self.now = now;
        self.frame.start(now);
        self.run.start(now);
    }

    /// Freeze the run clock; the frame clock keeps going
    pub fn pause(&mut self, now: u64) {
        self.now = now;
        self.run.stop(now);
    }

    pub fn resume(&mut self, now: u64) {
        self.now = now;
        self.run.start(now);
    }

    pub fn is_paused(&self) -> bool {
        !self.run.is_running()
    }

    /// Advance to `now` and recompute the replay frame.
    ///
    /// Returns true when this tick starts a new replay frame.
    pub fn tick(&mut self, now: u64) -> bool {
        self.now = now;
        self.replay_frame = self.run.elapsed(now) / self.micros_per_replay_frame;
        let is_new = self.last_replay_frame != Some(self.replay_frame);
        self.last_replay_frame = Some(self.replay_frame);
        is_new
    }

    /// Whether a render is due: forced by a state change or the budget elapsed
    pub fn should_render(&mut self, force: bool) -> bool {
        let frame_now = self.frame.elapsed(self.now);
        let due = match self.last_render {
            None => true,
            Some(last) => frame_now.saturating_sub(last) >= self.render_budget_micros,
        };
        if force || due {
            self.last_render = Some(frame_now);
            true
        } else {
            false
        }
    }

    pub fn set_render_budget(&mut self, micros: u64) {
        self.render_budget_micros = micros;
    }

    #[inline]
    pub fn run_micros(&self) -> u64 {
        self.run.elapsed(self.now)
    }

    #[inline]
    pub fn run_seconds(&self) -> f32 {
        micros_to_seconds(self.run_micros())
    }

    #[inline]
    pub fn frame_micros(&self) -> u64 {
        self.frame.elapsed(self.now)
    }

    #[inline]
    pub fn replay_frame(&self) -> u64 {
        self.replay_frame
    }

    #[inline]
    pub fn micros_per_replay_frame(&self) -> u64 {
        self.micros_per_replay_frame
    }

    /// Run time at which `frame` begins
    #[inline]
    pub fn replay_frame_start(&self, frame: u64) -> u64 {
        frame * self.micros_per_replay_frame
    }

    /// Run time at which the current replay frame began
    #[inline]
    pub fn current_frame_start(&self) -> u64 {
        self.replay_frame_start(self.replay_frame)
    }
}
