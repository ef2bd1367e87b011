//! Replay recording and playback
//!
//! Every target mutation and shot is logged against the replay frame counter,
//! never the wall clock, and the camera is sampled once per replay frame into
//! a dense pitch/yaw array. Playback drives the same [`TargetStore`] from the
//! log, so a replay at the recorded frame rate reproduces the run exactly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::room::RoomDef;
use super::store::TargetStore;
use super::target::{LinearMotion, PillDef, Target, TargetGrowth, TargetId};
use super::timer::ScenarioTimer;
use crate::audio::SoundEffect;
use crate::consts::{DEFAULT_REPLAY_FPS, REPLAY_RENDER_BUDGET_MICROS};

/// A single recorded mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    AddTarget {
        target_id: TargetId,
        /// Wall-space position
        position: Vec2,
        radius: f32,
        #[serde(default)]
        ghost: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        growth: Option<TargetGrowth>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pill: Option<PillDef>,
    },
    KillTarget {
        target_id: TargetId,
    },
    RemoveTarget {
        target_id: TargetId,
    },
    MoveLinearTarget {
        target_id: TargetId,
        /// Wall-space position at the start of the event's frame
        position: Vec2,
        direction: Vec2,
        distance_per_second: f32,
    },
    ShotFired,
    /// Event kinds from newer documents; skipped on playback
    #[serde(other)]
    Unknown,
}

/// An event tagged with the replay frame it happened in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub frame_number: u64,
    pub event: ReplayEvent,
}

/// Append-only log for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayLog {
    events: Vec<RecordedEvent>,
    /// Interleaved pitch, yaw (degrees), indexed by frame
    pitch_yaws: Vec<f32>,
}

impl ReplayLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, frame_number: u64, event: ReplayEvent) {
        self.events.push(RecordedEvent {
            frame_number,
            event,
        });
    }

    /// Store the camera for `frame`, repeating the previous sample over any gap
    pub fn record_pitch_yaw(&mut self, frame: u64, pitch: f32, yaw: f32) {
        let frame = frame as usize;
        let recorded = self.frame_count();
        if frame < recorded {
            self.pitch_yaws[frame * 2] = pitch;
            self.pitch_yaws[frame * 2 + 1] = yaw;
            return;
        }
        let (fill_pitch, fill_yaw) = self
            .pitch_yaw(recorded.saturating_sub(1) as u64)
            .unwrap_or((pitch, yaw));
        for _ in recorded..frame {
            self.pitch_yaws.push(fill_pitch);
            self.pitch_yaws.push(fill_yaw);
        }
        self.pitch_yaws.push(pitch);
        self.pitch_yaws.push(yaw);
    }

    pub fn pitch_yaw(&self, frame: u64) -> Option<(f32, f32)> {
        pitch_yaw_at(&self.pitch_yaws, frame)
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Number of frames with a camera sample
    pub fn frame_count(&self) -> usize {
        self.pitch_yaws.len() / 2
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.pitch_yaws.clear();
    }

    pub fn into_doc(self, room: RoomDef, frames_per_second: u32) -> ReplayDoc {
        ReplayDoc {
            room,
            frames_per_second,
            pitch_yaws: self.pitch_yaws,
            events: self.events,
        }
    }
}

fn pitch_yaw_at(pitch_yaws: &[f32], frame: u64) -> Option<(f32, f32)> {
    let i = usize::try_from(frame).ok()?.checked_mul(2)?;
    match (pitch_yaws.get(i), pitch_yaws.get(i + 1)) {
        (Some(&pitch), Some(&yaw)) => Some((pitch, yaw)),
        _ => None,
    }
}

fn default_fps() -> u32 {
    DEFAULT_REPLAY_FPS
}

/// Serializable replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDoc {
    pub room: RoomDef,
    #[serde(default = "default_fps")]
    pub frames_per_second: u32,
    #[serde(default)]
    pub pitch_yaws: Vec<f32>,
    #[serde(default)]
    pub events: Vec<RecordedEvent>,
}

/// Apply one event to a store. `frame_start_micros` is when its frame began.
///
/// Returns the sound the event makes, if any.
pub fn apply_event(store: &mut TargetStore, event: &ReplayEvent, frame_start_micros: u64) -> Option<SoundEffect> {
    match event {
        ReplayEvent::AddTarget {
            target_id,
            position,
            radius,
            ghost,
            growth,
            pill,
        } => {
            let mut target = Target::new(*position, *radius);
            target.id = *target_id;
            target.ghost = *ghost;
            target.growth = *growth;
            target.pill = *pill;
            target.spawn_micros = frame_start_micros;
            if *ghost {
                store.promote_ghosts();
            }
            store.add_target(target);
            None
        }
        ReplayEvent::KillTarget { target_id } => {
            store.remove_target(*target_id);
            Some(SoundEffect::Kill)
        }
        ReplayEvent::RemoveTarget { target_id } => {
            store.remove_target(*target_id);
            None
        }
        ReplayEvent::MoveLinearTarget {
            target_id,
            position,
            direction,
            distance_per_second,
        } => {
            if let Some(target) = store.get_mut(*target_id) {
                target.wall_position = *position;
                // Directions are recorded already normalized
                target.motion = Some(LinearMotion {
                    origin: *position,
                    direction: *direction,
                    speed: *distance_per_second,
                    start_micros: frame_start_micros,
                });
            }
            None
        }
        ReplayEvent::ShotFired => Some(SoundEffect::Shoot),
        ReplayEvent::Unknown => None,
    }
}

/// One playback tick
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackStep {
    Frame {
        frame: u64,
        pitch: f32,
        yaw: f32,
        new_frame: bool,
        render: bool,
        sounds: Vec<SoundEffect>,
    },
    /// The camera samples are exhausted
    Ended,
}

/// Replays a [`ReplayDoc`] against its own run clock
#[derive(Debug, Clone)]
pub struct ReplayPlayer {
    doc: ReplayDoc,
    timer: ScenarioTimer,
    store: TargetStore,
    cursor: usize,
    finished: bool,
}

impl ReplayPlayer {
    pub fn new(mut doc: ReplayDoc) -> Self {
        // Stable: events within a frame keep their recorded order
        doc.events.sort_by_key(|e| e.frame_number);
        if doc.pitch_yaws.len() % 2 != 0 {
            log::warn!("replay has a dangling pitch sample; ignoring it");
            doc.pitch_yaws.pop();
        }
        let timer = ScenarioTimer::new(doc.frames_per_second, REPLAY_RENDER_BUDGET_MICROS);
        Self {
            doc,
            timer,
            store: TargetStore::new(),
            cursor: 0,
            finished: false,
        }
    }

    pub fn start(&mut self, now: u64) {
        self.timer.start(now);
    }

    /// Override the default replay render budget
    pub fn set_render_budget(&mut self, micros: u64) {
        self.timer.set_render_budget(micros);
    }

    pub fn pause(&mut self, now: u64) {
        self.timer.pause(now);
    }

    pub fn resume(&mut self, now: u64) {
        self.timer.resume(now);
    }

    pub fn store(&self) -> &TargetStore {
        &self.store
    }

    pub fn room(&self) -> &RoomDef {
        &self.doc.room
    }

    pub fn timer(&self) -> &ScenarioTimer {
        &self.timer
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn frame_count(&self) -> usize {
        self.doc.pitch_yaws.len() / 2
    }

    /// Advance playback to `now`
    pub fn update(&mut self, now: u64) -> PlaybackStep {
        if self.finished {
            return PlaybackStep::Ended;
        }
        let new_frame = self.timer.tick(now);
        let frame = self.timer.replay_frame();
        let Some((pitch, yaw)) = pitch_yaw_at(&self.doc.pitch_yaws, frame) else {
            log::info!("replay ended at frame {frame}");
            self.finished = true;
            return PlaybackStep::Ended;
        };

        let mut sounds = Vec::new();
        let mut changed = false;
        while let Some(recorded) = self.doc.events.get(self.cursor) {
            if recorded.frame_number > frame {
                break;
            }
            let frame_start = self.timer.replay_frame_start(recorded.frame_number);
            if let Some(sound) = apply_event(&mut self.store, &recorded.event, frame_start) {
                sounds.push(sound);
            }
            changed |= !matches!(recorded.event, ReplayEvent::ShotFired | ReplayEvent::Unknown);
            self.cursor += 1;
        }

        self.store.advance(&self.doc.room, self.timer.run_micros());
        let render = self.timer.should_render(changed);
        PlaybackStep::Frame {
            frame,
            pitch,
            yaw,
            new_frame,
            render,
            sounds,
        }
    }
}
