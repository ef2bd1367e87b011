//! Scenario runner
//!
//! One concrete runner drives every scenario type through the same skeleton:
//! `Initializing → Running ⇄ Paused → Done`. Movement comes from the active
//! [`KindState`]; hit handling branches on the [`ShotType`]. Every target
//! mutation goes through the [`TargetStore`] and is logged to the
//! [`ReplayLog`] against the replay frame counter.

use glam::{Vec2, Vec3};

use super::context::SimContext;
use super::def::{ScenarioDef, ShotType};
use super::kinds::{FrameWindow, KindState};
use super::metronome::Metronome;
use super::placement::TargetPlacer;
use super::replay::{ReplayDoc, ReplayEvent, ReplayLog};
use super::room::{Wall, resolve_wall, wall_to_world};
use super::score::ScenarioStats;
use super::store::TargetStore;
use super::target::{Target, TargetId, TargetProfile, select_profile};
use super::timer::ScenarioTimer;
use crate::audio::SoundEffect;
use crate::consts::DEFAULT_TARGET_HEALTH_SECONDS;
use crate::settings::Settings;
use crate::{look_direction, micros_to_seconds, seconds_to_micros, wrap_degrees};

/// Pitch is kept just short of straight up/down
const MAX_PITCH_DEGREES: f32 = 89.9;

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioPhase {
    Initializing,
    Running,
    Paused,
    Done,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Duration elapsed; stats are final
    Completed(ScenarioStats),
    /// Duration elapsed without a single shot
    NoScore,
    /// The scenario could not be run
    Aborted,
    /// The player asked to start over
    Restart,
    /// The player left
    Exit,
}

/// Semantic input for one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioInput {
    /// Raw mouse counts since the last tick
    pub mouse_delta: Vec2,
    /// Absolute pitch/yaw in degrees, replacing mouse movement
    pub look_override: Option<(f32, f32)>,
    /// Mouse button went down this tick
    pub click_down: bool,
    /// Pause, or resume when already paused. Resuming this way keeps the
    /// settings the run already has; call [`Scenario::resume`] to apply
    /// changed settings.
    pub toggle_pause: bool,
    /// The window lost focus
    pub focus_lost: bool,
    pub restart: bool,
    pub exit: bool,
    pub toggle_metronome: bool,
}

/// What one tick produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// A render is due
    pub render: bool,
    /// This tick began a new replay frame
    pub new_replay_frame: bool,
    pub sounds: Vec<SoundEffect>,
    /// Set once the scenario is done
    pub outcome: Option<RunOutcome>,
}

/// Poke dwell on a single target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dwell {
    target: TargetId,
    since_micros: u64,
}

/// A single scenario run
#[derive(Debug, Clone)]
pub struct Scenario {
    def: ScenarioDef,
    ctx: SimContext,
    settings: Settings,
    kind: Option<KindState>,
    phase: ScenarioPhase,
    wall: Wall,
    placer: TargetPlacer,
    store: TargetStore,
    timer: ScenarioTimer,
    replay: ReplayLog,
    stats: ScenarioStats,
    metronome: Metronome,
    degrees_per_count: f32,
    pitch: f32,
    yaw: f32,
    spawn_counter: u64,
    /// Run times at which pending spawns are due
    pending_spawns: Vec<u64>,
    dwell: Option<Dwell>,
    /// Target under the crosshair on the previous tick
    aimed: Option<TargetId>,
    last_run_micros: u64,
    last_sampled_frame: Option<u64>,
    outcome: Option<RunOutcome>,
}

impl Scenario {
    /// Build a run. Never fails: an unsupported scenario type yields a run
    /// that is already done with [`RunOutcome::Aborted`].
    pub fn new(mut def: ScenarioDef, settings: &Settings, ctx: SimContext) -> Self {
        if def.target_def.profiles.is_empty() {
            log::warn!("scenario {} has no target profiles; using a default", def.scenario_id);
            def.target_def.profiles.push(TargetProfile::new(2.0, 0.0));
        }

        if def.target_def.newest_target_is_ghost && def.target_def.num_targets < 2 {
            log::warn!(
                "scenario {} marks the newest target as a ghost with a single target; ghosting disabled",
                def.scenario_id
            );
        }

        let wall = resolve_wall(&def.room);
        let placer = TargetPlacer::new(wall, def.target_def.placement.clone());
        let timer = ScenarioTimer::new(def.replay_frames_per_second, settings.live_render_budget_micros);
        let kind = KindState::new(&def.kind);

        let (phase, outcome) = match kind {
            Some(_) => (ScenarioPhase::Initializing, None),
            None => {
                log::warn!(
                    target: ctx.log_target.as_str(),
                    "scenario {} has an unsupported type; aborting",
                    def.scenario_id
                );
                (ScenarioPhase::Done, Some(RunOutcome::Aborted))
            }
        };

        Self {
            pitch: def.room.start_pitch,
            yaw: def.room.start_yaw,
            def,
            ctx,
            settings: settings.clone(),
            kind,
            phase,
            wall,
            placer,
            store: TargetStore::new(),
            timer,
            replay: ReplayLog::new(),
            stats: ScenarioStats::default(),
            metronome: Metronome::new(settings.metronome_bpm, settings.metronome_enabled),
            degrees_per_count: settings.degrees_per_count(),
            spawn_counter: 0,
            pending_spawns: Vec::new(),
            dwell: None,
            aimed: None,
            last_run_micros: 0,
            last_sampled_frame: None,
            outcome,
        }
    }

    /// Start the clocks and spawn the initial targets
    pub fn initialize(&mut self, now: u64) {
        if self.phase != ScenarioPhase::Initializing {
            return;
        }
        self.timer.start(now);
        self.timer.tick(now);
        self.last_run_micros = self.timer.run_micros();

        log::info!(
            target: self.ctx.log_target.as_str(),
            "scenario {} started ({}, {:?}, seed {})",
            self.def.scenario_id,
            self.kind.as_ref().map_or("unsupported", |k| k.name()),
            self.def.shot_type,
            self.ctx.seed
        );

        let stagger = seconds_to_micros(self.def.target_def.stagger_initial_targets_seconds);
        for i in 0..u64::from(self.def.target_def.num_targets) {
            let due = stagger * i;
            if due == 0 {
                self.spawn_target();
            } else {
                self.pending_spawns.push(due);
            }
        }

        self.store.advance(&self.def.room, self.last_run_micros);
        self.record_camera();
        self.phase = ScenarioPhase::Running;
    }

    /// Advance the run to `now`
    pub fn update(&mut self, input: &ScenarioInput, now: u64) -> TickReport {
        let mut report = TickReport::default();
        match self.phase {
            ScenarioPhase::Initializing => self.initialize(now),
            ScenarioPhase::Done => {
                report.outcome = self.outcome.clone();
                return report;
            }
            _ => {}
        }

        if input.exit || input.restart {
            let outcome = if input.exit {
                RunOutcome::Exit
            } else {
                RunOutcome::Restart
            };
            self.end(outcome);
            report.render = true;
            report.outcome = self.outcome.clone();
            return report;
        }

        if self.phase == ScenarioPhase::Paused {
            if !input.toggle_pause {
                self.timer.tick(now);
                return report;
            }
            let settings = self.settings.clone();
            self.resume(now, &settings);
        } else if input.toggle_pause || (input.focus_lost && self.settings.pause_on_focus_loss) {
            self.pause(now);
            report.render = true;
            return report;
        }

        report.new_replay_frame = self.timer.tick(now);
        let run = self.timer.run_micros();
        if run >= seconds_to_micros(self.def.duration_seconds) {
            self.finish();
            report.render = true;
            report.outcome = self.outcome.clone();
            return report;
        }

        self.apply_aim(input);
        if input.toggle_metronome {
            self.metronome.toggle();
        }
        if self.metronome.tick(run) {
            report.sounds.push(SoundEffect::Metronome);
        }

        let mut changed = self.spawn_due(run);
        if report.new_replay_frame {
            self.steer_targets();
            self.record_camera();
        }
        self.store.advance(&self.def.room, run);
        changed |= self.expire_targets(run);

        let hit = self.aimed_target();
        changed |= self.resolve_shot(hit, input, run, &mut report.sounds);
        if changed {
            self.store.advance(&self.def.room, run);
        }

        self.last_run_micros = run;
        report.render = self.timer.should_render(changed);
        report
    }

    /// Freeze the run clock; targets and timers stop
    pub fn pause(&mut self, now: u64) {
        if self.phase != ScenarioPhase::Running {
            return;
        }
        self.timer.pause(now);
        self.phase = ScenarioPhase::Paused;
        log::info!("scenario paused at {:.2}s", self.timer.run_seconds());
    }

    /// Resume with freshly read settings
    pub fn resume(&mut self, now: u64, settings: &Settings) {
        if self.phase != ScenarioPhase::Paused {
            return;
        }
        self.settings = settings.clone();
        self.degrees_per_count = settings.degrees_per_count();
        self.metronome.set_bpm(settings.metronome_bpm);
        self.timer.set_render_budget(settings.live_render_budget_micros);
        self.timer.resume(now);
        self.phase = ScenarioPhase::Running;
        log::info!(
            "scenario resumed at {:.2}s (theme {})",
            self.timer.run_seconds(),
            settings.theme
        );
    }

    pub fn phase(&self) -> ScenarioPhase {
        self.phase
    }

    pub fn def(&self) -> &ScenarioDef {
        &self.def
    }

    pub fn store(&self) -> &TargetStore {
        &self.store
    }

    pub fn stats(&self) -> &ScenarioStats {
        &self.stats
    }

    pub fn replay_log(&self) -> &ReplayLog {
        &self.replay
    }

    pub fn timer(&self) -> &ScenarioTimer {
        &self.timer
    }

    pub fn wall(&self) -> &Wall {
        &self.wall
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn metronome(&self) -> &Metronome {
        &self.metronome
    }

    /// Current (pitch, yaw) in degrees
    pub fn pitch_yaw(&self) -> (f32, f32) {
        (self.pitch, self.yaw)
    }

    pub fn camera(&self) -> Vec3 {
        self.def.room.camera()
    }

    pub fn look(&self) -> Vec3 {
        look_direction(self.pitch, self.yaw)
    }

    /// Replay document of the run so far
    pub fn replay_doc(&self) -> ReplayDoc {
        self.replay
            .clone()
            .into_doc(self.def.room.clone(), self.def.replay_frames_per_second)
    }

    pub fn into_replay_doc(self) -> ReplayDoc {
        self.replay
            .into_doc(self.def.room, self.def.replay_frames_per_second)
    }

    fn frame_window(&self) -> FrameWindow {
        FrameWindow {
            start: self.timer.current_frame_start(),
            length: self.timer.micros_per_replay_frame(),
        }
    }

    fn apply_aim(&mut self, input: &ScenarioInput) {
        let (pitch, yaw) = match input.look_override {
            Some(look) => look,
            None => (
                self.pitch - input.mouse_delta.y * self.degrees_per_count,
                self.yaw + input.mouse_delta.x * self.degrees_per_count,
            ),
        };
        self.pitch = pitch.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
        self.yaw = wrap_degrees(yaw);
    }

    fn record_camera(&mut self) {
        let frame = self.timer.replay_frame();
        self.replay.record_pitch_yaw(frame, self.pitch, self.yaw);
    }

    /// Spawn one target from the profile set and log it
    fn spawn_target(&mut self) {
        let frame = self.frame_window();
        let Some(kind) = self.kind.as_mut() else {
            return;
        };
        let td = &self.def.target_def;
        let rng = &mut self.ctx.rng;

        let profile_index = select_profile(&td.profiles, &td.profile_order, self.spawn_counter, rng);
        self.spawn_counter += 1;
        let profile = &td.profiles[profile_index];
        let radius = profile.roll_radius(rng);
        let speed = profile.roll_speed(rng);

        let others: Vec<Vec2> = self.store.visible().map(|t| t.wall_position).collect();
        let position = self.placer.get_next_position(radius, &others, rng);

        let mut target = Target::new(position, radius);
        target.id = self.store.next_id();
        target.growth = profile.growth;
        target.pill = profile.pill;
        target.profile_index = profile_index;
        target.spawn_micros = frame.start;
        // A lone target must stay killable
        target.ghost = td.newest_target_is_ghost && td.num_targets > 1;
        target.remove_at_micros = td
            .remove_target_after_seconds
            .map(|seconds| frame.start + seconds_to_micros(seconds));
        if self.def.shot_type == ShotType::TrackingKill {
            let health = profile.health_seconds.unwrap_or(DEFAULT_TARGET_HEALTH_SECONDS);
            target.health_seconds = Some(health);
            target.max_health_seconds = Some(health);
        }
        kind.fill_in_new_target(&mut target, speed, &self.wall, frame, rng);
        target.position = wall_to_world(target.wall_position, target.radius, &self.def.room);

        if target.ghost {
            self.store.promote_ghosts();
        }
        let target = self.store.add_target(target);

        let frame_number = self.timer.replay_frame();
        self.replay.record(
            frame_number,
            ReplayEvent::AddTarget {
                target_id: target.id,
                position: target.wall_position,
                radius: target.base_radius,
                ghost: target.ghost,
                growth: target.growth,
                pill: target.pill,
            },
        );
        if let Some(motion) = target.motion {
            self.replay.record(
                frame_number,
                ReplayEvent::MoveLinearTarget {
                    target_id: target.id,
                    position: motion.origin,
                    direction: motion.direction,
                    distance_per_second: motion.speed,
                },
            );
        }
        log::debug!(
            "spawned target {} at ({:.1}, {:.1}) r={:.2} profile {}",
            target.id,
            target.wall_position.x,
            target.wall_position.y,
            target.radius,
            profile_index
        );
    }

    /// Spawn everything whose delay has run out
    fn spawn_due(&mut self, run: u64) -> bool {
        let due = self.pending_spawns.iter().filter(|&&at| at <= run).count();
        if due == 0 {
            return false;
        }
        self.pending_spawns.retain(|&at| at > run);
        for _ in 0..due {
            self.spawn_target();
        }
        true
    }

    fn schedule_replacement(&mut self, run: u64) {
        let delay = seconds_to_micros(self.def.target_def.new_target_delay_seconds);
        if delay == 0 {
            self.spawn_target();
        } else {
            self.pending_spawns.push(run + delay);
        }
    }

    /// Start a new motion segment for every target whose kind wants to turn
    fn steer_targets(&mut self) {
        let frame = self.frame_window();
        let Some(kind) = self.kind.as_mut() else {
            return;
        };
        let frame_number = self.timer.replay_frame();

        for id in self.store.visible_ids() {
            let Some(target) = self.store.get(id) else {
                continue;
            };
            // Segments begun this frame (fresh spawns) are already current
            if target.motion.is_none_or(|m| m.start_micros >= frame.start) {
                continue;
            }
            let Some(motion) = kind.update_target_position(target, &self.wall, frame, &mut self.ctx.rng)
            else {
                continue;
            };
            if let Some(target) = self.store.get_mut(id) {
                target.wall_position = motion.origin;
                target.motion = Some(motion);
            }
            self.replay.record(
                frame_number,
                ReplayEvent::MoveLinearTarget {
                    target_id: id,
                    position: motion.origin,
                    direction: motion.direction,
                    distance_per_second: motion.speed,
                },
            );
        }
    }

    /// Remove targets whose lifetime ran out
    fn expire_targets(&mut self, run: u64) -> bool {
        let expired: Vec<(TargetId, f32)> = self
            .store
            .visible()
            .filter(|t| t.remove_at_micros.is_some_and(|at| run >= at))
            .map(|t| (t.id, t.health_fraction()))
            .collect();
        if expired.is_empty() {
            return false;
        }

        let frame_number = self.timer.replay_frame();
        for (id, health_fraction) in expired {
            self.replay.record(frame_number, ReplayEvent::RemoveTarget { target_id: id });
            self.drop_target(id);
            if self.def.target_def.remove_target_partial_credit {
                self.stats.partial_hits += 1.0 - health_fraction;
            }
            if self.def.shot_type == ShotType::TrackingKill {
                self.stats.shots_taken += 1;
            }
            log::debug!("target {id} expired at {:.2} health", health_fraction);
            self.schedule_replacement(run);
        }
        true
    }

    fn drop_target(&mut self, id: TargetId) {
        self.store.remove_target(id);
        if let Some(kind) = self.kind.as_mut() {
            kind.forget(id);
        }
        if self.dwell.is_some_and(|d| d.target == id) {
            self.dwell = None;
        }
        if self.aimed == Some(id) {
            self.aimed = None;
        }
    }

    fn kill_target(&mut self, id: TargetId, run: u64, sounds: &mut Vec<SoundEffect>) {
        let frame_number = self.timer.replay_frame();
        self.replay.record(frame_number, ReplayEvent::KillTarget { target_id: id });
        self.drop_target(id);
        self.stats.targets_hit += 1;
        sounds.push(SoundEffect::Kill);
        log::debug!("killed target {id} at {:.2}s", micros_to_seconds(run));
        self.schedule_replacement(run);
    }

    fn record_shot(&mut self, sounds: &mut Vec<SoundEffect>) {
        self.stats.shots_taken += 1;
        let frame_number = self.timer.replay_frame();
        self.replay.record(frame_number, ReplayEvent::ShotFired);
        sounds.push(SoundEffect::Shoot);
    }

    /// Killable target under the crosshair
    fn aimed_target(&self) -> Option<TargetId> {
        self.store
            .get_nearest_hit_target(self.camera(), self.look())
            .filter(|&id| self.store.get(id).is_some_and(Target::is_killable))
    }

    /// Apply the shot type to this tick's aim. Returns true when targets changed.
    fn resolve_shot(
        &mut self,
        hit: Option<TargetId>,
        input: &ScenarioInput,
        run: u64,
        sounds: &mut Vec<SoundEffect>,
    ) -> bool {
        let hits_before = self.stats.targets_hit;
        match self.def.shot_type {
            ShotType::Click => {
                if input.click_down {
                    self.record_shot(sounds);
                    if let Some(id) = hit {
                        self.kill_target(id, run, sounds);
                    }
                }
            }
            ShotType::Poke => match hit {
                Some(id) => {
                    let since = match self.dwell {
                        Some(dwell) if dwell.target == id => dwell.since_micros,
                        _ => {
                            self.dwell = Some(Dwell {
                                target: id,
                                since_micros: run,
                            });
                            self.record_shot(sounds);
                            run
                        }
                    };
                    if run - since >= seconds_to_micros(self.def.poke_dwell_seconds) {
                        self.kill_target(id, run, sounds);
                    }
                }
                None => self.dwell = None,
            },
            ShotType::TrackingInvincible => {
                let frame = self.timer.replay_frame();
                let frames = match self.last_sampled_frame {
                    Some(last) => frame.saturating_sub(last),
                    None => 1,
                };
                if frames > 0 {
                    self.last_sampled_frame = Some(frame);
                    let frames = u32::try_from(frames).unwrap_or(u32::MAX);
                    self.stats.shots_taken += frames;
                    if hit.is_some() {
                        self.stats.targets_hit += frames;
                    }
                }
            }
            ShotType::TrackingKill => {
                if let Some(id) = hit {
                    if self.aimed != Some(id) {
                        sounds.push(SoundEffect::Hit);
                    }
                    let drained = micros_to_seconds(run.saturating_sub(self.last_run_micros));
                    let dead = self.store.get_mut(id).is_some_and(|target| {
                        let health = target
                            .health_seconds
                            .get_or_insert(DEFAULT_TARGET_HEALTH_SECONDS);
                        *health -= drained;
                        *health <= 0.0
                    });
                    if dead {
                        self.stats.shots_taken += 1;
                        self.kill_target(id, run, sounds);
                    }
                }
            }
        }
        self.aimed = hit.filter(|&id| self.store.get(id).is_some());
        self.def.shot_type != ShotType::TrackingInvincible && self.stats.targets_hit != hits_before
    }

    /// Duration elapsed: settle partial credit and score the run
    fn finish(&mut self) {
        if self.def.shot_type == ShotType::TrackingKill {
            for target in self.store.visible().filter(|t| t.is_killable()) {
                let fraction = target.health_fraction();
                if fraction < 1.0 {
                    self.stats.partial_hits += 1.0 - fraction;
                    self.stats.shots_taken += 1;
                }
            }
        }

        let outcome = if self.stats.finalize(self.def.duration_seconds) {
            RunOutcome::Completed(self.stats.clone())
        } else {
            log::info!("scenario {} ended without shots; no score", self.def.scenario_id);
            RunOutcome::NoScore
        };
        log::info!(
            target: self.ctx.log_target.as_str(),
            "scenario {} done: {} hits / {} shots, score {:.1}",
            self.def.scenario_id,
            self.stats.effective_hits(),
            self.stats.shots_taken,
            self.stats.score
        );
        self.phase = ScenarioPhase::Done;
        self.outcome = Some(outcome);
    }

    /// Leave early without scoring
    fn end(&mut self, outcome: RunOutcome) {
        log::info!("scenario {} ended early: {:?}", self.def.scenario_id, outcome);
        self.phase = ScenarioPhase::Done;
        self.outcome = Some(outcome);
    }
}
