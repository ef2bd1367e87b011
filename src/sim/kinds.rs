//! Per-scenario-type spawn and movement behaviour
//!
//! Every kind moves targets in straight wall-space segments. Steering only
//! happens at replay frame boundaries: a kind looks at where a target is at
//! the start of the frame and, when it wants to change course, returns a new
//! [`LinearMotion`] starting at that instant. The scenario records each new
//! segment so playback reproduces it exactly.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::def::{
    BarrelDef, CenteringDef, LinearDef, ScenarioKind, WallArcDef, WallStrafeDef, WallSwerveDef,
};
use super::room::Wall;
use super::target::{LinearMotion, Target, TargetId};
use crate::{micros_to_seconds, normalize_angle, polar_to_cartesian, seconds_to_micros};

/// Directions closer than this (radians) are treated as unchanged
const STEER_EPSILON: f32 = 1e-4;

/// The replay frame a steering decision is made in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWindow {
    /// Run time at which the frame begins
    pub start: u64,
    /// Frame length in microseconds
    pub length: u64,
}

impl FrameWindow {
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    #[inline]
    pub fn seconds(&self) -> f32 {
        micros_to_seconds(self.length)
    }
}

/// Quadratic Bézier arc in wall space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPath {
    pub start: Vec2,
    pub control: Vec2,
    pub end: Vec2,
    pub start_micros: u64,
    pub duration_micros: u64,
}

impl ArcPath {
    /// Point at parameter `t` in [0, 1]
    pub fn point(&self, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        self.start * (u * u) + self.control * (2.0 * u * t) + self.end * (t * t)
    }

    fn param_at(&self, run_micros: u64) -> f32 {
        if self.duration_micros == 0 {
            return 1.0;
        }
        run_micros.saturating_sub(self.start_micros) as f32 / self.duration_micros as f32
    }

    fn is_finished(&self, run_micros: u64) -> bool {
        run_micros >= self.start_micros + self.duration_micros
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrafeState {
    /// +1 right, -1 left
    pub heading: f32,
    /// x coordinate at which the target turns around
    pub turn_x: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwerveState {
    /// Spawn position goals are drawn around
    pub anchor: Vec2,
    pub goal: Vec2,
}

/// Runtime state of the active scenario type
#[derive(Debug, Clone)]
pub enum KindState {
    Static,
    Centering(CenteringDef),
    Barrel(BarrelDef),
    Linear(LinearDef),
    WallArc {
        def: WallArcDef,
        arcs: HashMap<TargetId, ArcPath>,
    },
    WallStrafe {
        def: WallStrafeDef,
        strafes: HashMap<TargetId, StrafeState>,
    },
    WallSwerve {
        def: WallSwerveDef,
        swerves: HashMap<TargetId, SwerveState>,
    },
}

impl KindState {
    /// Build the runtime state for a kind; `None` when this build cannot run it
    pub fn new(kind: &ScenarioKind) -> Option<Self> {
        Some(match kind {
            ScenarioKind::Static => KindState::Static,
            ScenarioKind::Centering(def) => KindState::Centering(def.clone()),
            ScenarioKind::Barrel(def) => KindState::Barrel(def.clone()),
            ScenarioKind::Linear(def) => KindState::Linear(def.clone()),
            ScenarioKind::WallArc(def) => KindState::WallArc {
                def: def.clone(),
                arcs: HashMap::new(),
            },
            ScenarioKind::WallStrafe(def) => KindState::WallStrafe {
                def: def.clone(),
                strafes: HashMap::new(),
            },
            ScenarioKind::WallSwerve(def) => KindState::WallSwerve {
                def: def.clone(),
                swerves: HashMap::new(),
            },
            ScenarioKind::Unsupported => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            KindState::Static => "static",
            KindState::Centering(_) => "centering",
            KindState::Barrel(_) => "barrel",
            KindState::Linear(_) => "linear",
            KindState::WallArc { .. } => "wall_arc",
            KindState::WallStrafe { .. } => "wall_strafe",
            KindState::WallSwerve { .. } => "wall_swerve",
        }
    }

    /// Give a freshly placed target its first motion segment.
    ///
    /// `target.id` must already be assigned. Stationary targets keep `motion = None`.
    pub fn fill_in_new_target<R: Rng>(
        &mut self,
        target: &mut Target,
        speed: f32,
        wall: &Wall,
        frame: FrameWindow,
        rng: &mut R,
    ) {
        let id = target.id;
        let pos = target.wall_position;
        let radius = target.radius;
        // Arcs are timed by their own duration, not the profile speed
        let timed = matches!(self, KindState::WallArc { .. });
        target.motion = match self {
            KindState::Static => None,
            _ if speed <= 0.0 && !timed => None,
            KindState::Centering(def) => {
                let goal = central_goal(def, wall, rng);
                Some(LinearMotion::new(pos, goal - pos, speed, frame.start))
            }
            KindState::Barrel(def) => {
                let goal = inner_goal(def.inner_goal_percent, wall, radius, rng);
                Some(LinearMotion::new(pos, goal - pos, speed, frame.start))
            }
            KindState::Linear(def) => {
                let lo = def.min_angle_degrees.min(def.max_angle_degrees);
                let hi = def.min_angle_degrees.max(def.max_angle_degrees);
                let angle = (lo + (hi - lo) * rng.random::<f32>()).to_radians();
                Some(LinearMotion::new(pos, Vec2::from_angle(angle), speed, frame.start))
            }
            KindState::WallArc { def, arcs } => {
                let arc = new_arc(def, wall, pos, radius, frame.start);
                arcs.insert(id, arc);
                Some(arc_segment(&arc, pos, frame))
            }
            KindState::WallStrafe { def, strafes } => {
                let heading = if rng.random::<bool>() { 1.0 } else { -1.0 };
                let state = next_strafe(def, wall, pos.x, radius, heading, rng);
                strafes.insert(id, state);
                Some(LinearMotion::new(
                    pos,
                    Vec2::new(state.heading, 0.0),
                    speed,
                    frame.start,
                ))
            }
            KindState::WallSwerve { def, swerves } => {
                let goal = swerve_goal(def, wall, pos, radius, rng);
                swerves.insert(id, SwerveState { anchor: pos, goal });
                Some(LinearMotion::new(pos, goal - pos, speed, frame.start))
            }
        };
    }

    /// Steer a target at the start of `frame`.
    ///
    /// Returns the new segment when the target changes course.
    pub fn update_target_position<R: Rng>(
        &mut self,
        target: &Target,
        wall: &Wall,
        frame: FrameWindow,
        rng: &mut R,
    ) -> Option<LinearMotion> {
        let motion = target.motion?;
        let pos = motion.position_at(frame.start);
        let radius = target.radius;
        let velocity = motion.velocity();

        match self {
            KindState::Static => None,
            KindState::Linear(_) => {
                let bounced = bounce(wall, pos, radius, velocity)?;
                Some(LinearMotion::new(
                    wall.clamp(pos, radius),
                    bounced,
                    motion.speed,
                    frame.start,
                ))
            }
            KindState::Centering(def) => {
                if wall.contains(pos, radius) || velocity.dot(pos) <= 0.0 {
                    return None;
                }
                let origin = wall.clamp(pos, radius);
                let goal = central_goal(def, wall, rng);
                log::trace!("target {} re-aimed through centre", target.id);
                Some(LinearMotion::new(origin, goal - origin, motion.speed, frame.start))
            }
            KindState::Barrel(def) => {
                if wall.contains(pos, radius) || velocity.dot(pos) <= 0.0 {
                    return None;
                }
                let origin = wall.clamp(pos, radius);
                let goal = inner_goal(def.inner_goal_percent, wall, radius, rng);
                Some(LinearMotion::new(origin, goal - origin, motion.speed, frame.start))
            }
            KindState::WallArc { def, arcs } => {
                let mut arc = match arcs.get(&target.id) {
                    Some(arc) => *arc,
                    None => new_arc(def, wall, pos, radius, frame.start),
                };
                if arc.is_finished(frame.start) {
                    arc = new_arc(def, wall, pos, radius, frame.start);
                }
                arcs.insert(target.id, arc);
                Some(arc_segment(&arc, pos, frame))
            }
            KindState::WallStrafe { def, strafes } => {
                let state = strafes.get(&target.id).copied().unwrap_or(StrafeState {
                    heading: velocity.x.signum(),
                    turn_x: pos.x,
                });
                let past_turn = if state.heading > 0.0 {
                    pos.x >= state.turn_x
                } else {
                    pos.x <= state.turn_x
                };
                if !past_turn {
                    return None;
                }
                let bound = strafe_bound(def, wall, radius);
                let origin = Vec2::new(pos.x.clamp(-bound, bound), pos.y);
                let next = next_strafe(def, wall, origin.x, radius, -state.heading, rng);
                strafes.insert(target.id, next);
                Some(LinearMotion::new(
                    origin,
                    Vec2::new(next.heading, 0.0),
                    motion.speed,
                    frame.start,
                ))
            }
            KindState::WallSwerve { def, swerves } => {
                let mut state = swerves.get(&target.id).copied().unwrap_or(SwerveState {
                    anchor: pos,
                    goal: pos,
                });
                let origin = wall.clamp(pos, radius);
                if origin.distance(state.goal) <= def.goal_radius || !wall.contains(pos, radius) {
                    state.goal = swerve_goal(def, wall, state.anchor, radius, rng);
                }
                swerves.insert(target.id, state);

                let max_turn = def.turn_rate_degrees_per_second.to_radians() * frame.seconds();
                let heading = turn_toward(motion.direction, state.goal - origin, max_turn);
                let turned = motion.direction.angle_to(heading).abs() > STEER_EPSILON;
                (turned || origin != pos)
                    .then(|| LinearMotion::new(origin, heading, motion.speed, frame.start))
            }
        }
    }

    /// Drop per-target state for a target that left the store
    pub fn forget(&mut self, id: TargetId) {
        match self {
            KindState::WallArc { arcs, .. } => {
                arcs.remove(&id);
            }
            KindState::WallStrafe { strafes, .. } => {
                strafes.remove(&id);
            }
            KindState::WallSwerve { swerves, .. } => {
                swerves.remove(&id);
            }
            _ => {}
        }
    }
}

/// New velocity direction after bouncing off the wall edges, if the target
/// is outside and still heading out
fn bounce(wall: &Wall, pos: Vec2, radius: f32, velocity: Vec2) -> Option<Vec2> {
    if wall.contains(pos, radius) {
        return None;
    }
    if wall.circular {
        let normal = pos.normalize_or_zero();
        if velocity.dot(normal) <= 0.0 {
            return None;
        }
        return Some(velocity - 2.0 * velocity.dot(normal) * normal);
    }
    let half = wall.half_extents() - Vec2::splat(radius);
    let mut out = velocity;
    if pos.x.abs() > half.x && pos.x * velocity.x > 0.0 {
        out.x = -out.x;
    }
    if pos.y.abs() > half.y && pos.y * velocity.y > 0.0 {
        out.y = -out.y;
    }
    (out != velocity).then_some(out)
}

/// A random point in the central zone
fn central_goal<R: Rng>(def: &CenteringDef, wall: &Wall, rng: &mut R) -> Vec2 {
    let zone = (def.through_center_percent * wall.height).max(0.0);
    polar_to_cartesian(zone * rng.random::<f32>().sqrt(), rng.random::<f32>() * TAU)
}

/// A random point well inside the wall
fn inner_goal<R: Rng>(percent: f32, wall: &Wall, radius: f32, rng: &mut R) -> Vec2 {
    let half = wall.half_extents() - Vec2::splat(radius);
    let reach = half.min_element().max(0.0) * percent.clamp(0.0, 1.0);
    polar_to_cartesian(reach * rng.random::<f32>().sqrt(), rng.random::<f32>() * TAU)
}

/// Arc from `start` toward the opposite half of the wall
fn new_arc(def: &WallArcDef, wall: &Wall, start: Vec2, radius: f32, start_micros: u64) -> ArcPath {
    let direction = if start.x > 0.0 { -1.0 } else { 1.0 };
    let span = def.width_percent * wall.width;
    let end = wall.clamp(Vec2::new(start.x + direction * span, start.y), radius);
    let mid = (start + end) / 2.0;
    let control = Vec2::new(mid.x, mid.y + def.control_height_percent * wall.height);
    ArcPath {
        start,
        control,
        end,
        start_micros,
        duration_micros: seconds_to_micros(def.duration_seconds).max(1),
    }
}

/// Segment that reaches the arc's next-frame point at the end of `frame`
fn arc_segment(arc: &ArcPath, pos: Vec2, frame: FrameWindow) -> LinearMotion {
    let next = arc.point(arc.param_at(frame.end()));
    let delta = next - pos;
    let seconds = frame.seconds();
    let speed = if seconds > 0.0 { delta.length() / seconds } else { 0.0 };
    LinearMotion::new(pos, delta, speed, frame.start)
}

fn strafe_bound(def: &WallStrafeDef, wall: &Wall, radius: f32) -> f32 {
    (def.width_percent.clamp(0.0, 1.0) * wall.width / 2.0 - radius).max(0.0)
}

/// Pick the next turn point going `heading` from `x`
fn next_strafe<R: Rng>(
    def: &WallStrafeDef,
    wall: &Wall,
    x: f32,
    radius: f32,
    heading: f32,
    rng: &mut R,
) -> StrafeState {
    let lo = def.min_strafe_distance.min(def.max_strafe_distance);
    let hi = def.min_strafe_distance.max(def.max_strafe_distance);
    let distance = lo + (hi - lo) * rng.random::<f32>();
    let bound = strafe_bound(def, wall, radius);
    let mut heading = heading;
    // No room ahead: go the other way
    if (heading > 0.0 && x >= bound) || (heading < 0.0 && x <= -bound) {
        heading = -heading;
    }
    StrafeState {
        heading,
        turn_x: (x + heading * distance).clamp(-bound, bound),
    }
}

fn swerve_goal<R: Rng>(def: &WallSwerveDef, wall: &Wall, anchor: Vec2, radius: f32, rng: &mut R) -> Vec2 {
    let reach = def.max_distance_from_origin.max(0.0) * rng.random::<f32>().sqrt();
    wall.clamp(anchor + polar_to_cartesian(reach, rng.random::<f32>() * TAU), radius)
}

/// Rotate `current` toward `desired` by at most `max_turn` radians
fn turn_toward(current: Vec2, desired: Vec2, max_turn: f32) -> Vec2 {
    let desired = desired.normalize_or_zero();
    if desired == Vec2::ZERO {
        return current;
    }
    if current == Vec2::ZERO {
        return desired;
    }
    let delta = normalize_angle(current.angle_to(desired));
    let step = delta.clamp(-max_turn, max_turn);
    Vec2::from_angle(step).rotate(current)
}
