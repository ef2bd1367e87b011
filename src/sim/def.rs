//! Scenario definitions
//!
//! The immutable per-run snapshot a scenario is built from. Field names match
//! the JSON documents scenarios are stored as.

use serde::{Deserialize, Serialize};

use super::placement::TargetPlacementStrategy;
use super::room::RoomDef;
use super::target::TargetProfile;
use crate::consts::{DEFAULT_POKE_DWELL_SECONDS, DEFAULT_REPLAY_FPS};

/// How the player interacts with targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    /// One shot per mouse-down
    #[default]
    Click,
    /// Hold aim on a target for a dwell time to kill it
    Poke,
    /// Aim time is scored, nothing dies
    TrackingInvincible,
    /// Aim time drains target health
    TrackingKill,
}

fn default_num_targets() -> u32 {
    1
}

/// Targets, their profiles and where they go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDef {
    #[serde(default = "default_num_targets")]
    pub num_targets: u32,
    pub profiles: Vec<TargetProfile>,
    /// Explicit profile sequence, indexed cyclically
    #[serde(default)]
    pub profile_order: Vec<usize>,
    #[serde(default)]
    pub placement: TargetPlacementStrategy,
    /// The most recently spawned target is a non-killable preview
    #[serde(default)]
    pub newest_target_is_ghost: bool,
    /// Delay between the initial spawns
    #[serde(default)]
    pub stagger_initial_targets_seconds: f32,
    /// Delay before a killed/removed target is replaced
    #[serde(default)]
    pub new_target_delay_seconds: f32,
    /// Remove targets that survive this long
    #[serde(default)]
    pub remove_target_after_seconds: Option<f32>,
    /// Removed targets credit `1 - health fraction` as a partial hit
    #[serde(default)]
    pub remove_target_partial_credit: bool,
}

impl Default for TargetDef {
    fn default() -> Self {
        Self {
            num_targets: 1,
            profiles: vec![TargetProfile::new(2.0, 0.0)],
            profile_order: Vec::new(),
            placement: TargetPlacementStrategy::default(),
            newest_target_is_ghost: false,
            stagger_initial_targets_seconds: 0.0,
            new_target_delay_seconds: 0.0,
            remove_target_after_seconds: None,
            remove_target_partial_credit: false,
        }
    }
}

fn default_through_center_percent() -> f32 {
    0.1
}

fn default_max_angle() -> f32 {
    360.0
}

fn default_arc_control_height() -> f32 {
    0.5
}

fn default_arc_seconds() -> f32 {
    2.0
}

fn default_strafe_min() -> f32 {
    10.0
}

fn default_strafe_max() -> f32 {
    40.0
}

fn default_swerve_distance() -> f32 {
    30.0
}

fn default_turn_rate() -> f32 {
    180.0
}

fn default_goal_radius() -> f32 {
    2.0
}

fn default_barrel_inner_percent() -> f32 {
    0.6
}

/// Targets head through a small central zone, then re-aim when they leave the wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenteringDef {
    /// Radius of the central zone as a fraction of wall height
    #[serde(default = "default_through_center_percent")]
    pub through_center_percent: f32,
}

/// Targets wander the barrel floor and re-aim inward when they reach the rim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrelDef {
    /// Re-aim goals are drawn inside this fraction of the floor radius
    #[serde(default = "default_barrel_inner_percent")]
    pub inner_goal_percent: f32,
}

/// Straight lines that bounce off the wall edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearDef {
    /// Initial heading range in degrees (0 = rightward, counter-clockwise)
    #[serde(default)]
    pub min_angle_degrees: f32,
    #[serde(default = "default_max_angle")]
    pub max_angle_degrees: f32,
}

/// Quadratic Bézier arcs between points on opposite wall halves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallArcDef {
    /// Control point height above the chord, as a fraction of wall height
    #[serde(default = "default_arc_control_height")]
    pub control_height_percent: f32,
    /// Horizontal span of an arc, as a fraction of wall width
    #[serde(default = "default_arc_width")]
    pub width_percent: f32,
    /// Time to traverse one arc
    #[serde(default = "default_arc_seconds")]
    pub duration_seconds: f32,
}

fn default_arc_width() -> f32 {
    0.6
}

/// Horizontal strafing with randomized turn distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallStrafeDef {
    #[serde(default = "default_strafe_min")]
    pub min_strafe_distance: f32,
    #[serde(default = "default_strafe_max")]
    pub max_strafe_distance: f32,
    /// Strafing is confined to this fraction of the wall width
    #[serde(default = "default_strafe_width")]
    pub width_percent: f32,
}

fn default_strafe_width() -> f32 {
    0.8
}

/// Steering toward random goals around a fixed anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSwerveDef {
    #[serde(default = "default_swerve_distance")]
    pub max_distance_from_origin: f32,
    #[serde(default = "default_turn_rate")]
    pub turn_rate_degrees_per_second: f32,
    /// A goal counts as reached within this distance
    #[serde(default = "default_goal_radius")]
    pub goal_radius: f32,
}

/// Per-type scenario parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioKind {
    Static,
    Centering(CenteringDef),
    Barrel(BarrelDef),
    Linear(LinearDef),
    WallArc(WallArcDef),
    WallStrafe(WallStrafeDef),
    WallSwerve(WallSwerveDef),
    /// A type this build does not know how to run
    #[serde(other)]
    Unsupported,
}

fn default_replay_fps() -> u32 {
    DEFAULT_REPLAY_FPS
}

fn default_poke_dwell() -> f32 {
    DEFAULT_POKE_DWELL_SECONDS
}

/// Everything needed to run one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDef {
    pub scenario_id: String,
    pub duration_seconds: f32,
    #[serde(default)]
    pub shot_type: ShotType,
    #[serde(default = "default_poke_dwell")]
    pub poke_dwell_seconds: f32,
    pub target_def: TargetDef,
    pub room: RoomDef,
    pub kind: ScenarioKind,
    #[serde(default = "default_replay_fps")]
    pub replay_frames_per_second: u32,
}
