//! Target entities and the profiles they are instantiated from

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::micros_to_seconds;

/// Stable target identifier. 0 means "not yet assigned".
pub type TargetId = u16;

/// Radius growth over the target's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetGrowth {
    pub final_radius: f32,
    pub growth_time_seconds: f32,
}

/// Vertical capsule extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillDef {
    /// Total height including both hemispherical caps
    pub height: f32,
}

/// Straight-line wall-space motion evaluated in closed form.
///
/// Evaluating from a fixed origin and start time (rather than integrating
/// per tick) makes positions independent of the tick rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearMotion {
    pub origin: Vec2,
    /// Unit direction (zero when stationary)
    pub direction: Vec2,
    /// Wall units per second
    pub speed: f32,
    /// Run-clock time the segment starts at
    pub start_micros: u64,
}

impl LinearMotion {
    pub fn new(origin: Vec2, direction: Vec2, speed: f32, start_micros: u64) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            speed,
            start_micros,
        }
    }

    /// Position at `run_micros` (clamped to the segment start)
    #[inline]
    pub fn position_at(&self, run_micros: u64) -> Vec2 {
        let elapsed = micros_to_seconds(run_micros.saturating_sub(self.start_micros));
        self.origin + self.direction * self.speed * elapsed
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.direction * self.speed
    }
}

/// A live (or hidden, recyclable) target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    /// World position, derived from `wall_position` each tick
    pub position: Vec3,
    /// Authoritative wall-space position
    pub wall_position: Vec2,
    pub motion: Option<LinearMotion>,
    /// Radius at spawn; the current radius comes from `radius_at`
    pub base_radius: f32,
    pub radius: f32,
    pub growth: Option<TargetGrowth>,
    pub pill: Option<PillDef>,
    pub hidden: bool,
    pub ghost: bool,
    /// Remaining aim time before a tracking-kill target dies
    pub health_seconds: Option<f32>,
    pub max_health_seconds: Option<f32>,
    /// Run time after which an unkilled target is removed
    pub remove_at_micros: Option<u64>,
    pub spawn_micros: u64,
    /// Index of the profile this target was built from
    pub profile_index: usize,
}

impl Target {
    pub fn new(wall_position: Vec2, radius: f32) -> Self {
        Self {
            id: 0,
            position: Vec3::ZERO,
            wall_position,
            motion: None,
            base_radius: radius,
            radius,
            growth: None,
            pill: None,
            hidden: false,
            ghost: false,
            health_seconds: None,
            max_health_seconds: None,
            remove_at_micros: None,
            spawn_micros: 0,
            profile_index: 0,
        }
    }

    /// Radius at `run_micros`, accounting for growth
    pub fn radius_at(&self, run_micros: u64) -> f32 {
        match self.growth {
            Some(growth) if growth.growth_time_seconds > 0.0 => {
                let age = micros_to_seconds(run_micros.saturating_sub(self.spawn_micros));
                let t = (age / growth.growth_time_seconds).clamp(0.0, 1.0);
                self.base_radius + (growth.final_radius - self.base_radius) * t
            }
            _ => self.base_radius,
        }
    }

    /// Fraction of health remaining (1.0 for targets without health)
    pub fn health_fraction(&self) -> f32 {
        match (self.health_seconds, self.max_health_seconds) {
            (Some(h), Some(max)) if max > 0.0 => (h / max).clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    /// Whether the target can be killed by the player
    #[inline]
    pub fn is_killable(&self) -> bool {
        !self.hidden && !self.ghost
    }

    /// Capsule axis endpoints in world space, if this is a pill target
    pub fn pill_axis(&self) -> Option<(Vec3, Vec3)> {
        self.pill.map(|pill| {
            let half = ((pill.height / 2.0) - self.radius).max(0.0);
            (
                self.position - Vec3::Y * half,
                self.position + Vec3::Y * half,
            )
        })
    }
}

fn default_weight() -> f32 {
    1.0
}

/// Template for concrete targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub target_radius: f32,
    #[serde(default)]
    pub target_radius_jitter: f32,
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub speed_jitter: f32,
    /// Relative weight when profiles are rolled
    #[serde(default = "default_weight")]
    pub percent_chance: f32,
    #[serde(default)]
    pub growth: Option<TargetGrowth>,
    #[serde(default)]
    pub pill: Option<PillDef>,
    /// Health for tracking-kill scenarios
    #[serde(default)]
    pub health_seconds: Option<f32>,
}

impl TargetProfile {
    pub fn new(target_radius: f32, speed: f32) -> Self {
        Self {
            target_radius,
            target_radius_jitter: 0.0,
            speed,
            speed_jitter: 0.0,
            percent_chance: 1.0,
            growth: None,
            pill: None,
            health_seconds: None,
        }
    }

    /// Roll a concrete radius within the jitter band (never below a small positive floor)
    pub fn roll_radius<R: Rng>(&self, rng: &mut R) -> f32 {
        jittered(self.target_radius, self.target_radius_jitter, rng).max(0.01)
    }

    /// Roll a concrete speed within the jitter band
    pub fn roll_speed<R: Rng>(&self, rng: &mut R) -> f32 {
        jittered(self.speed, self.speed_jitter, rng).max(0.0)
    }
}

/// `value ± jitter`, uniform
#[inline]
pub fn jittered<R: Rng>(value: f32, jitter: f32, rng: &mut R) -> f32 {
    if jitter <= 0.0 {
        value
    } else {
        value + jitter * (2.0 * rng.random::<f32>() - 1.0)
    }
}

/// Pick the profile for the `counter`-th target.
///
/// An explicit order list is indexed cyclically; otherwise profiles are
/// rolled by weight.
pub fn select_profile<R: Rng>(
    profiles: &[TargetProfile],
    order: &[usize],
    counter: u64,
    rng: &mut R,
) -> usize {
    if profiles.len() <= 1 {
        return 0;
    }
    if !order.is_empty() {
        let index = order[(counter % order.len() as u64) as usize];
        return index.min(profiles.len() - 1);
    }
    let total: f32 = profiles.iter().map(|p| p.percent_chance.max(0.0)).sum();
    if total <= 0.0 {
        return 0;
    }
    let mut roll = rng.random::<f32>() * total;
    for (i, profile) in profiles.iter().enumerate() {
        let weight = profile.percent_chance.max(0.0);
        if roll < weight {
            return i;
        }
        roll -= weight;
    }
    profiles.len() - 1
}
