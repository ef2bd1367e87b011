//! Aim Sim - aim trainer scenario simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (placement, scenarios, timing, replays, scoring)
//! - `settings`: User preferences consumed by the simulation
//! - `highscores`: Per-scenario leaderboard of finished runs
//! - `audio`: Sound signals emitted by the simulation and their playback seam
//! - `persistence`: JSON document load/save

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::Settings;

use glam::{Vec2, Vec3};

/// Simulation configuration constants
pub mod consts {
    /// Default replay frame rate (frames per second of run time)
    pub const DEFAULT_REPLAY_FPS: u32 = 60;

    /// Rejection sampling attempts before accepting an overlapping placement
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 200;
    /// Attempt indices at which the effective minimum distance is halved
    pub const PLACEMENT_RELAX_ATTEMPTS: [u32; 4] = [100, 150, 175, 190];

    /// Minimum time between renders during live play (microseconds)
    pub const LIVE_RENDER_BUDGET_MICROS: u64 = 1_200;
    /// Minimum time between renders during replay playback (microseconds)
    pub const REPLAY_RENDER_BUDGET_MICROS: u64 = 2_500;

    /// Scores are normalized to a run of this many seconds
    pub const NOMINAL_RUN_SECONDS: f32 = 60.0;
    /// Points per hit before accuracy/duration scaling
    pub const POINTS_PER_HIT: f32 = 10.0;

    /// Targets on a cylinder wall sit this many radii in front of the wall
    pub const CYLINDER_TARGET_INSET: f32 = 1.0;

    /// Dwell time required by poke scenarios when the definition omits it
    pub const DEFAULT_POKE_DWELL_SECONDS: f32 = 0.1;
    /// Health of tracking-kill targets when the profile omits it
    pub const DEFAULT_TARGET_HEALTH_SECONDS: f32 = 1.0;

    pub const MICROS_PER_SECOND: u64 = 1_000_000;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Wrap degrees to [-180, 180)
#[inline]
pub fn wrap_degrees(degrees: f32) -> f32 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit look direction for a camera pitch/yaw given in degrees.
///
/// Yaw 0 / pitch 0 looks down -Z, positive yaw turns right (+X) and positive
/// pitch looks up (+Y).
#[inline]
pub fn look_direction(pitch_degrees: f32, yaw_degrees: f32) -> Vec3 {
    let pitch = pitch_degrees.to_radians();
    let yaw = yaw_degrees.to_radians();
    Vec3::new(
        pitch.cos() * yaw.sin(),
        pitch.sin(),
        -pitch.cos() * yaw.cos(),
    )
}

/// Pitch/yaw in degrees that look along `dir` (inverse of [`look_direction`])
#[inline]
pub fn pitch_yaw_toward(dir: Vec3) -> (f32, f32) {
    let dir = dir.normalize_or_zero();
    let pitch = dir.y.clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = dir.x.atan2(-dir.z).to_degrees();
    (pitch, yaw)
}

/// Convert seconds of run time to whole microseconds
#[inline]
pub fn seconds_to_micros(seconds: f32) -> u64 {
    if seconds <= 0.0 {
        0
    } else {
        (f64::from(seconds) * consts::MICROS_PER_SECOND as f64).round() as u64
    }
}

/// Convert microseconds of run time to seconds
#[inline]
pub fn micros_to_seconds(micros: u64) -> f32 {
    (micros as f64 / consts::MICROS_PER_SECOND as f64) as f32
}
