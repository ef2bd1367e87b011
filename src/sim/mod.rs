//! Deterministic simulation module
//!
//! All scenario logic lives here. This module must be pure and deterministic:
//! - Time comes in from the caller, never from a hidden clock
//! - Seeded RNG only, carried by [`SimContext`]
//! - Stable iteration order (target store slot order)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod context;
pub mod def;
pub mod kinds;
pub mod metronome;
pub mod placement;
pub mod region;
pub mod replay;
pub mod room;
pub mod scenario;
pub mod score;
pub mod store;
pub mod target;
pub mod timer;

pub use autopilot::Autopilot;
pub use collision::{RayHit, ray_capsule, ray_sphere};
pub use context::SimContext;
pub use def::{ScenarioDef, ScenarioKind, ShotType, TargetDef};
pub use kinds::{FrameWindow, KindState};
pub use metronome::Metronome;
pub use placement::{TargetPlacementStrategy, TargetPlacer};
pub use region::{Length, RegionShape, TargetRegion};
pub use replay::{PlaybackStep, RecordedEvent, ReplayDoc, ReplayEvent, ReplayLog, ReplayPlayer, apply_event};
pub use room::{RoomDef, RoomShape, Wall, resolve_wall, wall_to_world};
pub use scenario::{RunOutcome, Scenario, ScenarioInput, ScenarioPhase, TickReport};
pub use score::{ScenarioStats, compute_score};
pub use store::{TargetSnapshot, TargetStore};
pub use target::{LinearMotion, PillDef, Target, TargetGrowth, TargetId, TargetProfile};
pub use timer::{MonotonicClock, ScenarioTimer, Stopwatch};
