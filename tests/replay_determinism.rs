//! Every moving scenario type, driven by the autopilot, replays to exactly the
//! same targets and camera at every replay frame.

mod common;

use aim_sim::sim::def::{BarrelDef, CenteringDef, LinearDef, WallArcDef, WallStrafeDef, WallSwerveDef};
use aim_sim::sim::{
    PillDef, ReplayEvent, RoomDef, RoomShape, ScenarioDef, ScenarioKind, ShotType, TargetDef,
    TargetGrowth, TargetPlacementStrategy, TargetProfile,
};
use common::{box_room, play_back, record_autopilot_run, scenario_def};

const FRAMES: u64 = 150;

fn moving_targets(num_targets: u32, speed: f32) -> TargetDef {
    TargetDef {
        num_targets,
        profiles: vec![TargetProfile::new(3.0, speed)],
        placement: TargetPlacementStrategy {
            min_distance: Some(10.0),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn cylinder_room() -> RoomDef {
    RoomDef::new(RoomShape::Cylinder {
        radius: 100.0,
        height: 120.0,
        width: None,
        width_perimeter_percent: 0.5,
    })
}

fn assert_replays_exactly(def: ScenarioDef, seed: u64) {
    let recording = record_autopilot_run(def, seed, FRAMES);
    let (snapshots, cameras) = play_back(recording.doc, FRAMES, recording.frame_micros);
    assert_eq!(snapshots.len(), recording.snapshots.len());
    for (frame, (replayed, live)) in snapshots.iter().zip(&recording.snapshots).enumerate() {
        assert_eq!(replayed, live, "targets diverged at frame {frame}");
    }
    assert_eq!(cameras, recording.cameras);
}

#[test]
fn linear_replays_exactly() {
    let kind = ScenarioKind::Linear(LinearDef {
        min_angle_degrees: 0.0,
        max_angle_degrees: 360.0,
    });
    assert_replays_exactly(scenario_def(kind, ShotType::Click, box_room(), moving_targets(3, 40.0)), 1);
}

#[test]
fn centering_replays_exactly() {
    let kind = ScenarioKind::Centering(CenteringDef {
        through_center_percent: 0.1,
    });
    assert_replays_exactly(scenario_def(kind, ShotType::Click, box_room(), moving_targets(2, 30.0)), 2);
}

#[test]
fn barrel_replays_exactly() {
    let kind = ScenarioKind::Barrel(BarrelDef {
        inner_goal_percent: 0.6,
    });
    let room = RoomDef::new(RoomShape::Barrel { radius: 40.0 });
    assert_replays_exactly(scenario_def(kind, ShotType::Poke, room, moving_targets(2, 20.0)), 3);
}

#[test]
fn wall_arc_replays_exactly() {
    let kind = ScenarioKind::WallArc(WallArcDef {
        control_height_percent: 0.5,
        width_percent: 0.6,
        duration_seconds: 0.8,
    });
    assert_replays_exactly(scenario_def(kind, ShotType::Click, cylinder_room(), moving_targets(2, 0.0)), 4);
}

#[test]
fn wall_strafe_replays_exactly() {
    let kind = ScenarioKind::WallStrafe(WallStrafeDef {
        min_strafe_distance: 5.0,
        max_strafe_distance: 20.0,
        width_percent: 0.8,
    });
    let mut def = scenario_def(kind, ShotType::TrackingKill, box_room(), moving_targets(1, 50.0));
    def.target_def.profiles[0].health_seconds = Some(0.4);
    assert_replays_exactly(def, 5);
}

#[test]
fn wall_swerve_with_growth_and_pills_replays_exactly() {
    let kind = ScenarioKind::WallSwerve(WallSwerveDef {
        max_distance_from_origin: 25.0,
        turn_rate_degrees_per_second: 240.0,
        goal_radius: 2.0,
    });
    let mut targets = moving_targets(2, 35.0);
    targets.profiles[0].growth = Some(TargetGrowth {
        final_radius: 6.0,
        growth_time_seconds: 1.5,
    });
    targets.profiles[0].pill = Some(PillDef { height: 12.0 });
    targets.newest_target_is_ghost = true;
    assert_replays_exactly(scenario_def(kind, ShotType::Click, box_room(), targets), 6);
}

#[test]
fn static_with_expiry_replays_exactly() {
    let mut targets = moving_targets(3, 0.0);
    targets.remove_target_after_seconds = Some(0.7);
    targets.new_target_delay_seconds = 0.2;
    targets.stagger_initial_targets_seconds = 0.3;
    assert_replays_exactly(
        scenario_def(ScenarioKind::Static, ShotType::TrackingInvincible, box_room(), targets),
        7,
    );
}

#[test]
fn same_seed_records_same_run() {
    let kind = ScenarioKind::Linear(LinearDef {
        min_angle_degrees: 0.0,
        max_angle_degrees: 360.0,
    });
    let def = scenario_def(kind, ShotType::Click, box_room(), moving_targets(3, 40.0));
    let a = record_autopilot_run(def.clone(), 99, 90);
    let b = record_autopilot_run(def.clone(), 99, 90);
    let c = record_autopilot_run(def, 100, 90);
    assert_eq!(a.doc, b.doc);
    assert_eq!(a.snapshots, b.snapshots);
    assert_ne!(a.snapshots[0], c.snapshots[0]);
}

#[test]
fn moving_runs_log_kills_and_moves() {
    let kind = ScenarioKind::Linear(LinearDef {
        min_angle_degrees: 0.0,
        max_angle_degrees: 360.0,
    });
    let def = scenario_def(kind, ShotType::Click, box_room(), moving_targets(3, 40.0));
    let recording = record_autopilot_run(def, 11, FRAMES);
    let events = &recording.doc.events;
    assert!(events.windows(2).all(|w| w[0].frame_number <= w[1].frame_number));
    assert!(events
        .iter()
        .any(|e| matches!(e.event, ReplayEvent::MoveLinearTarget { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e.event, ReplayEvent::KillTarget { .. })));
    assert_eq!(recording.doc.pitch_yaws.len() as u64, FRAMES * 2);
}

#[test]
fn replay_document_round_trips_through_json() {
    let kind = ScenarioKind::WallStrafe(WallStrafeDef {
        min_strafe_distance: 5.0,
        max_strafe_distance: 20.0,
        width_percent: 0.8,
    });
    let def = scenario_def(kind, ShotType::Click, box_room(), moving_targets(2, 30.0));
    let recording = record_autopilot_run(def, 12, 60);
    let json = serde_json::to_string(&recording.doc).expect("serialize");
    let parsed = serde_json::from_str(&json).expect("parse");
    let (snapshots, cameras) = play_back(parsed, 60, recording.frame_micros);

    for (replayed, live) in snapshots.iter().zip(&recording.snapshots) {
        assert_eq!(replayed.len(), live.len());
        for (a, b) in replayed.iter().zip(live) {
            assert_eq!(a.id, b.id);
            assert!(a.wall_position.distance(b.wall_position) < 1e-3);
        }
    }
    for (a, b) in cameras.iter().zip(&recording.cameras) {
        assert!((a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4);
    }
}
