//! Shared builders for the integration tests
#![allow(dead_code)]

use aim_sim::Settings;
use aim_sim::pitch_yaw_toward;
use aim_sim::sim::{
    Autopilot, PlaybackStep, ReplayDoc, ReplayPlayer, RoomDef, RoomShape, Scenario, ScenarioDef,
    ScenarioInput, ScenarioKind, ShotType, SimContext, TargetDef, TargetId, TargetSnapshot,
};

pub fn box_room() -> RoomDef {
    RoomDef::new(RoomShape::Box {
        width: 170.0,
        height: 150.0,
        depth: 200.0,
    })
}

pub fn scenario_def(kind: ScenarioKind, shot_type: ShotType, room: RoomDef, target_def: TargetDef) -> ScenarioDef {
    ScenarioDef {
        scenario_id: "integration".to_string(),
        duration_seconds: 5.0,
        shot_type,
        poke_dwell_seconds: 0.1,
        target_def,
        room,
        kind,
        replay_frames_per_second: 60,
    }
}

pub fn start(def: ScenarioDef, seed: u64) -> Scenario {
    let mut scenario = Scenario::new(def, &Settings::default(), SimContext::new(seed));
    scenario.initialize(0);
    scenario
}

/// Input that looks straight at a target
pub fn aim_at(scenario: &Scenario, id: TargetId) -> ScenarioInput {
    let target = scenario.store().get(id).expect("target is live");
    ScenarioInput {
        look_override: Some(pitch_yaw_toward(target.position - scenario.camera())),
        ..Default::default()
    }
}

/// Input that looks away from the wall
pub fn aim_away() -> ScenarioInput {
    ScenarioInput {
        look_override: Some((0.0, 180.0)),
        ..Default::default()
    }
}

pub fn frame_micros(def: &ScenarioDef) -> u64 {
    1_000_000 / u64::from(def.replay_frames_per_second)
}

/// Target state and camera per replay frame of a live run
pub struct Recording {
    pub snapshots: Vec<Vec<TargetSnapshot>>,
    pub cameras: Vec<(f32, f32)>,
    pub doc: ReplayDoc,
    pub frame_micros: u64,
}

/// Run `frames` replay frames under the autopilot, ticking exactly on frame boundaries
pub fn record_autopilot_run(def: ScenarioDef, seed: u64, frames: u64) -> Recording {
    let frame = frame_micros(&def);
    let mut scenario = start(def, seed);
    let mut pilot = Autopilot::default();

    let mut snapshots = vec![scenario.store().snapshot()];
    let mut cameras = vec![scenario.pitch_yaw()];
    for k in 1..frames {
        let now = k * frame;
        let input = pilot.next_input(&scenario, now);
        let report = scenario.update(&input, now);
        assert!(report.outcome.is_none(), "run ended early at frame {k}");
        assert!(report.new_replay_frame);
        snapshots.push(scenario.store().snapshot());
        cameras.push(scenario.pitch_yaw());
    }
    Recording {
        snapshots,
        cameras,
        doc: scenario.replay_doc(),
        frame_micros: frame,
    }
}

/// Play a replay frame by frame, collecting the same views as [`Recording`]
pub fn play_back(doc: ReplayDoc, frames: u64, frame: u64) -> (Vec<Vec<TargetSnapshot>>, Vec<(f32, f32)>) {
    let mut player = ReplayPlayer::new(doc);
    player.start(0);
    let mut snapshots = Vec::new();
    let mut cameras = Vec::new();
    for k in 0..frames {
        match player.update(k * frame) {
            PlaybackStep::Frame {
                frame: index,
                pitch,
                yaw,
                ..
            } => {
                assert_eq!(index, k);
                snapshots.push(player.store().snapshot());
                cameras.push((pitch, yaw));
            }
            PlaybackStep::Ended => panic!("replay ended early at frame {k}"),
        }
    }
    (snapshots, cameras)
}
