//! Scoring behaviour of each shot type across a whole run

mod common;

use aim_sim::Settings;
use aim_sim::audio::SoundEffect;
use aim_sim::sim::{
    ReplayEvent, RunOutcome, Scenario, ScenarioDef, ScenarioInput, ScenarioKind, ScenarioPhase,
    ShotType, SimContext, TargetDef, TargetPlacementStrategy, TargetProfile,
};
use common::{aim_at, aim_away, box_room, scenario_def, start};

const TICK: u64 = 10_000;

fn static_def(shot_type: ShotType, target_def: TargetDef) -> ScenarioDef {
    let mut def = scenario_def(ScenarioKind::Static, shot_type, box_room(), target_def);
    def.duration_seconds = 2.0;
    def.replay_frames_per_second = 100;
    def
}

fn single_target(health_seconds: Option<f32>) -> TargetDef {
    let mut profile = TargetProfile::new(3.0, 0.0);
    profile.health_seconds = health_seconds;
    TargetDef {
        num_targets: 1,
        profiles: vec![profile],
        ..Default::default()
    }
}

/// Tick from `*now` for `ticks` ticks, aiming at the first visible target when `on_target`
fn hold(scenario: &mut Scenario, now: &mut u64, ticks: u64, on_target: bool) -> Vec<SoundEffect> {
    let mut sounds = Vec::new();
    for _ in 0..ticks {
        *now += TICK;
        let input = match (on_target, scenario.store().visible_ids().first()) {
            (true, Some(&id)) => aim_at(scenario, id),
            _ => aim_away(),
        };
        let report = scenario.update(&input, *now);
        sounds.extend(report.sounds);
    }
    sounds
}

fn run_to_end(scenario: &mut Scenario, now: &mut u64) -> RunOutcome {
    loop {
        *now += TICK;
        if let Some(outcome) = scenario.update(&aim_away(), *now).outcome {
            return outcome;
        }
    }
}

#[test]
fn tracking_kill_drains_health_and_credits_partial_damage() {
    let mut scenario = start(static_def(ShotType::TrackingKill, single_target(Some(0.5))), 3);
    let first = scenario.store().visible_ids()[0];
    let mut now = 0;

    let sounds = hold(&mut scenario, &mut now, 45, true);
    assert!(sounds.contains(&SoundEffect::Hit));
    assert_eq!(scenario.stats().targets_hit, 0);
    let health = scenario.store().get(first).and_then(|t| t.health_seconds);
    assert!(health.is_some_and(|h| (h - 0.05).abs() < 1e-3), "{health:?}");

    let mut sounds = Vec::new();
    for _ in 0..10 {
        sounds.extend(hold(&mut scenario, &mut now, 1, true));
        if scenario.store().get(first).is_none() {
            break;
        }
    }
    assert!(sounds.contains(&SoundEffect::Kill));
    assert_eq!(scenario.stats().targets_hit, 1);
    assert_eq!(scenario.stats().shots_taken, 1);
    assert!(scenario.store().get(first).is_none());

    // Damage the replacement to 40%, then look away until time runs out
    let second = scenario.store().visible_ids()[0];
    assert_ne!(second, first);
    hold(&mut scenario, &mut now, 30, true);
    assert!(scenario.store().get(second).is_some());

    match run_to_end(&mut scenario, &mut now) {
        RunOutcome::Completed(stats) => {
            assert_eq!(stats.shots_taken, 2);
            assert!((stats.partial_hits - 0.6).abs() < 1e-3, "{}", stats.partial_hits);
            assert!((stats.hit_percent - 0.8).abs() < 1e-3);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(scenario.phase(), ScenarioPhase::Done);
}

#[test]
fn expiry_credits_partial_damage_when_enabled() {
    let mut target_def = single_target(Some(1.0));
    target_def.remove_target_after_seconds = Some(0.5);
    target_def.remove_target_partial_credit = true;
    let mut scenario = start(static_def(ShotType::TrackingKill, target_def), 8);
    let first = scenario.store().visible_ids()[0];
    let mut now = 0;

    hold(&mut scenario, &mut now, 20, true);
    hold(&mut scenario, &mut now, 31, false);
    assert!(scenario.store().get(first).is_none());
    assert_eq!(scenario.store().visible_count(), 1);
    assert_eq!(scenario.stats().shots_taken, 1);
    assert!((scenario.stats().partial_hits - 0.2).abs() < 1e-3);
    assert!(scenario
        .replay_log()
        .events()
        .iter()
        .any(|e| e.event == ReplayEvent::RemoveTarget { target_id: first }));
}

#[test]
fn expiry_without_partial_credit_only_replaces() {
    let mut target_def = single_target(None);
    target_def.remove_target_after_seconds = Some(0.3);
    let mut scenario = start(static_def(ShotType::Click, target_def), 9);
    let first = scenario.store().visible_ids()[0];
    let mut now = 0;
    hold(&mut scenario, &mut now, 35, false);
    assert!(scenario.store().get(first).is_none());
    assert_eq!(scenario.stats().shots_taken, 0);
    assert_eq!(scenario.stats().partial_hits, 0.0);
    assert_eq!(run_to_end(&mut scenario, &mut now), RunOutcome::NoScore);
}

#[test]
fn poke_switching_targets_resets_the_dwell() {
    let target_def = TargetDef {
        num_targets: 2,
        profiles: vec![TargetProfile::new(3.0, 0.0)],
        placement: TargetPlacementStrategy {
            min_distance: Some(20.0),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut def = static_def(ShotType::Poke, target_def);
    def.poke_dwell_seconds = 0.1;
    let mut scenario = start(def, 4);
    let ids = scenario.store().visible_ids();
    let mut now = 0;

    // Alternate between the two targets faster than the dwell
    for i in 0..12 {
        now += TICK;
        let id = ids[(i / 5) % 2];
        scenario.update(&aim_at(&scenario, id), now);
    }
    assert_eq!(scenario.stats().targets_hit, 0);
    assert_eq!(scenario.stats().shots_taken, 3);

    // Now stay on one
    let id = ids[0];
    for _ in 0..10 {
        now += TICK;
        let input = aim_at(&scenario, id);
        scenario.update(&input, now);
        if scenario.store().get(id).is_none() {
            break;
        }
    }
    assert!(scenario.store().get(id).is_none());
    assert_eq!(scenario.stats().targets_hit, 1);
}

#[test]
fn tracking_invincible_scores_time_on_target() {
    let mut scenario = start(static_def(ShotType::TrackingInvincible, single_target(None)), 6);
    let mut now = 0;
    hold(&mut scenario, &mut now, 50, true);
    hold(&mut scenario, &mut now, 50, false);
    assert_eq!(scenario.store().visible_count(), 1);
    match run_to_end(&mut scenario, &mut now) {
        RunOutcome::Completed(stats) => {
            assert_eq!(stats.shots_taken, 199);
            assert_eq!(stats.targets_hit, 50);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn unsupported_document_aborts_without_targets() {
    let json = r#"{
        "scenario_id": "future",
        "duration_seconds": 30,
        "target_def": {"profiles": [{"target_radius": 2}]},
        "room": {"shape": {"type": "box", "width": 100, "height": 100, "depth": 100}},
        "kind": {"type": "teleporting_wall"}
    }"#;
    let def: ScenarioDef = serde_json::from_str(json).expect("parse");
    let mut scenario = Scenario::new(def, &Settings::default(), SimContext::new(1));
    scenario.initialize(0);
    let report = scenario.update(&ScenarioInput::default(), TICK);
    assert_eq!(report.outcome, Some(RunOutcome::Aborted));
    assert_eq!(scenario.phase(), ScenarioPhase::Done);
    assert_eq!(scenario.store().visible_count(), 0);
    assert!(scenario.replay_log().events().is_empty());
}

#[test]
fn staggered_spawns_arrive_over_time() {
    let mut target_def = single_target(None);
    target_def.num_targets = 3;
    target_def.stagger_initial_targets_seconds = 0.5;
    let mut scenario = start(static_def(ShotType::Click, target_def), 2);
    let mut now = 0;
    assert_eq!(scenario.store().visible_count(), 1);
    hold(&mut scenario, &mut now, 50, false);
    assert_eq!(scenario.store().visible_count(), 2);
    hold(&mut scenario, &mut now, 50, false);
    assert_eq!(scenario.store().visible_count(), 3);
}
