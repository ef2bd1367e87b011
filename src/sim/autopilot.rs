//! Demo mode: the scenario plays itself
//!
//! Picks the killable target closest to the crosshair, turns toward it at a
//! bounded rate and clicks once the crosshair is on it.

use super::def::ShotType;
use super::scenario::{Scenario, ScenarioInput};
use super::target::TargetId;
use crate::{look_direction, micros_to_seconds, pitch_yaw_toward, wrap_degrees};

#[derive(Debug, Clone)]
pub struct Autopilot {
    turn_rate_degrees_per_second: f32,
    /// Minimum time between clicks
    shot_interval_micros: u64,
    last_shot_micros: Option<u64>,
    last_tick_micros: Option<u64>,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(360.0, 150_000)
    }
}

impl Autopilot {
    pub fn new(turn_rate_degrees_per_second: f32, shot_interval_micros: u64) -> Self {
        Self {
            turn_rate_degrees_per_second,
            shot_interval_micros,
            last_shot_micros: None,
            last_tick_micros: None,
        }
    }

    /// Killable target needing the smallest turn
    fn pick_target(scenario: &Scenario) -> Option<TargetId> {
        let camera = scenario.camera();
        let look = scenario.look();
        scenario
            .store()
            .visible()
            .filter(|t| t.is_killable())
            .map(|t| (t.id, look.angle_between(t.position - camera)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }

    /// Input for the tick at `now`
    pub fn next_input(&mut self, scenario: &Scenario, now: u64) -> ScenarioInput {
        let dt = micros_to_seconds(now.saturating_sub(self.last_tick_micros.unwrap_or(now)));
        self.last_tick_micros = Some(now);

        let (pitch, yaw) = scenario.pitch_yaw();
        let Some(id) = Self::pick_target(scenario) else {
            return ScenarioInput::default();
        };
        let Some(target) = scenario.store().get(id) else {
            return ScenarioInput::default();
        };

        let camera = scenario.camera();
        let (want_pitch, want_yaw) = pitch_yaw_toward(target.position - camera);
        let d_pitch = want_pitch - pitch;
        let d_yaw = wrap_degrees(want_yaw - yaw);
        let distance = (d_pitch * d_pitch + d_yaw * d_yaw).sqrt();
        let max_step = self.turn_rate_degrees_per_second * dt;
        let scale = if distance > max_step && distance > 0.0 {
            max_step / distance
        } else {
            1.0
        };
        let look = (pitch + d_pitch * scale, wrap_degrees(yaw + d_yaw * scale));

        let on_target = scenario
            .store()
            .get_nearest_hit_target(camera, look_direction(look.0, look.1))
            == Some(id);
        let ready = self
            .last_shot_micros
            .is_none_or(|last| now.saturating_sub(last) >= self.shot_interval_micros);
        let click_down = on_target && ready && scenario.def().shot_type == ShotType::Click;
        if click_down {
            self.last_shot_micros = Some(now);
        }

        ScenarioInput {
            look_override: Some(look),
            click_down,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::context::SimContext;
    use crate::sim::def::{ScenarioDef, ScenarioKind, TargetDef};
    use crate::sim::room::{RoomDef, RoomShape};
    use crate::sim::scenario::RunOutcome;

    fn scenario(shot_type: ShotType) -> Scenario {
        let def = ScenarioDef {
            scenario_id: "autopilot".to_string(),
            duration_seconds: 5.0,
            shot_type,
            poke_dwell_seconds: 0.1,
            target_def: TargetDef {
                num_targets: 3,
                ..Default::default()
            },
            room: RoomDef::new(RoomShape::Box {
                width: 170.0,
                height: 150.0,
                depth: 200.0,
            }),
            kind: ScenarioKind::Static,
            replay_frames_per_second: 60,
        };
        Scenario::new(def, &Settings::default(), SimContext::new(3))
    }

    fn play(scenario: &mut Scenario) -> RunOutcome {
        let mut pilot = Autopilot::default();
        scenario.initialize(0);
        let mut now = 0;
        loop {
            now += 5_000;
            let input = pilot.next_input(scenario, now);
            if let Some(outcome) = scenario.update(&input, now).outcome {
                return outcome;
            }
        }
    }

    #[test]
    fn test_clicks_targets_down() {
        let mut s = scenario(ShotType::Click);
        match play(&mut s) {
            RunOutcome::Completed(stats) => {
                assert!(stats.targets_hit > 5, "{stats:?}");
                assert_eq!(stats.targets_hit, stats.shots_taken);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_pokes_targets_down() {
        let mut s = scenario(ShotType::Poke);
        match play(&mut s) {
            RunOutcome::Completed(stats) => assert!(stats.targets_hit > 5, "{stats:?}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_turn_rate_is_bounded() {
        let mut s = scenario(ShotType::Click);
        s.initialize(0);
        let mut pilot = Autopilot::new(90.0, 0);
        pilot.next_input(&s, 0);
        let input = pilot.next_input(&s, 100_000);
        let (pitch, yaw) = input.look_override.expect("aiming");
        let turned = (pitch * pitch + yaw * yaw).sqrt();
        assert!(turned <= 9.0 + 1e-3, "turned {turned}");
    }
}
