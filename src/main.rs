//! Aim Sim entry point
//!
//! Headless driver: runs a scenario under the autopilot on a simulated clock,
//! or plays back a recorded replay.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};

use aim_sim::audio::{AudioManager, LogSink};
use aim_sim::highscores::HighScoreEntry;
use aim_sim::persistence::{self, PersistenceError};
use aim_sim::sim::{
    Autopilot, MonotonicClock, PlaybackStep, ReplayPlayer, RunOutcome, Scenario, SimContext,
};
use aim_sim::{HighScores, Settings};

#[derive(Debug, Parser)]
#[command(name = "aim-sim", version, about = "Headless aim trainer scenario runner")]
struct Cli {
    /// Settings document (defaults are used when missing)
    #[arg(long, global = true, default_value = "settings.json")]
    settings: PathBuf,
    /// Simulated time per tick, in microseconds
    #[arg(long, global = true, default_value_t = 1_000)]
    tick_micros: u64,
    /// Pace ticks against the wall clock instead of simulating time
    #[arg(long, global = true)]
    realtime: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario with the autopilot aiming
    Run {
        scenario: PathBuf,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Write the run's replay here
        #[arg(long)]
        replay_out: Option<PathBuf>,
        /// Write the final stats here
        #[arg(long)]
        stats_out: Option<PathBuf>,
        /// Record the run on this leaderboard document
        #[arg(long)]
        highscores: Option<PathBuf>,
    },
    /// Play back a recorded replay
    Replay { replay: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Aim Sim starting...");

    let cli = Cli::parse();
    let settings = Settings::load(&cli.settings);
    let pace = Pace::new(cli.tick_micros.max(1), cli.realtime);

    let result = match cli.command {
        Command::Run {
            scenario,
            seed,
            replay_out,
            stats_out,
            highscores,
        } => run_scenario(
            &settings,
            pace,
            RunArgs {
                scenario,
                seed,
                replay_out,
                stats_out,
                highscores,
            },
        ),
        Command::Replay { replay } => play_replay(&settings, pace, replay),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

struct RunArgs {
    scenario: PathBuf,
    seed: u64,
    replay_out: Option<PathBuf>,
    stats_out: Option<PathBuf>,
    highscores: Option<PathBuf>,
}

/// Where tick timestamps come from
enum Pace {
    Simulated { tick_micros: u64, now: u64 },
    Realtime { clock: MonotonicClock, tick: Duration },
}

impl Pace {
    fn new(tick_micros: u64, realtime: bool) -> Self {
        if realtime {
            Pace::Realtime {
                clock: MonotonicClock::new(),
                tick: Duration::from_micros(tick_micros),
            }
        } else {
            Pace::Simulated { tick_micros, now: 0 }
        }
    }

    fn now(&self) -> u64 {
        match self {
            Pace::Simulated { now, .. } => *now,
            Pace::Realtime { clock, .. } => clock.now_micros(),
        }
    }

    /// Wait out one tick and return the new time
    fn advance(&mut self) -> u64 {
        match self {
            Pace::Simulated { tick_micros, now } => {
                *now += *tick_micros;
                *now
            }
            Pace::Realtime { clock, tick } => {
                std::thread::sleep(*tick);
                clock.now_micros()
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

fn run_scenario(settings: &Settings, mut pace: Pace, args: RunArgs) -> Result<(), PersistenceError> {
    let def = persistence::load_scenario(&args.scenario)?;
    let scenario_id = def.scenario_id.clone();
    let ctx = SimContext::new(args.seed).with_log_target(format!("aim_sim::{scenario_id}"));
    let mut scenario = Scenario::new(def, settings, ctx);
    let mut pilot = Autopilot::default();
    let mut audio = AudioManager::new(LogSink);
    audio.apply_settings(settings);

    scenario.initialize(pace.now());
    let outcome = loop {
        let now = pace.advance();
        let input = pilot.next_input(&scenario, now);
        let report = scenario.update(&input, now);
        audio.play_all(&report.sounds);
        if let Some(outcome) = report.outcome {
            break outcome;
        }
    };

    match &outcome {
        RunOutcome::Completed(stats) => {
            println!(
                "{scenario_id}: {} hits / {} shots ({:.1}%), score {:.1}",
                stats.effective_hits(),
                stats.shots_taken,
                stats.hit_percent * 100.0,
                stats.score
            );
            if let Some(path) = &args.stats_out {
                persistence::save_json(path, stats)?;
            }
            if let Some(path) = &args.highscores {
                let mut scores = HighScores::load(path);
                let entry = HighScoreEntry::from_stats(stats, unix_now());
                if let Some(rank) = scores.add_score(&scenario_id, entry) {
                    println!("New high score: rank {rank}");
                    scores.save(path);
                }
            }
        }
        RunOutcome::NoScore => println!("{scenario_id}: no shots taken, run discarded"),
        other => println!("{scenario_id}: run ended ({other:?})"),
    }

    if let Some(path) = &args.replay_out {
        if matches!(outcome, RunOutcome::Aborted) {
            log::warn!("not writing a replay for an aborted run");
        } else {
            persistence::save_replay(path, &scenario.into_replay_doc())?;
            log::info!("Replay written to {}", path.display());
        }
    }
    Ok(())
}

fn play_replay(settings: &Settings, mut pace: Pace, path: PathBuf) -> Result<(), PersistenceError> {
    let doc = persistence::load_replay(&path)?;
    let mut player = ReplayPlayer::new(doc);
    player.set_render_budget(settings.replay_render_budget_micros);
    let mut audio = AudioManager::new(LogSink);
    audio.apply_settings(settings);

    let mut now = pace.now();
    let mut renders = 0u64;
    player.start(now);
    loop {
        match player.update(now) {
            PlaybackStep::Frame { render, sounds, .. } => {
                audio.play_all(&sounds);
                renders += u64::from(render);
            }
            PlaybackStep::Ended => break,
        }
        now = pace.advance();
    }

    println!(
        "Replayed {} frames ({} renders), {} targets visible at the end",
        player.frame_count(),
        renders,
        player.store().visible_count()
    );
    Ok(())
}
