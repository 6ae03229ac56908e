//! Planet Siege headless demo
//!
//! Plays one seeded session with a simple autopilot that leaps at the
//! nearest enemy, records its picks, replays the record and checks the
//! replay lands on the same state. Prints a JSON summary.
//!
//! Usage: `planet-siege [seed] [frames]`

use std::process::ExitCode;

use glam::Vec3;
use serde::Serialize;

use planet_siege::angle_between;
use planet_siege::consts::{PLANET_RADIUS, SIM_DT, UP};
use planet_siege::sim::{
    AttackPick, CameraSample, GameResult, Pose, Recorder, TickInput, World, WorldError, simulate,
};
use planet_siege::tuning::Tuning;

const DEFAULT_SEED: u64 = 2017;
const DEFAULT_FRAMES: u64 = 60 * 60;
/// Frames between autopilot picks
const PICK_INTERVAL: u64 = 45;
/// Chase camera: distance from the planet center in planet radii, vertical fov
const CAMERA_DISTANCE: f32 = 3.0;
const CAMERA_FOVY: f32 = 30.0;

#[derive(Serialize)]
struct Summary {
    seed: u64,
    frames: u64,
    picks: usize,
    replay_matches: bool,
    result: GameResult,
}

/// Nearest enemy to the player, in surface coordinates
fn autopilot_target(poses: &[Pose]) -> Option<Vec3> {
    let player = poses.iter().find(|p| p.kind == "player")?.rotation * UP;
    poses
        .iter()
        .filter(|p| p.kind == "enemy")
        .map(|p| p.rotation * UP)
        .filter(|pos| angle_between(*pos, player) > 0.05)
        .min_by(|a, b| angle_between(*a, player).total_cmp(&angle_between(*b, player)))
        .map(|pos| pos * PLANET_RADIUS)
}

/// Camera above the player, looking down at the planet
fn chase_camera(frame: u64, poses: &[Pose]) -> Option<CameraSample> {
    let player = poses.iter().find(|p| p.kind == "player")?;
    Some(CameraSample {
        frame,
        fovy: CAMERA_FOVY,
        eye: player.rotation * UP * PLANET_RADIUS * CAMERA_DISTANCE,
        rotation: player.rotation,
    })
}

fn run(seed: u64, frames: u64) -> Result<Summary, WorldError> {
    let tuning = Tuning::default();
    let mut world = World::with_defaults(seed)?;
    world.start_game();
    let mut recorder = Recorder::start(&mut world);

    let mut next_id = 0;
    for _ in 0..frames {
        let frame = world.frame();
        let mut input = TickInput::default();
        if frame > 0 && frame % PICK_INTERVAL == 0 {
            let poses = world.draw();
            if let Some(camera) = chase_camera(frame, &poses) {
                recorder.record_camera(camera);
            }
            if let Some(target) = autopilot_target(&poses) {
                next_id += 1;
                let pick = AttackPick {
                    target,
                    target_id: next_id,
                };
                recorder.record_pick(frame, pick);
                input.attack = Some(pick);
            }
        }
        world.tick(&input, SIM_DT);
    }

    let result = world.result();
    let poses = world.draw();
    let record = recorder.finish();
    log::info!(
        "session over: score {}, level {}, {} attacks",
        result.score.score,
        result.score.level,
        result.attacks.attacks
    );

    let replay = simulate(seed, frames, SIM_DT, &record, &tuning)?;
    let replay_matches =
        replay.result == result && replay.poses == poses && replay.camera == record.camera.last().copied();
    if !replay_matches {
        log::warn!("replay diverged from the recorded session");
    }

    Ok(Summary {
        seed,
        frames,
        picks: record.picks.len(),
        replay_matches,
        result,
    })
}

fn parse_arg(args: &[String], index: usize, default: u64) -> Result<u64, String> {
    match args.get(index) {
        Some(arg) => arg.parse().map_err(|e| format!("invalid argument `{arg}`: {e}")),
        None => Ok(default),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Planet Siege (headless) starting...");

    let args: Vec<String> = std::env::args().collect();
    let (seed, frames) = match (
        parse_arg(&args, 1, DEFAULT_SEED),
        parse_arg(&args, 2, DEFAULT_FRAMES),
    ) {
        (Ok(seed), Ok(frames)) => (seed, frames),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{e}\nusage: planet-siege [seed] [frames]");
            return ExitCode::FAILURE;
        }
    };

    let summary = match run(seed, frames) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("summary serialization failed: {e}");
            return ExitCode::FAILURE;
        }
    }
    if summary.replay_matches {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
