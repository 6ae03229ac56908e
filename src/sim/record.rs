//! Input recording and deterministic replay
//!
//! A record holds the player's starting rotation plus per-frame camera
//! poses and attack picks. Replaying it through [`simulate`] with the same
//! seed and tuning reproduces the session bit for bit.

use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::behavior::BehaviorFactory;
use super::message::{Message, keys};
use super::params::{Params, Pose};
use super::world::{AttackPick, GameResult, TickInput, World, WorldError};
use crate::tuning::Tuning;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("record format: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSample {
    pub frame: u64,
    pub fovy: f32,
    pub eye: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickSample {
    pub frame: u64,
    pub target: Vec3,
    pub target_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub player_rotation: Quat,
    pub camera: Vec<CameraSample>,
    pub picks: Vec<PickSample>,
}

impl Default for InputRecord {
    fn default() -> Self {
        Self {
            player_rotation: Quat::IDENTITY,
            camera: Vec::new(),
            picks: Vec::new(),
        }
    }
}

impl InputRecord {
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RecordError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// Accumulates a record while a session is played
#[derive(Debug, Default)]
pub struct Recorder {
    record: InputRecord,
}

impl Recorder {
    /// Start recording; the player's current rotation is captured
    pub fn start(world: &mut World) -> Self {
        let params = world.publish(Message::PlayerRecordInfo, Params::new());
        let player_rotation = params.get_quat(keys::ROTATE).unwrap_or(Quat::IDENTITY);
        Self {
            record: InputRecord {
                player_rotation,
                ..Default::default()
            },
        }
    }

    pub fn record_camera(&mut self, sample: CameraSample) {
        self.record.camera.push(sample);
    }

    pub fn record_pick(&mut self, frame: u64, pick: AttackPick) {
        self.record.picks.push(PickSample {
            frame,
            target: pick.target,
            target_id: pick.target_id,
        });
    }

    pub fn finish(self) -> InputRecord {
        debug!(
            "recorded {} picks, {} camera samples",
            self.record.picks.len(),
            self.record.camera.len()
        );
        self.record
    }
}

/// Cursor over a record; each sample is handed out once, at or after its frame
#[derive(Debug)]
pub struct Playback<'a> {
    record: &'a InputRecord,
    camera_index: usize,
    pick_index: usize,
}

impl<'a> Playback<'a> {
    pub fn new(record: &'a InputRecord) -> Self {
        Self {
            record,
            camera_index: 0,
            pick_index: 0,
        }
    }

    /// Rewind and force the recorded starting rotation onto the player
    pub fn start(&mut self, world: &mut World) {
        self.camera_index = 0;
        self.pick_index = 0;
        world.publish(
            Message::PlayerPlaybackInfo,
            Params::new().with(keys::ROTATE, self.record.player_rotation),
        );
    }

    pub fn camera(&mut self, frame: u64) -> Option<CameraSample> {
        let sample = *self.record.camera.get(self.camera_index)?;
        if frame < sample.frame {
            return None;
        }
        self.camera_index += 1;
        Some(sample)
    }

    pub fn pick(&mut self, frame: u64) -> Option<AttackPick> {
        let sample = *self.record.picks.get(self.pick_index)?;
        if frame < sample.frame {
            return None;
        }
        self.pick_index += 1;
        Some(AttackPick {
            target: sample.target,
            target_id: sample.target_id,
        })
    }

    /// No picks left to replay
    pub fn is_finished(&self) -> bool {
        self.pick_index == self.record.picks.len()
    }
}

/// State of a replayed session after its last frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub frames: u64,
    pub poses: Vec<Pose>,
    /// Last camera sample played back, if the record has any
    pub camera: Option<CameraSample>,
    pub result: GameResult,
}

/// Replay `record` from a fresh world for `frames` ticks of `dt`
pub fn simulate(
    seed: u64,
    frames: u64,
    dt: f32,
    record: &InputRecord,
    tuning: &Tuning,
) -> Result<SimulationResult, WorldError> {
    let mut world = World::new(seed, tuning, BehaviorFactory::default())?;
    world.start_game();

    let mut playback = Playback::new(record);
    playback.start(&mut world);
    let mut camera = None;
    for _ in 0..frames {
        while let Some(sample) = playback.camera(world.frame()) {
            camera = Some(sample);
        }
        let input = TickInput {
            attack: playback.pick(world.frame()),
            ..Default::default()
        };
        world.tick(&input, dt);
    }
    info!(
        "replayed {frames} frames (seed {seed}), {} picks left",
        record.picks.len() - playback.pick_index
    );

    Ok(SimulationResult {
        frames: world.frame(),
        poses: world.draw(),
        camera,
        result: world.result(),
    })
}
