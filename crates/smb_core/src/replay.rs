//! Scripted key sequences for driving `GameWorld` without a window.
//!
//! ```json
//! { "fixed_dt": 0.01, "frames": [
//!     { "keys": ["right"], "repeat": 60 },
//!     { "keys": ["right", "jump", "run"] },
//!     { "repeat": 30 } ] }
//! ```
//!
//! A frame with no keys is an idle step.

use serde::Deserialize;
use std::fs;
use std::iter;
use std::path::Path;

use crate::input::FrameInput;
use crate::world::{GameWorld, SoundCue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayKey {
    Right,
    Left,
    Jump,
    Run,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayFrame {
    #[serde(default)]
    pub keys: Vec<ReplayKey>,
    #[serde(default = "one")]
    pub repeat: u32,
}

impl ReplayFrame {
    fn input(&self) -> FrameInput {
        self.keys
            .iter()
            .fold(FrameInput::default(), |mut input, key| {
                match key {
                    ReplayKey::Right => input.right = true,
                    ReplayKey::Left => input.left = true,
                    ReplayKey::Jump => input.jump = true,
                    ReplayKey::Run => input.run_modifier = true,
                }
                input
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Replay {
    #[serde(default = "hundred_hz")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

impl Replay {
    /// One input per fixed step, with each frame repeated in place.
    pub fn inputs(&self) -> impl Iterator<Item = FrameInput> + '_ {
        self.frames
            .iter()
            .flat_map(|frame| iter::repeat_n(frame.input(), frame.repeat as usize))
    }

    pub fn step_count(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat)).sum()
    }

    /// Feed every step into `world`, returning all emitted cues in order.
    pub fn play(&self, world: &mut GameWorld) -> Vec<SoundCue> {
        self.inputs()
            .flat_map(|input| world.step(input, self.fixed_dt))
            .collect()
    }
}

pub fn load_replay(path: &Path) -> Result<Replay, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read replay {}: {e}", path.display()))?;
    parse_replay(&raw).map_err(|e| format!("Failed to load replay {}: {e}", path.display()))
}

pub fn parse_replay(raw: &str) -> Result<Replay, String> {
    let replay: Replay = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if replay.fixed_dt.is_nan() || replay.fixed_dt <= 0.0 {
        return Err(format!("fixed_dt must be positive, got {}", replay.fixed_dt));
    }
    if replay.frames.is_empty() {
        return Err("replay has no frames".to_string());
    }
    if let Some(i) = replay.frames.iter().position(|f| f.repeat == 0) {
        return Err(format!("frame {i} repeats zero times"));
    }
    Ok(replay)
}

const fn hundred_hz() -> f32 {
    0.01
}

const fn one() -> u32 {
    1
}
