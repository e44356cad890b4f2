//! Frame animation: clips of timed texture frames and a cursor that walks
//! them under the fixed step.
//!
//! Time is counted in integer microseconds so a replay lands on the same
//! frame every run. Nothing here sleeps: a frame changes once enough
//! simulated time has been fed in.
//!
//! Clips are authored in JSON with millisecond durations:
//!
//! ```json
//! { "version": "0.1", "animation_id": "gomma",
//!   "animations": { "walk": { "looping": true, "frames": [
//!     { "texture": "assets/img/gomma/gomma-1.png", "duration_ms": 40 } ] } } }
//! ```

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const SUPPORTED_VERSION: &str = "0.1";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnimationFrame {
    pub texture: String,
    #[serde(rename = "duration_ms", deserialize_with = "millis_as_micros")]
    pub duration_us: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnimationClip {
    pub frames: Vec<AnimationFrame>,
    #[serde(default)]
    pub looping: bool,
}

impl AnimationClip {
    /// A clip whose frames all last `duration_us`.
    pub fn uniform<S: Into<String>>(
        textures: impl IntoIterator<Item = S>,
        duration_us: u64,
        looping: bool,
    ) -> Self {
        let frames = textures
            .into_iter()
            .map(|texture| AnimationFrame {
                texture: texture.into(),
                duration_us,
            })
            .collect();
        Self { frames, looping }
    }

    pub fn total_duration_us(&self) -> u64 {
        self.frames.iter().map(|f| f.duration_us).sum()
    }

    /// Texture of frame `frame_index`, clamped to the last frame. Empty for a
    /// clip with no frames.
    pub fn texture_at(&self, frame_index: usize) -> &str {
        self.frames
            .get(frame_index)
            .or_else(|| self.frames.last())
            .map_or("", |f| f.texture.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimationFile {
    pub version: String,
    pub animation_id: String,
    pub animations: BTreeMap<String, AnimationClip>,
}

/// Playback position inside one clip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationState {
    pub frame_index: usize,
    pub elapsed_us: u64,
    /// Set once a non-looping clip reaches its last frame.
    pub finished: bool,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `dt_us` of simulated time and return how many frame boundaries
    /// were crossed. Entities that act "once per animation frame" key off
    /// the count.
    pub fn advance(&mut self, dt_us: u64, clip: &AnimationClip) -> u32 {
        let frame_count = clip.frames.len();
        if frame_count == 0 || self.finished {
            return 0;
        }
        // The cursor may come from a longer clip sharing the same counter.
        self.frame_index %= frame_count;
        self.elapsed_us += dt_us;

        let mut crossed = 0;
        while let Some(frame) = clip.frames.get(self.frame_index) {
            if frame.duration_us == 0 || self.elapsed_us < frame.duration_us {
                break;
            }
            self.elapsed_us -= frame.duration_us;
            crossed += 1;

            if self.frame_index + 1 < frame_count {
                self.frame_index += 1;
            } else if clip.looping {
                self.frame_index = 0;
            } else {
                self.elapsed_us = 0;
                self.finished = true;
                break;
            }
        }
        crossed
    }
}

fn millis_as_micros<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let ms = u64::deserialize(deserializer)?;
    ms.checked_mul(1000)
        .ok_or_else(|| serde::de::Error::custom(format!("duration_ms {ms} is too large")))
}

pub fn load_animation_file(path: &Path) -> Result<AnimationFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read animation file {}: {e}", path.display()))?;
    parse_animation_file(&raw)
        .map_err(|e| format!("Failed to load animation file {}: {e}", path.display()))
}

pub fn parse_animation_file(raw: &str) -> Result<AnimationFile, String> {
    let file: AnimationFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    validate_animation_file(&file)?;
    Ok(file)
}

fn validate_animation_file(file: &AnimationFile) -> Result<(), String> {
    if file.version != SUPPORTED_VERSION {
        return Err(format!("unsupported version '{}'", file.version));
    }
    if file.animation_id.is_empty() {
        return Err("animation_id is empty".to_string());
    }
    for (name, clip) in &file.animations {
        if clip.frames.is_empty() {
            return Err(format!("clip '{name}' has no frames"));
        }
        if let Some(i) = clip.frames.iter().position(|f| f.texture.is_empty()) {
            return Err(format!("clip '{name}' frame {i} has an empty texture"));
        }
        if let Some(i) = clip.frames.iter().position(|f| f.duration_us == 0) {
            return Err(format!("clip '{name}' frame {i} has zero duration"));
        }
    }
    Ok(())
}
