//! Walker enemies: animate in place and march left until off screen.
//! Purely decorative, nothing collides with them.

use glam::Vec2;

use crate::animation::{AnimationClip, AnimationFile, AnimationState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkerSpec {
    pub position: Vec2,
    pub size: Vec2,
    /// Leftward distance per animation frame.
    pub step: f32,
    /// The walker stops once its x is no longer greater than this.
    pub min_x: f32,
}

impl Default for WalkerSpec {
    fn default() -> Self {
        Self {
            position: Vec2::new(2000.0, 480.0),
            size: Vec2::new(70.0, 70.0),
            step: 10.0,
            min_x: -200.0,
        }
    }
}

pub fn default_walker_clip() -> AnimationClip {
    AnimationClip::uniform(
        (1..=2).map(|i| format!("assets/img/gomma/gomma-{i}.png")),
        40_000,
        true,
    )
}

/// The `walk` clip of a walker animation file.
pub fn walker_clip_from_file(file: &AnimationFile) -> Result<AnimationClip, String> {
    file.animations
        .get("walk")
        .cloned()
        .ok_or_else(|| format!("animation '{}' is missing clip 'walk'", file.animation_id))
}

#[derive(Debug, Clone)]
pub struct Walker {
    pub id: String,
    position: Vec2,
    size: Vec2,
    step: f32,
    min_x: f32,
    clip: AnimationClip,
    animation: AnimationState,
}

impl Walker {
    pub fn new(id: impl Into<String>, spec: WalkerSpec, clip: AnimationClip) -> Self {
        Self {
            id: id.into(),
            position: spec.position,
            size: spec.size,
            step: spec.step,
            min_x: spec.min_x,
            clip,
            animation: AnimationState::new(),
        }
    }

    /// One march step per animation frame, however many frames elapsed.
    pub fn update(&mut self, dt_us: u64) {
        if self.animation.advance(dt_us, &self.clip) == 0 {
            return;
        }
        if self.position.x > self.min_x {
            self.position.x -= self.step;
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn frame_index(&self) -> usize {
        self.animation.frame_index
    }

    pub fn texture(&self) -> &str {
        self.clip.texture_at(self.animation.frame_index)
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }
}
