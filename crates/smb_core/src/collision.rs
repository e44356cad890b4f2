//! Gap detection: decides when the character has walked off the floor.
//!
//! Gameplay truth here is one dimensional. The running position is probed
//! against the level's gap set at the two ends of a short window; a hit while
//! the character is still down on ground level starts the fall.

use crate::config::{CollisionWindow, DeathConfig};
use crate::level::LevelLayout;
use glam::Vec2;

impl CollisionWindow {
    /// World-x endpoints probed for a running x.
    pub fn probe(self, running_x: f32) -> (f32, f32) {
        match self {
            Self::Trailing { width } => (running_x - width, running_x),
            Self::Leading { width } => (running_x, running_x + width),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GapDetector {
    window: CollisionWindow,
    ground_threshold_y: f32,
}

impl GapDetector {
    pub fn new(config: DeathConfig) -> Self {
        Self {
            window: config.window,
            ground_threshold_y: config.ground_threshold_y,
        }
    }

    pub fn window(&self) -> CollisionWindow {
        self.window
    }

    /// Whether either end of the probe window lies over a gap. A layout with
    /// no columns has no floor anywhere.
    pub fn over_gap(&self, layout: &LevelLayout, running_x: f32) -> bool {
        if layout.is_empty() {
            return true;
        }
        let (lo, hi) = self.window.probe(running_x);
        layout.gaps().contains(lo) || layout.gaps().contains(hi)
    }

    /// A character above the threshold (mid-jump) passes over gaps freely.
    pub fn should_fall(&self, layout: &LevelLayout, running: Vec2) -> bool {
        running.y > self.ground_threshold_y && self.over_gap(layout, running.x)
    }
}
