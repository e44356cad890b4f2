//! Scrolling world: the camera never moves, the world slides past it.
//!
//! When the character runs right past the scroll threshold every floor brick
//! and decoration is shifted left instead of moving the character. The
//! character's progress through the level is tracked as the *running
//! position*, rebuilt each step from the reference brick (the last one
//! stored, bottom of the right-most solid column) and the character's screen
//! x.

use glam::Vec2;
use serde::Deserialize;

use crate::config::{LevelConfig, ScrollConfig};
use crate::level::LevelLayout;

/// Horizontal input for one step. Right wins over Left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Right,
    Left,
    Idle,
}

/// How a decoration layer reacts to a scroll step.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayerDrift {
    /// Moves with the floor.
    World,
    /// Moves by its own fixed amount per scroll step (distant clouds).
    Fixed { speed: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub id: String,
    pub texture: String,
    pub position: Vec2,
    pub size: Vec2,
}

#[derive(Debug, Clone)]
pub struct DecorationLayer {
    pub id: String,
    pub drift: LayerDrift,
    pub items: Vec<Decoration>,
}

impl DecorationLayer {
    fn shift(&mut self, world_speed: f32) {
        let dx = match self.drift {
            LayerDrift::World => world_speed,
            LayerDrift::Fixed { speed } => speed,
        };
        for item in &mut self.items {
            item.position.x -= dx;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollStep {
    pub scrolled: bool,
    pub speed: f32,
}

pub struct WorldScroll {
    bricks: Vec<Vec2>,
    brick_size: Vec2,
    layers: Vec<DecorationLayer>,
    total_length: f32,
    anchor_fallback_x: f32,
    offset: f32,
    running: Vec2,
    config: ScrollConfig,
}

impl WorldScroll {
    /// `anchor_fallback_x` stands in for the reference brick when the level
    /// has none; `start` is the running position before the first step.
    pub fn new(
        layout: &LevelLayout,
        level: &LevelConfig,
        config: ScrollConfig,
        anchor_fallback_x: f32,
        start: Vec2,
    ) -> Self {
        Self {
            bricks: layout.brick_positions(level.stack_top_y, level.stack_depth),
            brick_size: Vec2::splat(layout.column_width()),
            layers: Vec::new(),
            total_length: layout.total_length(),
            anchor_fallback_x,
            offset: 0.0,
            running: start,
            config,
        }
    }

    pub fn with_layers(mut self, layers: Vec<DecorationLayer>) -> Self {
        self.layers = layers;
        self
    }

    pub fn speed(&self, run_modifier: bool) -> f32 {
        if run_modifier {
            self.config.run_speed
        } else {
            self.config.walk_speed
        }
    }

    /// Current screen x of the reference brick.
    pub fn reference_x(&self) -> f32 {
        self.bricks
            .last()
            .map_or(self.anchor_fallback_x, |brick| brick.x)
    }

    /// Apply one step of horizontal intent. `character` is the character's
    /// screen position after its own movement this step.
    pub fn update(&mut self, heading: Heading, run_modifier: bool, character: Vec2) -> ScrollStep {
        let speed = self.speed(run_modifier);
        let x0 = self.reference_x();
        let sx = character.x;
        let t = self.total_length;

        let (running_x, scrolled) = match heading {
            Heading::Right if sx > self.config.scroll_threshold_x => {
                self.shift_world(speed);
                (t - x0 + speed + sx, true)
            }
            Heading::Right => (t - x0 + speed + sx, false),
            Heading::Left => (t + sx - x0, false),
            Heading::Idle => (t - x0 + sx, false),
        };

        self.running = Vec2::new(running_x, character.y);
        ScrollStep { scrolled, speed }
    }

    fn shift_world(&mut self, speed: f32) {
        for brick in &mut self.bricks {
            brick.x -= speed;
        }
        for layer in &mut self.layers {
            layer.shift(speed);
        }
        self.offset += speed;
        log::trace!("World scrolled by {speed}, total offset {}", self.offset);
    }

    pub fn running_position(&self) -> Vec2 {
        self.running
    }

    /// Top-left corners of the floor bricks in screen space.
    pub fn bricks(&self) -> &[Vec2] {
        &self.bricks
    }

    pub fn brick_size(&self) -> Vec2 {
        self.brick_size
    }

    pub fn layers(&self) -> &[DecorationLayer] {
        &self.layers
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Total distance the floor has moved left since the start.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Screen x of a level-space x (for debug drawing of gap bands).
    pub fn level_to_screen_x(&self, level_x: f32) -> f32 {
        level_x - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: Vec2 = Vec2::new(390.0, 475.0);

    fn scroll_for(markers: &str) -> WorldScroll {
        let layout = LevelLayout::parse(markers, 50.0);
        WorldScroll::new(
            &layout,
            &LevelConfig::default(),
            ScrollConfig::default(),
            390.0,
            START,
        )
    }

    fn clouds_and_bushes() -> Vec<DecorationLayer> {
        let item = |id: &str, x: f32, y: f32| Decoration {
            id: id.to_string(),
            texture: format!("assets/img/{id}.png"),
            position: Vec2::new(x, y),
            size: Vec2::new(120.0, 80.0),
        };
        vec![
            DecorationLayer {
                id: "clouds".to_string(),
                drift: LayerDrift::Fixed { speed: 2.0 },
                items: vec![item("cloud", 100.0, 100.0)],
            },
            DecorationLayer {
                id: "bushes".to_string(),
                drift: LayerDrift::World,
                items: vec![item("bush", 150.0, 500.0)],
            },
        ]
    }

    #[test]
    fn reference_brick_is_bottom_of_rightmost_column() {
        let scroll = scroll_for("1101");
        assert_eq!(scroll.reference_x(), 150.0);
        assert_eq!(scroll.bricks().len(), 30);
        assert_eq!(scroll.brick_size(), Vec2::splat(50.0));
    }

    #[test]
    fn empty_level_anchors_on_fallback() {
        let scroll = scroll_for("");
        assert_eq!(scroll.reference_x(), 390.0);
        assert_eq!(scroll.total_length(), 0.0);
        assert_eq!(scroll.running_position(), START);
    }

    #[test]
    fn right_past_threshold_scrolls_everything() {
        let mut scroll = scroll_for("1111").with_layers(clouds_and_bushes());
        let step = scroll.update(Heading::Right, false, Vec2::new(390.0, 475.0));
        assert!(step.scrolled);
        assert_eq!(step.speed, 8.0);
        assert_eq!(scroll.bricks()[0].x, -8.0);
        assert_eq!(scroll.reference_x(), 142.0);
        assert_eq!(scroll.layers()[0].items[0].position.x, 98.0);
        assert_eq!(scroll.layers()[1].items[0].position.x, 142.0);
        // T - x0 + speed + sx with x0 taken before the shift.
        assert_eq!(scroll.running_position(), Vec2::new(200.0 - 150.0 + 8.0 + 390.0, 475.0));
        assert_eq!(scroll.offset(), 8.0);
        assert_eq!(scroll.level_to_screen_x(100.0), 92.0);
    }

    #[test]
    fn run_modifier_scrolls_faster() {
        let mut scroll = scroll_for("1111");
        let step = scroll.update(Heading::Right, true, Vec2::new(390.0, 475.0));
        assert_eq!(step.speed, 15.0);
        assert_eq!(scroll.bricks()[0].x, -15.0);
    }

    #[test]
    fn right_below_threshold_does_not_scroll() {
        let mut scroll = scroll_for("1111").with_layers(clouds_and_bushes());
        let step = scroll.update(Heading::Right, false, Vec2::new(370.0, 475.0));
        assert!(!step.scrolled);
        assert_eq!(scroll.bricks()[0].x, 0.0);
        assert_eq!(scroll.layers()[0].items[0].position.x, 100.0);
        assert_eq!(scroll.running_position().x, 200.0 - 150.0 + 8.0 + 370.0);
    }

    #[test]
    fn left_and_idle_formulas() {
        let mut scroll = scroll_for("1111");
        scroll.update(Heading::Left, false, Vec2::new(370.0, 475.0));
        assert_eq!(scroll.running_position().x, 200.0 + 370.0 - 150.0);
        scroll.update(Heading::Idle, true, Vec2::new(370.0, 400.0));
        assert_eq!(scroll.running_position(), Vec2::new(200.0 - 150.0 + 370.0, 400.0));
    }

    #[test]
    fn running_position_increases_while_right_is_held() {
        let mut scroll = scroll_for(&"1".repeat(200));
        let mut last = f32::NEG_INFINITY;
        for _ in 0..100 {
            scroll.update(Heading::Right, false, Vec2::new(390.0, 475.0));
            let x = scroll.running_position().x;
            assert!(x > last);
            last = x;
        }
    }

    #[test]
    fn releasing_right_keeps_running_position() {
        let mut scroll = scroll_for(&"1".repeat(200));
        for _ in 0..10 {
            scroll.update(Heading::Right, true, Vec2::new(390.0, 475.0));
        }
        let held = scroll.running_position();
        scroll.update(Heading::Idle, false, Vec2::new(390.0, 475.0));
        assert_eq!(scroll.running_position(), held);
    }
}
