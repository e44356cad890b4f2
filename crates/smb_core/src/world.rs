//! One fixed simulation step of the whole game, independent of window, GPU
//! and audio. The game crate feeds it input and plays back the sound cues it
//! returns.
//!
//! Step order: jump gate, horizontal movement and scroll, jump integration,
//! gap check and fall integration, walkers.

use crate::animation::AnimationClip;
use crate::collision::GapDetector;
use crate::config::GameConfig;
use crate::input::FrameInput;
use crate::level::LevelLayout;
use crate::motion::{Character, CharacterSprites, Phase};
use crate::scroll::{DecorationLayer, Heading, WorldScroll};
use crate::walker::{Walker, WalkerSpec};

pub const CHARACTER_ID: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Jump,
    StopMusic,
    Death,
}

pub struct GameWorld {
    config: GameConfig,
    layout: LevelLayout,
    character: Character,
    scroll: WorldScroll,
    detector: GapDetector,
    walkers: Vec<Walker>,
    /// Seconds since the last jump started; `None` before the first.
    since_jump: Option<f32>,
    death_announced: bool,
    steps: u64,
}

impl GameWorld {
    pub fn new(config: GameConfig, layout: LevelLayout, sprites: CharacterSprites) -> Self {
        let character = Character::new(CHARACTER_ID, config.physics, sprites);
        let scroll = WorldScroll::new(
            &layout,
            &config.level,
            config.scroll,
            config.physics.center_x,
            character.position(),
        );
        Self {
            detector: GapDetector::new(config.death),
            config,
            layout,
            character,
            scroll,
            walkers: Vec::new(),
            since_jump: None,
            death_announced: false,
            steps: 0,
        }
    }

    pub fn with_decorations(mut self, layers: Vec<DecorationLayer>) -> Self {
        self.scroll = self.scroll.with_layers(layers);
        self
    }

    pub fn with_walkers<'a>(
        mut self,
        specs: impl IntoIterator<Item = (&'a str, WalkerSpec)>,
        clip: &AnimationClip,
    ) -> Self {
        self.walkers.extend(
            specs
                .into_iter()
                .map(|(id, spec)| Walker::new(id, spec, clip.clone())),
        );
        self
    }

    pub fn step(&mut self, input: FrameInput, dt: f32) -> Vec<SoundCue> {
        let mut cues = Vec::new();
        let dt_us = (dt as f64 * 1_000_000.0).round() as u64;
        self.steps += 1;
        if let Some(elapsed) = self.since_jump.as_mut() {
            *elapsed += dt;
        }

        let alive = !self.character.is_falling();

        if alive && input.jump && self.jump_ready(input.run_modifier) {
            let backward = input.left && !input.right;
            if self.character.start_jump(input.run_modifier, backward) {
                self.since_jump = Some(0.0);
                cues.push(SoundCue::Jump);
            }
        }

        if alive {
            let heading = if input.right {
                self.character.run_forward(dt_us);
                Heading::Right
            } else if input.left {
                self.character.run_backward(dt_us);
                Heading::Left
            } else {
                self.character.stand();
                Heading::Idle
            };
            self.scroll
                .update(heading, input.run_modifier, self.character.position());
            self.character.update_jump(dt);
        }

        let running = self.scroll.running_position();
        if alive && self.detector.should_fall(&self.layout, running) && self.character.begin_fall() {
            log::info!(
                "Mario {} dropped into a gap at running x {:.1}",
                self.character.id(),
                running.x
            );
            if !self.death_announced {
                self.death_announced = true;
                cues.push(SoundCue::StopMusic);
                cues.push(SoundCue::Death);
            }
        }
        if self.character.phase() == Phase::Falling {
            self.character.update_fall(dt);
            if self.character.phase() == Phase::Dead {
                log::info!("Mario {} reached terminal depth", self.character.id());
            }
        }

        for walker in &mut self.walkers {
            walker.update(dt_us);
        }

        cues
    }

    fn jump_ready(&self, high: bool) -> bool {
        let cooldown = if high {
            self.config.jump.high_cooldown_s
        } else {
            self.config.jump.cooldown_s
        };
        self.since_jump.map_or(true, |elapsed| elapsed > cooldown)
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn scroll(&self) -> &WorldScroll {
        &self.scroll
    }

    pub fn layout(&self) -> &LevelLayout {
        &self.layout
    }

    pub fn walkers(&self) -> &[Walker] {
        &self.walkers
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_over(&self) -> bool {
        self.character.phase() == Phase::Dead
    }
}
