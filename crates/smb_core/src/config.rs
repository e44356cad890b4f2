//! Tunables for the whole game, loaded from `assets/config/game.json`.
//!
//! Every section and field has a default, so the file may be partial or
//! absent. A missing file is normal; a malformed one is logged and ignored.

use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/game.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub scroll: ScrollConfig,
    pub death: DeathConfig,
    pub jump: JumpConfig,
    pub level: LevelConfig,
    pub window: WindowConfig,
    pub assets: AssetPaths,
}

/// Character physics. Screen space: y grows downward.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    /// Initial vertical velocity of a jump (negative is up).
    pub jump_force: f32,
    /// Subtracted from the vertical velocity of a high jump before integration.
    pub high_jump_offset: f32,
    pub backward_jump_speed: f32,
    /// Resting y of the character's top edge.
    pub ground_y: f32,
    pub fall_gravity_multiplier: f32,
    pub initial_fall_speed: f32,
    pub max_fall_speed: f32,
    /// Depth where a fall stops for good.
    pub terminal_y: f32,
    /// Screen x the character drifts toward before the world starts scrolling.
    pub center_x: f32,
    pub forward_nudge: f32,
    pub backward_step: f32,
    pub spawn_x: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            jump_force: -500.0,
            high_jump_offset: 150.0,
            backward_jump_speed: -150.0,
            ground_y: 475.0,
            fall_gravity_multiplier: 20.0,
            initial_fall_speed: 0.1,
            max_fall_speed: 1500.0,
            terminal_y: 1000.0,
            center_x: 390.0,
            forward_nudge: 20.0,
            backward_step: 20.0,
            spawn_x: 390.0,
            width: 75.0,
            height: 75.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    /// The world scrolls once the character's screen x exceeds this.
    pub scroll_threshold_x: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            walk_speed: 8.0,
            run_speed: 15.0,
            scroll_threshold_x: 380.0,
        }
    }
}

/// Which slice of the running position is probed against the gap set.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CollisionWindow {
    /// `[x - width, x]`
    Trailing { width: f32 },
    /// `[x, x + width]`
    Leading { width: f32 },
}

impl Default for CollisionWindow {
    fn default() -> Self {
        Self::Trailing { width: 30.0 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DeathConfig {
    pub window: CollisionWindow,
    /// Only a character lower than this (larger y) can drop into a gap.
    pub ground_threshold_y: f32,
}

impl Default for DeathConfig {
    fn default() -> Self {
        Self {
            window: CollisionWindow::default(),
            ground_threshold_y: 450.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub cooldown_s: f32,
    pub high_cooldown_s: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            cooldown_s: 1.0,
            high_cooldown_s: 1.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub path: String,
    pub column_width: f32,
    pub stack_top_y: f32,
    pub stack_depth: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            path: "assets/level/Level0-brick.dat".to_string(),
            column_width: 50.0,
            stack_top_y: 550.0,
            stack_depth: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Super Mario Bros".to_string(),
            width: 1600,
            height: 900,
            target_fps: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub scene: String,
    pub mario_animation: String,
    pub walker_animation: String,
    pub brick_texture: String,
    pub music: String,
    pub jump_sound: String,
    pub death_sound: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            scene: "assets/scenes/level0.json".to_string(),
            mario_animation: "assets/animations/mario.json".to_string(),
            walker_animation: "assets/animations/gomma.json".to_string(),
            brick_texture: "assets/img/brick-1.png".to_string(),
            music: "assets/audio/gameplay-ground.ogg".to_string(),
            jump_sound: "assets/audio/jump-small.wav".to_string(),
            death_sound: "assets/audio/mariodie.wav".to_string(),
        }
    }
}

impl GameConfig {
    /// Read the config at `path`, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!(
                "No config at '{}', using built-in defaults",
                path.display()
            );
            return Self::default();
        }
        match load_config_from_path(path) {
            Ok(config) => {
                log::info!("Loaded config '{}'", path.display());
                config
            }
            Err(err) => {
                log::warn!("{err}. Using built-in defaults.");
                Self::default()
            }
        }
    }

    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.window.target_fps.max(1) as f32
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&raw).map_err(|e| format!("Invalid config {}: {e}", path.display()))
}

pub fn parse_config(raw: &str) -> Result<GameConfig, String> {
    let config: GameConfig = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.level.column_width <= 0.0 {
        return Err("level.column_width must be > 0".to_string());
    }
    if config.window.target_fps == 0 {
        return Err("window.target_fps must be > 0".to_string());
    }
    if config.physics.max_fall_speed <= 0.0 {
        return Err("physics.max_fall_speed must be > 0".to_string());
    }
    if config.physics.terminal_y <= config.physics.ground_y {
        return Err("physics.terminal_y must lie below physics.ground_y".to_string());
    }
    Ok(())
}
