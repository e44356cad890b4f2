pub mod animation;
pub mod collision;
pub mod config;
pub mod error;
pub mod input;
pub mod level;
pub mod motion;
pub mod replay;
pub mod scene;
pub mod scroll;
pub mod time;
pub mod walker;
pub mod world;

pub use config::GameConfig;
pub use error::LoadFailure;
pub use input::{FrameInput, InputState, Key};
pub use level::LevelLayout;
pub use motion::{Character, CharacterSprites, CharacterState};
pub use time::{FrameLimiter, TimeState};
pub use world::{GameWorld, SoundCue};
