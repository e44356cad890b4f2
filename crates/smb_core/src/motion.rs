//! Character motion: jump/fall integration, run cadence and sprite selection.
//!
//! Vertical motion is a small state machine. `transition` is the whole table;
//! every mutator routes its phase change through it, so there is no way to be
//! "jumping" and "falling" at once. Horizontal gait and facing are tracked
//! separately because the character can run while airborne.
//!
//! ```text
//!   Grounded --Jump--> Airborne --Landed--> Grounded
//!   Grounded | Airborne --LostFloor--> Falling --ReachedTerminalDepth--> Dead
//! ```

use glam::Vec2;

use crate::animation::{AnimationClip, AnimationFile, AnimationState};
use crate::config::PhysicsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Normal,
    /// Flatter, longer arc: the apex velocity is offset before integration.
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Grounded,
    Airborne { kind: JumpKind, backward: bool },
    Falling,
    /// Terminal depth reached. There is no way out of this phase.
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gait {
    Idle,
    Running,
    RunningBackward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    Jump { high: bool, backward: bool },
    Landed,
    LostFloor,
    ReachedTerminalDepth,
}

/// Combined, externally visible character state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterState {
    Standing,
    Running,
    RunningBackward,
    Jumping(JumpKind),
    JumpingBackward(JumpKind),
    Falling,
    Dead,
}

impl CharacterState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Standing => "standing",
            Self::Running => "running",
            Self::RunningBackward => "running backward",
            Self::Jumping(JumpKind::Normal) => "jumping",
            Self::Jumping(JumpKind::High) => "jumping (high)",
            Self::JumpingBackward(JumpKind::Normal) => "jumping backward",
            Self::JumpingBackward(JumpKind::High) => "jumping backward (high)",
            Self::Falling => "falling",
            Self::Dead => "dead",
        }
    }
}

/// Phase transition table. `None` means the event does not apply in `phase`.
pub fn transition(phase: Phase, event: MotionEvent) -> Option<Phase> {
    match (phase, event) {
        (Phase::Grounded, MotionEvent::Jump { high, backward }) => Some(Phase::Airborne {
            kind: if high { JumpKind::High } else { JumpKind::Normal },
            backward,
        }),
        (Phase::Airborne { .. }, MotionEvent::Landed) => Some(Phase::Grounded),
        (Phase::Grounded | Phase::Airborne { .. }, MotionEvent::LostFloor) => Some(Phase::Falling),
        (Phase::Falling, MotionEvent::ReachedTerminalDepth) => Some(Phase::Dead),
        _ => None,
    }
}

/// Which sprite the character is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Stand(Facing),
    Run(Facing, usize),
    Jump(Facing),
}

/// Texture keys for every pose.
#[derive(Debug, Clone)]
pub struct CharacterSprites {
    pub run_forward: AnimationClip,
    pub run_backward: AnimationClip,
    pub jump_forward: String,
    pub jump_backward: String,
}

impl Default for CharacterSprites {
    fn default() -> Self {
        const FRAME_US: u64 = 10_000;
        Self {
            run_forward: AnimationClip::uniform(
                (0..5).map(|i| format!("assets/img/mario-char/mario-{i}_resized.png")),
                FRAME_US,
                true,
            ),
            run_backward: AnimationClip::uniform(
                (0..5).map(|i| format!("assets/img/mario-char/mario-{i}-rev_resized.png")),
                FRAME_US,
                true,
            ),
            jump_forward: "assets/img/mario/mario-jump.png".to_string(),
            jump_backward: "assets/img/mario/mario-jump-rev.png".to_string(),
        }
    }
}

impl CharacterSprites {
    /// Build from an animation file holding `run`, `run_back`, `jump` and
    /// `jump_back` clips. Both run clips must have the same frame count since
    /// they share one frame counter.
    pub fn from_animation_file(file: &AnimationFile) -> Result<Self, String> {
        let clip = |name: &str| {
            file.animations.get(name).ok_or_else(|| {
                format!(
                    "animation '{}' is missing clip '{}'",
                    file.animation_id, name
                )
            })
        };
        let run_forward = clip("run")?.clone();
        let run_backward = clip("run_back")?.clone();
        if run_forward.frames.len() != run_backward.frames.len() {
            return Err(format!(
                "animation '{}': 'run' has {} frames but 'run_back' has {}",
                file.animation_id,
                run_forward.frames.len(),
                run_backward.frames.len()
            ));
        }
        Ok(Self {
            run_forward,
            run_backward,
            jump_forward: clip("jump")?.texture_at(0).to_string(),
            jump_backward: clip("jump_back")?.texture_at(0).to_string(),
        })
    }

    fn run_clip(&self, facing: Facing) -> &AnimationClip {
        match facing {
            Facing::Forward => &self.run_forward,
            Facing::Backward => &self.run_backward,
        }
    }

    pub fn texture_for(&self, pose: Pose) -> &str {
        match pose {
            Pose::Stand(facing) => self.run_clip(facing).texture_at(0),
            Pose::Run(facing, frame) => self.run_clip(facing).texture_at(frame),
            Pose::Jump(Facing::Forward) => &self.jump_forward,
            Pose::Jump(Facing::Backward) => &self.jump_backward,
        }
    }

    /// Every texture key the character can show.
    pub fn textures(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .run_forward
            .frames
            .iter()
            .chain(&self.run_backward.frames)
            .map(|f| f.texture.clone())
            .collect();
        out.push(self.jump_forward.clone());
        out.push(self.jump_backward.clone());
        out
    }
}

pub struct Character {
    id: u32,
    position: Vec2,
    size: Vec2,
    /// Jump velocity: x only while jumping backward, y while airborne.
    velocity: Vec2,
    fall_speed: f32,
    phase: Phase,
    gait: Gait,
    facing: Facing,
    pose: Pose,
    run_cadence: AnimationState,
    sprites: CharacterSprites,
    config: PhysicsConfig,
}

impl Character {
    pub fn new(id: u32, config: PhysicsConfig, sprites: CharacterSprites) -> Self {
        log::info!("Mario obj id : {} created", id);
        Self {
            id,
            position: Vec2::new(config.spawn_x, config.ground_y),
            size: Vec2::new(config.width, config.height),
            velocity: Vec2::ZERO,
            fall_speed: 0.0,
            phase: Phase::Grounded,
            gait: Gait::Idle,
            facing: Facing::Forward,
            pose: Pose::Stand(Facing::Forward),
            run_cadence: AnimationState::new(),
            sprites,
            config,
        }
    }

    fn apply(&mut self, event: MotionEvent) -> bool {
        match transition(self.phase, event) {
            Some(next) => {
                log::trace!("Mario {}: {:?} --{:?}--> {:?}", self.id, self.phase, event, next);
                self.phase = next;
                true
            }
            None => false,
        }
    }

    /// Launch a jump. Ignored unless grounded; returns whether it took effect.
    pub fn start_jump(&mut self, high: bool, backward: bool) -> bool {
        if !self.apply(MotionEvent::Jump { high, backward }) {
            return false;
        }
        self.velocity.y = self.config.jump_force;
        self.velocity.x = if backward {
            self.config.backward_jump_speed
        } else {
            0.0
        };
        true
    }

    /// Integrate an active jump over `dt` seconds. No-op unless airborne.
    pub fn update_jump(&mut self, dt: f32) {
        let Phase::Airborne { kind, backward } = self.phase else {
            return;
        };

        self.velocity.y += self.config.gravity * dt;
        let dy = match kind {
            JumpKind::High => (self.velocity.y - self.config.high_jump_offset) * dt,
            JumpKind::Normal => self.velocity.y * dt,
        };
        let dx = if backward { self.velocity.x * dt } else { 0.0 };
        self.position += Vec2::new(dx, dy);

        if self.position.y >= self.config.ground_y {
            self.position.y = self.config.ground_y;
            self.velocity = Vec2::ZERO;
            self.apply(MotionEvent::Landed);
        }
    }

    /// Begin the death drop. Returns false if already falling or dead.
    pub fn begin_fall(&mut self) -> bool {
        if !self.apply(MotionEvent::LostFloor) {
            return false;
        }
        self.velocity = Vec2::ZERO;
        self.fall_speed = self.config.initial_fall_speed;
        true
    }

    /// Integrate the fall over `dt` seconds until terminal depth.
    pub fn update_fall(&mut self, dt: f32) {
        if self.phase != Phase::Falling {
            return;
        }
        self.fall_speed = (self.fall_speed
            + self.config.gravity * dt * self.config.fall_gravity_multiplier)
            .min(self.config.max_fall_speed);
        self.position.y += self.fall_speed * dt;

        if self.position.y >= self.config.terminal_y {
            self.position.y = self.config.terminal_y;
            self.apply(MotionEvent::ReachedTerminalDepth);
        }
    }

    /// Run forward for one step. On each animation frame the character
    /// drifts toward the centre column until it gets there.
    pub fn run_forward(&mut self, dt_us: u64) {
        self.gait = Gait::Running;
        self.facing = Facing::Forward;
        let crossed = self.run_cadence.advance(dt_us, &self.sprites.run_forward);
        if crossed == 0 {
            return;
        }
        if self.position.x < self.config.center_x {
            self.position.x += self.config.forward_nudge;
        }
        self.pose = self.moving_pose(Facing::Forward);
    }

    /// Run backward for one step. The world never scrolls this way, so the
    /// character itself moves left on each animation frame.
    pub fn run_backward(&mut self, dt_us: u64) {
        self.gait = Gait::RunningBackward;
        self.facing = Facing::Backward;
        let crossed = self.run_cadence.advance(dt_us, &self.sprites.run_backward);
        if crossed == 0 {
            return;
        }
        self.position.x -= self.config.backward_step;
        self.pose = self.moving_pose(Facing::Backward);
    }

    /// Idle: show the standing (or mid-air) frame for the current facing.
    pub fn stand(&mut self) {
        self.gait = Gait::Idle;
        self.pose = if self.is_airborne() {
            Pose::Jump(self.facing)
        } else {
            Pose::Stand(self.facing)
        };
    }

    fn moving_pose(&self, facing: Facing) -> Pose {
        if self.is_airborne() {
            Pose::Jump(facing)
        } else {
            Pose::Run(facing, self.run_cadence.frame_index)
        }
    }

    pub fn state(&self) -> CharacterState {
        match self.phase {
            Phase::Dead => CharacterState::Dead,
            Phase::Falling => CharacterState::Falling,
            Phase::Airborne {
                kind,
                backward: true,
            } => CharacterState::JumpingBackward(kind),
            Phase::Airborne { kind, .. } => CharacterState::Jumping(kind),
            Phase::Grounded => match self.gait {
                Gait::Idle => CharacterState::Standing,
                Gait::Running => CharacterState::Running,
                Gait::RunningBackward => CharacterState::RunningBackward,
            },
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Top-left corner in screen space.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn gait(&self) -> Gait {
        self.gait
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn frame_index(&self) -> usize {
        self.run_cadence.frame_index
    }

    pub fn jump_kind(&self) -> Option<JumpKind> {
        match self.phase {
            Phase::Airborne { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self.phase, Phase::Airborne { .. })
    }

    /// Set once the death sequence begins and never cleared.
    pub fn is_falling(&self) -> bool {
        matches!(self.phase, Phase::Falling | Phase::Dead)
    }

    pub fn texture(&self) -> &str {
        self.sprites.texture_for(self.pose)
    }

    pub fn sprites(&self) -> &CharacterSprites {
        &self.sprites
    }
}

impl Drop for Character {
    fn drop(&mut self) {
        log::info!("Mario obj id : {} removed", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::parse_animation_file;

    const DT: f32 = 0.01;
    const DT_US: u64 = 10_000;

    fn mario() -> Character {
        Character::new(100, PhysicsConfig::default(), CharacterSprites::default())
    }

    fn jump_trace(high: bool, backward: bool) -> (Character, Vec<f32>) {
        let mut character = mario();
        assert!(character.start_jump(high, backward));
        let mut ys = vec![character.position().y];
        for _ in 0..1000 {
            character.update_jump(DT);
            ys.push(character.position().y);
            if !character.is_airborne() {
                break;
            }
        }
        (character, ys)
    }

    fn assert_ascends_then_descends(ys: &[f32]) {
        let apex = ys
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).expect("finite"))
            .map(|(i, _)| i)
            .expect("non-empty trace");
        assert!(apex > 0, "must rise first");
        for pair in ys[..=apex].windows(2) {
            assert!(pair[1] < pair[0], "ascent must strictly decrease y");
        }
        for pair in ys[apex..].windows(2) {
            assert!(pair[1] >= pair[0], "descent must not rise");
        }
    }

    #[test]
    fn transition_table_covers_documented_edges() {
        let airborne = Phase::Airborne {
            kind: JumpKind::High,
            backward: false,
        };
        assert_eq!(
            transition(
                Phase::Grounded,
                MotionEvent::Jump {
                    high: true,
                    backward: false
                }
            ),
            Some(airborne)
        );
        assert_eq!(transition(airborne, MotionEvent::Landed), Some(Phase::Grounded));
        assert_eq!(transition(airborne, MotionEvent::LostFloor), Some(Phase::Falling));
        assert_eq!(
            transition(Phase::Falling, MotionEvent::ReachedTerminalDepth),
            Some(Phase::Dead)
        );
        assert_eq!(
            transition(
                airborne,
                MotionEvent::Jump {
                    high: false,
                    backward: false
                }
            ),
            None
        );
        assert_eq!(transition(Phase::Falling, MotionEvent::Landed), None);
        assert_eq!(transition(Phase::Dead, MotionEvent::LostFloor), None);
    }

    #[test]
    fn normal_jump_rises_then_lands_exactly_on_ground() {
        let (character, ys) = jump_trace(false, false);
        assert_ascends_then_descends(&ys);
        assert_eq!(character.position().y, 475.0);
        assert_eq!(character.velocity(), Vec2::ZERO);
        assert_eq!(character.phase(), Phase::Grounded);
        assert_eq!(character.position().x, 390.0);
    }

    #[test]
    fn high_jump_goes_higher_and_lands_exactly_on_ground() {
        let (_, normal_ys) = jump_trace(false, false);
        let (high, high_ys) = jump_trace(true, false);
        assert_ascends_then_descends(&high_ys);
        let apex = |ys: &[f32]| ys.iter().cloned().fold(f32::INFINITY, f32::min);
        assert!(apex(&high_ys) < apex(&normal_ys));
        assert!(high_ys.len() > normal_ys.len());
        assert_eq!(high.position().y, 475.0);
        assert_eq!(high.velocity(), Vec2::ZERO);
    }

    #[test]
    fn backward_jump_drifts_left() {
        let (character, ys) = jump_trace(false, true);
        assert_ascends_then_descends(&ys);
        assert!(character.position().x < 390.0);
        assert_eq!(character.velocity(), Vec2::ZERO);
    }

    #[test]
    fn start_jump_is_ignored_while_airborne() {
        let mut character = mario();
        assert!(character.start_jump(false, false));
        character.update_jump(DT);
        let vy = character.velocity().y;
        assert!(!character.start_jump(true, true));
        assert_eq!(character.velocity().y, vy);
        assert_eq!(character.jump_kind(), Some(JumpKind::Normal));
    }

    #[test]
    fn state_reports_jump_variants() {
        let mut character = mario();
        character.start_jump(true, true);
        assert_eq!(
            character.state(),
            CharacterState::JumpingBackward(JumpKind::High)
        );
    }

    #[test]
    fn fall_speed_is_monotonic_capped_and_depth_clamped() {
        let mut character = mario();
        assert!(character.begin_fall());
        let mut last = character.fall_speed();
        for _ in 0..500 {
            character.update_fall(DT);
            if character.phase() == Phase::Falling {
                assert!(character.fall_speed() >= last);
                assert!(character.fall_speed() <= 1500.0);
                last = character.fall_speed();
            }
            assert!(character.position().y <= 1000.0);
        }
        assert_eq!(character.phase(), Phase::Dead);
        assert_eq!(character.position().y, 1000.0);
        assert!(character.is_falling());
    }

    #[test]
    fn fall_cannot_restart_or_jump_once_started() {
        let mut character = mario();
        assert!(character.begin_fall());
        assert!(!character.begin_fall());
        assert!(!character.start_jump(false, false));
        character.update_jump(DT);
        assert_eq!(character.state(), CharacterState::Falling);
    }

    #[test]
    fn falling_mid_jump_abandons_the_jump() {
        let mut character = mario();
        character.start_jump(false, false);
        character.update_jump(DT);
        assert!(character.begin_fall());
        assert_eq!(character.velocity(), Vec2::ZERO);
        let y = character.position().y;
        character.update_jump(DT);
        assert_eq!(character.position().y, y);
    }

    #[test]
    fn run_forward_cycles_frames_and_nudges_toward_center() {
        let mut character = mario();
        // Step back a few frames so the centre drift is visible.
        for _ in 0..3 {
            character.run_backward(DT_US);
        }
        assert_eq!(character.position().x, 330.0);

        character.run_forward(DT_US);
        assert_eq!(character.position().x, 350.0);
        character.run_forward(DT_US);
        character.run_forward(DT_US);
        assert_eq!(character.position().x, 390.0);
        // At the centre the drift stops.
        character.run_forward(DT_US);
        assert_eq!(character.position().x, 390.0);
        assert_eq!(character.state(), CharacterState::Running);
        assert!(character.frame_index() < 5);
    }

    #[test]
    fn run_cadence_waits_for_elapsed_time() {
        let mut character = mario();
        character.run_backward(DT_US / 2);
        assert_eq!(character.position().x, 390.0);
        assert_eq!(character.frame_index(), 0);
        character.run_backward(DT_US / 2);
        assert_eq!(character.position().x, 370.0);
        assert_eq!(character.frame_index(), 1);
    }

    #[test]
    fn texture_follows_pose() {
        let mut character = mario();
        assert_eq!(
            character.texture(),
            "assets/img/mario-char/mario-0_resized.png"
        );
        character.run_forward(DT_US);
        assert_eq!(
            character.texture(),
            "assets/img/mario-char/mario-1_resized.png"
        );
        character.start_jump(false, false);
        character.run_forward(DT_US);
        assert_eq!(character.texture(), "assets/img/mario/mario-jump.png");
        character.run_backward(DT_US);
        assert_eq!(character.texture(), "assets/img/mario/mario-jump-rev.png");
        // Land and stand: backward facing is remembered.
        for _ in 0..500 {
            character.update_jump(DT);
        }
        character.stand();
        assert_eq!(
            character.texture(),
            "assets/img/mario-char/mario-0-rev_resized.png"
        );
    }

    #[test]
    fn sprites_from_animation_file() {
        let file = parse_animation_file(
            r#"{
              "version": "0.1",
              "animation_id": "mario",
              "animations": {
                "run": { "frames": [{ "texture": "r0", "duration_ms": 10 }, { "texture": "r1", "duration_ms": 10 }], "looping": true },
                "run_back": { "frames": [{ "texture": "b0", "duration_ms": 10 }, { "texture": "b1", "duration_ms": 10 }], "looping": true },
                "jump": { "frames": [{ "texture": "j", "duration_ms": 10 }] },
                "jump_back": { "frames": [{ "texture": "jb", "duration_ms": 10 }] }
              }
            }"#,
        )
        .expect("valid animation");
        let sprites = CharacterSprites::from_animation_file(&file).expect("complete clip set");
        assert_eq!(sprites.texture_for(Pose::Run(Facing::Backward, 1)), "b1");
        assert_eq!(sprites.texture_for(Pose::Jump(Facing::Backward)), "jb");
        assert_eq!(sprites.textures().len(), 6);
    }

    #[test]
    fn sprites_reject_mismatched_run_clips() {
        let file = parse_animation_file(
            r#"{
              "version": "0.1",
              "animation_id": "mario",
              "animations": {
                "run": { "frames": [{ "texture": "r0", "duration_ms": 10 }, { "texture": "r1", "duration_ms": 10 }] },
                "run_back": { "frames": [{ "texture": "b0", "duration_ms": 10 }] },
                "jump": { "frames": [{ "texture": "j", "duration_ms": 10 }] },
                "jump_back": { "frames": [{ "texture": "jb", "duration_ms": 10 }] }
              }
            }"#,
        )
        .expect("valid animation");
        let err = CharacterSprites::from_animation_file(&file).expect_err("mismatch");
        assert!(err.contains("run_back"));
    }
}
