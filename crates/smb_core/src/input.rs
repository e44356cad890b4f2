//! Keyboard state for the fixed-step loop.
//!
//! Gameplay keys are polled: each step takes a [`FrameInput`] snapshot of
//! what is held at that moment. Debug toggles (F3/F4) are edge-triggered and
//! survive until `end_frame()`, which the main loop only calls after a step
//! has run, so a tap on a zero-step frame still lands.

/// The keys the game reacts to. Everything else is ignored at the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Key {
    Left,
    Right,
    Space,
    LShift,
    F3,
    F4,
}

impl Key {
    pub const ALL: [Key; 6] = [
        Key::Left,
        Key::Right,
        Key::Space,
        Key::LShift,
        Key::F3,
        Key::F4,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A set of keys packed into one byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySet(u8);

impl KeySet {
    pub fn contains(self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    /// Returns true when `key` was not already present.
    pub fn insert(&mut self, key: Key) -> bool {
        let added = !self.contains(key);
        self.0 |= key.bit();
        added
    }

    /// Returns true when `key` was present.
    pub fn remove(&mut self, key: Key) -> bool {
        let present = self.contains(key);
        self.0 &= !key.bit();
        present
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Key> {
        Key::ALL.into_iter().filter(move |key| self.contains(*key))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: KeySet,
    pressed: KeySet,
    released: KeySet,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// OS key repeat re-sends presses; only the first one is an edge.
    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(key) {
            self.released.insert(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.released.contains(key)
    }

    pub fn held(&self) -> KeySet {
        self.held
    }

    /// Snapshot of the gameplay keys for one simulation step.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            right: self.is_held(Key::Right),
            left: self.is_held(Key::Left),
            jump: self.is_held(Key::Space),
            run_modifier: self.is_held(Key::LShift),
        }
    }

    /// Release events never arrive for keys held while focus is lost.
    pub fn release_all(&mut self) {
        for key in self.held.iter() {
            self.key_up(key);
        }
    }

    pub fn end_frame(&mut self) {
        self.pressed = KeySet::default();
        self.released = KeySet::default();
    }
}

/// Gameplay intent sampled once per fixed step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub right: bool,
    pub left: bool,
    pub jump: bool,
    /// Left Shift: faster scrolling and high jumps.
    pub run_modifier: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_set_tracks_membership() {
        let mut set = KeySet::default();
        assert!(set.is_empty());
        assert!(set.insert(Key::F4));
        assert!(!set.insert(Key::F4));
        assert!(set.insert(Key::Left));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Key::Left, Key::F4]);
        assert!(set.remove(Key::F4));
        assert!(!set.remove(Key::F4));
        assert!(!set.contains(Key::F4));
    }

    #[test]
    fn repeated_press_is_one_edge() {
        let mut input = InputState::new();
        input.key_down(Key::F3);
        input.end_frame();
        input.key_down(Key::F3);
        assert!(input.is_held(Key::F3));
        assert!(!input.is_just_pressed(Key::F3));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut input = InputState::new();
        input.key_up(Key::Space);
        assert!(!input.is_just_released(Key::Space));
    }

    #[test]
    fn edges_survive_until_end_frame() {
        let mut input = InputState::new();
        input.key_down(Key::F4);
        input.key_up(Key::F4);
        assert!(input.is_just_pressed(Key::F4));
        assert!(input.is_just_released(Key::F4));
        input.end_frame();
        assert!(!input.is_just_pressed(Key::F4));
        assert!(!input.is_just_released(Key::F4));
    }

    #[test]
    fn frame_input_reads_held_keys() {
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::LShift);
        input.key_down(Key::Space);
        assert_eq!(
            input.frame_input(),
            FrameInput {
                right: true,
                left: false,
                jump: true,
                run_modifier: true,
            }
        );
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::Space);
        input.end_frame();
        input.release_all();
        assert!(input.held().is_empty());
        assert!(input.is_just_released(Key::Right));
        assert!(input.is_just_released(Key::Space));
        assert_eq!(input.frame_input(), FrameInput::default());
    }
}
