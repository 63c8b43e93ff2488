use crate::action::Action;
use crate::key::{Key, MouseButton};
use glam::Vec2;
use propyard_common::MovementFlags;
use std::collections::BTreeSet;

/// Everything the frame loop needs from input for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputIntent {
    /// Accumulated mouse movement in pixels since the last frame.
    pub look_delta: Vec2,
    pub movement: MovementFlags,
    /// Discrete actions in the order they happened.
    pub actions: Vec<Action>,
    pub pointer_locked: bool,
    /// A click arrived while unlocked; the host should try to grab the pointer.
    pub lock_requested: bool,
}

/// Turns raw key and pointer events into [`InputIntent`].
///
/// Held keys become movement flags. Discrete actions fire once per
/// up-to-down transition, so OS key repeat never re-triggers them. Mouse
/// movement and clicks are ignored unless the pointer is locked.
#[derive(Debug, Clone, Default)]
pub struct InputAggregator {
    held: BTreeSet<Key>,
    pointer_locked: bool,
    look_delta: Vec2,
    actions: Vec<Action>,
    lock_requested: bool,
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if !self.held.insert(key) {
            return;
        }
        let action = match key {
            Key::Space => Some(Action::Jump),
            Key::Q => Some(Action::CycleAsset(-1)),
            Key::E => Some(Action::CycleAsset(1)),
            Key::R => Some(Action::Restart),
            Key::Escape => {
                self.set_pointer_locked(false);
                Some(Action::ReleasePointer)
            }
            _ => None,
        };
        if let Some(action) = action {
            tracing::trace!(%key, ?action, "key action");
            self.actions.push(action);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn mouse_move(&mut self, dx: f32, dy: f32) {
        if self.pointer_locked {
            self.look_delta += Vec2::new(dx, dy);
        }
    }

    pub fn mouse_down(&mut self, button: MouseButton) {
        if !self.pointer_locked {
            self.lock_requested = true;
            return;
        }
        match button {
            MouseButton::Left => self.actions.push(Action::Place),
            MouseButton::Right => self.actions.push(Action::RotateGhost),
            MouseButton::Middle => {}
        }
    }

    /// Palette clicks come from the UI surface, not the pointer-locked view.
    pub fn select_asset(&mut self, index: usize) {
        self.actions.push(Action::SelectAsset(index));
    }

    /// Report a pointer-lock change from the host. Losing the lock drops all held keys.
    pub fn set_pointer_locked(&mut self, locked: bool) {
        if self.pointer_locked && !locked {
            self.held.clear();
        }
        self.pointer_locked = locked;
        if locked {
            self.lock_requested = false;
        }
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    pub fn movement_flags(&self) -> MovementFlags {
        let any = |a: Key, b: Key| self.held.contains(&a) || self.held.contains(&b);
        MovementFlags {
            forward: any(Key::W, Key::ArrowUp),
            back: any(Key::S, Key::ArrowDown),
            left: any(Key::A, Key::ArrowLeft),
            right: any(Key::D, Key::ArrowRight),
        }
    }

    /// Collect this frame's intent and reset the per-frame accumulators.
    pub fn take_intent(&mut self) -> InputIntent {
        InputIntent {
            look_delta: std::mem::take(&mut self.look_delta),
            movement: self.movement_flags(),
            actions: std::mem::take(&mut self.actions),
            pointer_locked: self.pointer_locked,
            lock_requested: std::mem::take(&mut self.lock_requested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked() -> InputAggregator {
        let mut input = InputAggregator::new();
        input.set_pointer_locked(true);
        input
    }

    #[test]
    fn wasd_and_arrows_both_move() {
        let mut input = locked();
        input.key_down(Key::W);
        input.key_down(Key::ArrowRight);
        let flags = input.take_intent().movement;
        assert!(flags.forward && flags.right);
        assert!(!flags.back && !flags.left);

        input.key_up(Key::W);
        assert!(!input.take_intent().movement.forward);
    }

    #[test]
    fn held_keys_persist_across_frames_but_actions_do_not() {
        let mut input = locked();
        input.key_down(Key::D);
        input.key_down(Key::Space);
        assert_eq!(input.take_intent().actions, [Action::Jump]);
        let next = input.take_intent();
        assert!(next.movement.right);
        assert!(next.actions.is_empty());
    }

    #[test]
    fn key_repeat_does_not_retrigger() {
        let mut input = locked();
        input.key_down(Key::E);
        input.key_down(Key::E);
        input.key_down(Key::E);
        input.key_up(Key::E);
        input.key_down(Key::Q);
        assert_eq!(
            input.take_intent().actions,
            [Action::CycleAsset(1), Action::CycleAsset(-1)]
        );
    }

    #[test]
    fn mouse_ignored_until_locked() {
        let mut input = InputAggregator::new();
        input.mouse_move(10.0, 5.0);
        input.mouse_down(MouseButton::Left);
        let intent = input.take_intent();
        assert_eq!(intent.look_delta, Vec2::ZERO);
        assert!(intent.actions.is_empty());
        assert!(intent.lock_requested);

        input.set_pointer_locked(true);
        input.mouse_move(10.0, 5.0);
        input.mouse_move(2.0, -1.0);
        input.mouse_down(MouseButton::Left);
        input.mouse_down(MouseButton::Right);
        let intent = input.take_intent();
        assert_eq!(intent.look_delta, Vec2::new(12.0, 4.0));
        assert_eq!(intent.actions, [Action::Place, Action::RotateGhost]);
        assert!(!intent.lock_requested);
    }

    #[test]
    fn escape_releases_pointer() {
        let mut input = locked();
        input.key_down(Key::Escape);
        let intent = input.take_intent();
        assert!(!intent.pointer_locked);
        assert_eq!(intent.actions, [Action::ReleasePointer]);
    }

    #[test]
    fn escape_stops_held_movement() {
        let mut input = locked();
        input.key_down(Key::W);
        input.key_down(Key::Escape);
        let intent = input.take_intent();
        assert!(!intent.movement.forward);
        assert!(!input.is_held(Key::W));

        input.set_pointer_locked(false);
        assert!(!input.take_intent().movement.forward);
    }

    #[test]
    fn losing_lock_drops_held_keys() {
        let mut input = locked();
        input.key_down(Key::W);
        input.set_pointer_locked(false);
        assert!(!input.take_intent().movement.any());
    }
}
