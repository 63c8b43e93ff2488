use serde::{Deserialize, Serialize};

/// A discrete game action produced by input.
///
/// The session and placement layer consume actions, never raw key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Action {
    Jump,
    /// Commit the ghost preview.
    Place,
    /// Turn the ghost by one rotation step.
    RotateGhost,
    /// Move the palette selection by a signed offset, wrapping.
    CycleAsset(i32),
    /// Select a palette entry directly.
    SelectAsset(usize),
    ReleasePointer,
    /// Reset the player. Only honored while movement is disabled.
    Restart,
}

impl Action {
    /// Invoke the matching capability on `target`.
    pub fn dispatch(self, target: &mut dyn GameActions) {
        match self {
            Action::Jump => target.jump(),
            Action::Place => target.place(),
            Action::RotateGhost => target.rotate_ghost(),
            Action::CycleAsset(delta) => target.cycle_asset(delta),
            Action::SelectAsset(index) => target.select_asset(index),
            Action::ReleasePointer => target.release_pointer(),
            Action::Restart => target.restart(),
        }
    }
}

/// The game's action surface, injected wherever input is turned into behavior.
pub trait GameActions {
    fn jump(&mut self);
    fn place(&mut self);
    fn rotate_ghost(&mut self);
    fn cycle_asset(&mut self, delta: i32);
    fn select_asset(&mut self, index: usize);
    fn release_pointer(&mut self);
    fn restart(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl GameActions for Recorder {
        fn jump(&mut self) {
            self.0.push("jump".into());
        }
        fn place(&mut self) {
            self.0.push("place".into());
        }
        fn rotate_ghost(&mut self) {
            self.0.push("rotate".into());
        }
        fn cycle_asset(&mut self, delta: i32) {
            self.0.push(format!("cycle {delta}"));
        }
        fn select_asset(&mut self, index: usize) {
            self.0.push(format!("select {index}"));
        }
        fn release_pointer(&mut self) {
            self.0.push("release".into());
        }
        fn restart(&mut self) {
            self.0.push("restart".into());
        }
    }

    #[test]
    fn dispatch_reaches_named_capability() {
        let mut rec = Recorder::default();
        for action in [
            Action::Jump,
            Action::CycleAsset(-1),
            Action::SelectAsset(3),
            Action::Restart,
        ] {
            action.dispatch(&mut rec);
        }
        assert_eq!(rec.0, ["jump", "cycle -1", "select 3", "restart"]);
    }

    #[test]
    fn actions_serialize_tagged() {
        let json = serde_json::to_string(&Action::CycleAsset(1)).unwrap();
        assert_eq!(json, r#"{"action":"cycle_asset","value":1}"#);
        let back: Action = serde_json::from_str(r#"{"action":"place"}"#).unwrap();
        assert_eq!(back, Action::Place);
    }
}
