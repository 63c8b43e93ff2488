use propyard_input::{InputAggregator, InputIntent, Key, MouseButton};
use serde::Deserialize;

/// A scripted input session, read from YAML:
///
/// ```yaml
/// steps:
///   - lock: true
///   - wait: 120
///   - press: [KeyW]
///   - wait: 30
///   - release: [KeyW]
///   - look: [0, 250]
///   - click: left
///   - wait: 1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Run this many frames with the input gathered so far.
    Wait(u32),
    Press(Vec<Key>),
    Release(Vec<Key>),
    Lock(bool),
    /// Mouse movement in pixels.
    Look([f32; 2]),
    Click(MouseButton),
    /// Palette click.
    Select(usize),
}

impl Script {
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    /// Feed the steps through an aggregator, calling `frame` once per
    /// simulated frame. Events after the last `wait` get one trailing frame.
    pub fn play(&self, mut frame: impl FnMut(InputIntent)) -> u64 {
        let mut input = InputAggregator::new();
        let mut frames = 0;
        let mut dirty = false;
        for step in &self.steps {
            match step {
                Step::Wait(n) => {
                    for _ in 0..*n {
                        frame(input.take_intent());
                        frames += 1;
                    }
                    dirty = false;
                    continue;
                }
                Step::Press(keys) => keys.iter().for_each(|k| input.key_down(*k)),
                Step::Release(keys) => keys.iter().for_each(|k| input.key_up(*k)),
                Step::Lock(locked) => input.set_pointer_locked(*locked),
                Step::Look([dx, dy]) => input.mouse_move(*dx, *dy),
                Step::Click(button) => input.mouse_down(*button),
                Step::Select(index) => input.select_asset(*index),
            }
            dirty = true;
        }
        if dirty {
            frame(input.take_intent());
            frames += 1;
        }
        frames
    }
}
