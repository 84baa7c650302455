//! Window events and keyboard state.
//!
//! [`ScriptedInput`] stands in for a window's event queue: it replays a
//! fixed list of frames and reports [`InputEvent::Closed`] once the list
//! runs out.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Closed,
    Resized { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

/// Keys held down during the current frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    #[must_use]
    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}

/// Everything the window reports for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub events: Vec<InputEvent>,
    pub held: Vec<Key>,
}

impl InputFrame {
    /// A frame with `keys` held and no events.
    #[must_use]
    pub fn holding(keys: &[Key]) -> Self {
        Self {
            events: Vec::new(),
            held: keys.to_vec(),
        }
    }

    #[must_use]
    pub fn with_event(mut self, event: InputEvent) -> Self {
        self.events.push(event);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputFrame>,
}

impl ScriptedInput {
    #[must_use]
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Steers in a square: `frames_per_side` frames each of right, down,
    /// left and up.
    #[must_use]
    pub fn square(frames_per_side: usize) -> Self {
        Self::new(
            [Key::Right, Key::Down, Key::Left, Key::Up]
                .into_iter()
                .flat_map(|key| std::iter::repeat_n(InputFrame::holding(&[key]), frames_per_side)),
        )
    }

    /// Appends `count` copies of `frame` to the script.
    pub fn push(&mut self, frame: InputFrame, count: usize) {
        self.frames.extend(std::iter::repeat_n(frame, count));
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Advances one frame: replaces the held keys in `state` and returns
    /// the frame's events. An exhausted script releases every key and
    /// reports [`InputEvent::Closed`].
    pub fn poll(&mut self, state: &mut InputState) -> Vec<InputEvent> {
        state.release_all();
        match self.frames.pop_front() {
            Some(frame) => {
                for key in frame.held {
                    state.press(key);
                }
                frame.events
            }
            None => {
                debug!("input script exhausted");
                vec![InputEvent::Closed]
            }
        }
    }
}
