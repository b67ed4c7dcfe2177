use std::collections::HashSet;

use super::types::{InputEvent, Key, MouseButton, MouseButtonState, PointerButtonEvent};

/// Per-frame input deltas.
///
/// `InputState` holds the current state (held keys/buttons, pointer position).
/// `InputFrame` holds events and transition sets for the current frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    /// Keys pressed this frame (repeats excluded).
    pub keys_pressed: HashSet<Key>,

    /// Keys released this frame.
    pub keys_released: HashSet<Key>,

    /// Mouse buttons pressed this frame.
    pub buttons_pressed: HashSet<MouseButton>,

    /// Mouse buttons released this frame.
    pub buttons_released: HashSet<MouseButton>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Button presses this frame, in arrival order, with their positions.
    pub fn presses(&self) -> impl Iterator<Item = &PointerButtonEvent> {
        self.events.iter().filter_map(|ev| match ev {
            InputEvent::PointerButton(e) if e.state == MouseButtonState::Pressed => Some(e),
            _ => None,
        })
    }
}
