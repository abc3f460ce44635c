//! Backend-neutral input events and the polled input state
//!
//! Window implementations translate their native events into [`InputEvent`]s;
//! the [`InputManager`] folds them into key/button/cursor/scroll state that
//! controllers and user code can poll between frames.

use std::collections::HashSet;
use std::fmt;

use cgmath::{Vector2, Zero};

/// Keys the engine cares about. Anything else arrives as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    C,
    R,
    Space,
    Escape,
    Enter,
    Tab,
    Up,
    Down,
    Left,
    Right,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    Digit(u8),
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Press,
    Release,
    Repeat,
}

impl Action {
    /// Press and repeat both mean "held".
    pub fn is_down(self) -> bool {
        !matches!(self, Action::Release)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        action: Action,
        modifiers: Modifiers,
    },
    MouseButton {
        button: MouseButton,
        action: Action,
        x: f32,
        y: f32,
    },
    MouseMove {
        x: f32,
        y: f32,
    },
    Scroll {
        x: f32,
        y: f32,
    },
    Resize {
        width: u32,
        height: u32,
    },
}

#[derive(Debug)]
pub struct InputManager {
    keys: HashSet<Key>,
    buttons: HashSet<MouseButton>,
    cursor: Vector2<f32>,
    scroll_offset: Vector2<f32>,
    scroll_accum: Vector2<f32>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self {
            keys: HashSet::new(),
            buttons: HashSet::new(),
            cursor: Vector2::zero(),
            scroll_offset: Vector2::zero(),
            scroll_accum: Vector2::zero(),
        }
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key { key, action, .. } => self.on_key(key, action),
            InputEvent::MouseButton {
                button,
                action,
                x,
                y,
            } => self.on_mouse_button(button, action, x, y),
            InputEvent::MouseMove { x, y } => self.on_mouse_move(x, y),
            InputEvent::Scroll { x, y } => self.on_scroll(x, y),
            InputEvent::Resize { .. } => {}
        }
    }

    pub fn on_key(&mut self, key: Key, action: Action) {
        if action.is_down() {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, action: Action, x: f32, y: f32) {
        self.cursor = Vector2::new(x, y);
        if action.is_down() {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    pub fn on_mouse_move(&mut self, x: f32, y: f32) {
        self.cursor = Vector2::new(x, y);
    }

    pub fn on_scroll(&mut self, x: f32, y: f32) {
        self.scroll_offset = Vector2::new(x, y);
        self.scroll_accum += self.scroll_offset;
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            shift: self.is_key_down(Key::ShiftLeft) || self.is_key_down(Key::ShiftRight),
            control: self.is_key_down(Key::ControlLeft) || self.is_key_down(Key::ControlRight),
            alt: self.is_key_down(Key::AltLeft) || self.is_key_down(Key::AltRight),
        }
    }

    pub fn cursor_position(&self) -> Vector2<f32> {
        self.cursor
    }

    /// Offset reported by the most recent scroll event.
    pub fn scroll_offset(&self) -> Vector2<f32> {
        self.scroll_offset
    }

    pub fn scroll_accumulated(&self) -> Vector2<f32> {
        self.scroll_accum
    }
}

impl fmt::Display for InputManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InputManager(keys down: {}, buttons down: {}, cursor: ({:.1}, {:.1}), scroll: ({:.1}, {:.1}))",
            self.keys.len(),
            self.buttons.len(),
            self.cursor.x,
            self.cursor.y,
            self.scroll_accum.x,
            self.scroll_accum.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_is_at_origin() {
        let input = InputManager::new();
        assert_eq!(input.cursor_position(), Vector2::zero());
        assert_eq!(input.scroll_accumulated(), Vector2::zero());
        assert!(!input.is_key_down(Key::W));
    }

    #[test]
    fn test_key_state_follows_press_and_release() {
        let mut input = InputManager::new();
        input.on_key(Key::W, Action::Press);
        assert!(input.is_key_down(Key::W));
        input.on_key(Key::W, Action::Repeat);
        assert!(input.is_key_down(Key::W));
        input.on_key(Key::W, Action::Release);
        assert!(!input.is_key_down(Key::W));
    }

    #[test]
    fn test_scroll_accumulates() {
        let mut input = InputManager::new();
        input.handle_event(&InputEvent::Scroll { x: 0.0, y: 1.0 });
        input.handle_event(&InputEvent::Scroll { x: 0.0, y: 2.5 });
        assert_eq!(input.scroll_offset(), Vector2::new(0.0, 2.5));
        assert_eq!(input.scroll_accumulated(), Vector2::new(0.0, 3.5));
    }

    #[test]
    fn test_mouse_button_updates_cursor() {
        let mut input = InputManager::new();
        input.handle_event(&InputEvent::MouseButton {
            button: MouseButton::Left,
            action: Action::Press,
            x: 10.0,
            y: 20.0,
        });
        assert!(input.is_mouse_down(MouseButton::Left));
        assert_eq!(input.cursor_position(), Vector2::new(10.0, 20.0));
    }

    #[test]
    fn test_modifiers_from_held_keys() {
        let mut input = InputManager::new();
        input.on_key(Key::ShiftRight, Action::Press);
        let mods = input.modifiers();
        assert!(mods.shift);
        assert!(!mods.control);
    }
}
