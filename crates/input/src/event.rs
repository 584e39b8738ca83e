use glam::{IVec2, Vec2};
use glhal_common::Size;
use glhal_native::{Key, Modifiers, MouseButton};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub event: KeyEventKind,
    pub key: Key,
    pub modifiers: Modifiers,
    /// Auto-repeat of a held key.
    pub repeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down,
    Up,
    Move,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseInput {
    pub event: MouseEventKind,
    /// Set for `Down` and `Up` only.
    pub button: Option<MouseButton>,
    /// Cursor position in window pixels, origin top-left.
    pub location: IVec2,
    /// Motion in pixels for `Move`, scroll lines for `Scroll`.
    pub delta: Vec2,
    pub modifiers: Modifiers,
}

/// Event delivered to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyInput),
    Text(String),
    Mouse(MouseInput),
    /// Window focus gained (`true`) or lost.
    Focus(bool),
    Resized(Size),
    Quit,
}
