use glam::{IVec2, Vec2};
use glhal_common::Size;

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Physical key identity, independent of keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Letter or digit key, lowercase.
    Char(char),
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Shift,
    Ctrl,
    Alt,
    Meta,
    F(u8),
    Unknown,
}

/// Event as produced by the native pump, before any engine-side
/// interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Quit,
    FocusGained,
    FocusLost,
    Resized(Size),
    Key {
        key: Key,
        pressed: bool,
        repeat: bool,
    },
    Text(String),
    ModifiersChanged(Modifiers),
    CursorMoved(IVec2),
    MouseButton {
        button: MouseButton,
        pressed: bool,
    },
    /// Scroll distance in lines.
    MouseWheel(Vec2),
}
