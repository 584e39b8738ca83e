use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size::new(0, 0);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are zero. Used as the "pick for me" request.
    pub fn is_zero(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// True when either dimension is zero, so the size covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in window pixels, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Same origin, negative extents clamped to zero.
    pub fn clamped(&self) -> Self {
        Self {
            width: self.width.max(0),
            height: self.height.max(0),
            ..*self
        }
    }

    /// Bottom edge, saturating at the `i32` range.
    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }
}

/// How the device window occupies the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowMode {
    #[default]
    Windowed,
    /// Exclusive fullscreen surface.
    Fullscreen,
    /// Borderless window covering the desktop.
    PseudoFullscreen,
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowMode::Windowed => "windowed",
            WindowMode::Fullscreen => "fullscreen",
            WindowMode::PseudoFullscreen => "pseudo-fullscreen",
        };
        f.write_str(name)
    }
}

/// Named combination of blend factors and equation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    None,
    /// Premultiplied-alpha compositing.
    Alpha,
    Additive,
    Subtractive,
    Multiply,
    Multiplicative,
    DoubleMultiplicative,
}

impl BlendMode {
    pub const ALL: [BlendMode; 7] = [
        BlendMode::None,
        BlendMode::Alpha,
        BlendMode::Additive,
        BlendMode::Subtractive,
        BlendMode::Multiply,
        BlendMode::Multiplicative,
        BlendMode::DoubleMultiplicative,
    ];
}

/// Operating system the native layer runs on. Some window-management quirks
/// only apply to one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(target_os = "linux") {
            HostOs::Linux
        } else {
            HostOs::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_means_unspecified() {
        assert!(Size::ZERO.is_zero());
        assert!(!Size::new(800, 0).is_zero());
        assert!(Size::new(800, 0).is_empty());
        assert_eq!(Size::new(800, 600).pixel_count(), 480_000);
    }

    #[test]
    fn rect_clamps_negative_extents() {
        let r = Rect::new(10, 20, -5, -30).clamped();
        assert_eq!(r, Rect::new(10, 20, 0, 0));
        assert_eq!(Rect::new(10, 20, 5, 30).clamped().bottom(), 50);
    }

    #[test]
    fn rect_bottom_saturates() {
        assert_eq!(Rect::new(0, i32::MAX, 10, 10).bottom(), i32::MAX);
        assert_eq!(Rect::new(0, i32::MIN, 0, -10).bottom(), i32::MIN);
    }

    #[test]
    fn window_mode_uses_kebab_case() {
        let json = serde_json::to_string(&WindowMode::PseudoFullscreen).unwrap();
        assert_eq!(json, "\"pseudo-fullscreen\"");
        let mode: WindowMode = serde_json::from_str("\"fullscreen\"").unwrap();
        assert_eq!(mode, WindowMode::Fullscreen);
    }

    #[test]
    fn size_displays_as_resolution() {
        assert_eq!(Size::new(1920, 1080).to_string(), "1920x1080");
    }
}
