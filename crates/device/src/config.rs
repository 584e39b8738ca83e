use glhal_common::{Size, WindowMode};
use serde::{Deserialize, Serialize};

/// Construction parameters for a [`crate::GraphicsDevice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Requested window size. Zero means "use the desktop resolution".
    pub size: Size,
    pub window_mode: WindowMode,
    /// Confine the mouse to the window.
    pub lock_mouse: bool,
    pub title: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            size: Size::ZERO,
            window_mode: WindowMode::Windowed,
            lock_mouse: false,
            title: "glhal".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_desktop_sized_window() {
        let config = DeviceConfig::default();
        assert!(config.size.is_zero());
        assert_eq!(config.window_mode, WindowMode::Windowed);
        assert!(!config.lock_mouse);
        assert_eq!(config.title, "glhal");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: DeviceConfig = serde_json::from_str(
            r#"{ "size": { "width": 1280, "height": 720 }, "window_mode": "pseudo-fullscreen" }"#,
        )
        .unwrap();
        assert_eq!(config.size, Size::new(1280, 720));
        assert_eq!(config.window_mode, WindowMode::PseudoFullscreen);
        assert_eq!(config.title, "glhal");
    }
}
