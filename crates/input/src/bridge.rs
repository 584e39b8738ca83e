use crate::event::{InputEvent, KeyEventKind, KeyInput, MouseEventKind, MouseInput};
use crate::handler::{InputHandler, dispatch};
use glam::{IVec2, Vec2};
use glhal_native::{Modifiers, NativeEvent};

/// Stateful translator from native events to [`InputEvent`]s.
///
/// Native pumps report modifiers and cursor position as separate events;
/// the bridge folds them into each key and mouse event.
#[derive(Debug, Default, Clone)]
pub struct InputBridge {
    modifiers: Modifiers,
    location: IVec2,
}

impl InputBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn location(&self) -> IVec2 {
        self.location
    }

    /// Fold `event` into the bridge state and return what the engine sees,
    /// if anything.
    pub fn translate(&mut self, event: NativeEvent) -> Option<InputEvent> {
        let translated = match event {
            NativeEvent::Quit => InputEvent::Quit,
            NativeEvent::FocusGained => InputEvent::Focus(true),
            NativeEvent::FocusLost => {
                // Releases while unfocused never arrive.
                self.modifiers = Modifiers::NONE;
                InputEvent::Focus(false)
            }
            NativeEvent::Resized(size) => InputEvent::Resized(size),
            NativeEvent::Key {
                key,
                pressed,
                repeat,
            } => InputEvent::Key(KeyInput {
                event: if pressed {
                    KeyEventKind::Down
                } else {
                    KeyEventKind::Up
                },
                key,
                modifiers: self.modifiers,
                repeat,
            }),
            NativeEvent::Text(text) => InputEvent::Text(text),
            NativeEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers;
                return None;
            }
            NativeEvent::CursorMoved(location) => {
                let delta = (location - self.location).as_vec2();
                self.location = location;
                InputEvent::Mouse(self.mouse(MouseEventKind::Move, None, delta))
            }
            NativeEvent::MouseButton { button, pressed } => {
                let kind = if pressed {
                    MouseEventKind::Down
                } else {
                    MouseEventKind::Up
                };
                InputEvent::Mouse(self.mouse(kind, Some(button), Vec2::ZERO))
            }
            NativeEvent::MouseWheel(lines) => {
                InputEvent::Mouse(self.mouse(MouseEventKind::Scroll, None, lines))
            }
        };
        Some(translated)
    }

    /// Translate and dispatch in one step.
    pub fn forward(&mut self, event: NativeEvent, handler: &mut dyn InputHandler) {
        if let Some(event) = self.translate(event) {
            tracing::trace!(?event, "input");
            dispatch(event, handler);
        }
    }

    fn mouse(
        &self,
        event: MouseEventKind,
        button: Option<glhal_native::MouseButton>,
        delta: Vec2,
    ) -> MouseInput {
        MouseInput {
            event,
            button,
            location: self.location,
            delta,
            modifiers: self.modifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glhal_common::Size;
    use glhal_native::{Key, MouseButton};

    const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    #[test]
    fn modifiers_fold_into_keys() {
        let mut bridge = InputBridge::new();
        assert_eq!(bridge.translate(NativeEvent::ModifiersChanged(SHIFT)), None);
        let event = bridge.translate(NativeEvent::Key {
            key: Key::Char('a'),
            pressed: true,
            repeat: false,
        });
        assert_eq!(
            event,
            Some(InputEvent::Key(KeyInput {
                event: KeyEventKind::Down,
                key: Key::Char('a'),
                modifiers: SHIFT,
                repeat: false,
            }))
        );
    }

    #[test]
    fn focus_loss_clears_modifiers() {
        let mut bridge = InputBridge::new();
        bridge.translate(NativeEvent::ModifiersChanged(SHIFT));
        assert_eq!(
            bridge.translate(NativeEvent::FocusLost),
            Some(InputEvent::Focus(false))
        );
        assert!(bridge.modifiers().is_empty());
    }

    #[test]
    fn motion_reports_delta_and_buttons_reuse_location() {
        let mut bridge = InputBridge::new();
        bridge.translate(NativeEvent::CursorMoved(IVec2::new(10, 10)));
        let Some(InputEvent::Mouse(moved)) =
            bridge.translate(NativeEvent::CursorMoved(IVec2::new(13, 6)))
        else {
            panic!("expected a mouse event");
        };
        assert_eq!(moved.event, MouseEventKind::Move);
        assert_eq!(moved.delta, Vec2::new(3.0, -4.0));

        let Some(InputEvent::Mouse(down)) = bridge.translate(NativeEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
        }) else {
            panic!("expected a mouse event");
        };
        assert_eq!(down.event, MouseEventKind::Down);
        assert_eq!(down.button, Some(MouseButton::Right));
        assert_eq!(down.location, IVec2::new(13, 6));
    }

    #[test]
    fn forward_dispatches_to_handler() {
        let mut bridge = InputBridge::new();
        let mut events: Vec<InputEvent> = Vec::new();
        bridge.forward(NativeEvent::Resized(Size::new(640, 480)), &mut events);
        bridge.forward(NativeEvent::ModifiersChanged(SHIFT), &mut events);
        bridge.forward(NativeEvent::Text("é".into()), &mut events);
        bridge.forward(NativeEvent::Quit, &mut events);
        assert_eq!(
            events,
            vec![
                InputEvent::Resized(Size::new(640, 480)),
                InputEvent::Text("é".into()),
                InputEvent::Quit,
            ]
        );
    }
}
