use glam::{IVec2, Vec2};
use glhal_common::Size;
use glhal_native::{Key, Modifiers, MouseButton, NativeEvent};
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

/// Pixel deltas from touchpads are reported in lines of this height.
const PIXELS_PER_LINE: f32 = 20.0;

/// Translate one window event, appending zero or more native events.
pub(crate) fn translate(event: WindowEvent, out: &mut Vec<NativeEvent>) {
    match event {
        WindowEvent::CloseRequested => out.push(NativeEvent::Quit),
        WindowEvent::Focused(true) => out.push(NativeEvent::FocusGained),
        WindowEvent::Focused(false) => out.push(NativeEvent::FocusLost),
        WindowEvent::Resized(size) => {
            out.push(NativeEvent::Resized(Size::new(size.width, size.height)))
        }
        WindowEvent::ModifiersChanged(modifiers) => {
            out.push(NativeEvent::ModifiersChanged(modifiers_from(modifiers.state())))
        }
        WindowEvent::KeyboardInput { event, .. } => {
            let pressed = event.state == ElementState::Pressed;
            out.push(NativeEvent::Key {
                key: key_from(event.physical_key),
                pressed,
                repeat: event.repeat,
            });
            if let Some(text) = event.text.filter(|_| pressed) {
                let printable: String = text.chars().filter(|c| !c.is_control()).collect();
                if !printable.is_empty() {
                    out.push(NativeEvent::Text(printable));
                }
            }
        }
        WindowEvent::CursorMoved { position, .. } => out.push(NativeEvent::CursorMoved(
            IVec2::new(position.x as i32, position.y as i32),
        )),
        WindowEvent::MouseInput { state, button, .. } => out.push(NativeEvent::MouseButton {
            button: button_from(button),
            pressed: state == ElementState::Pressed,
        }),
        WindowEvent::MouseWheel { delta, .. } => {
            let lines = match delta {
                MouseScrollDelta::LineDelta(x, y) => Vec2::new(x, y),
                MouseScrollDelta::PixelDelta(p) => {
                    Vec2::new(p.x as f32, p.y as f32) / PIXELS_PER_LINE
                }
            };
            out.push(NativeEvent::MouseWheel(lines));
        }
        _ => {}
    }
}

fn modifiers_from(state: ModifiersState) -> Modifiers {
    Modifiers {
        shift: state.shift_key(),
        ctrl: state.control_key(),
        alt: state.alt_key(),
        meta: state.super_key(),
    }
}

fn button_from(button: winit::event::MouseButton) -> MouseButton {
    use winit::event::MouseButton as B;
    match button {
        B::Left => MouseButton::Left,
        B::Right => MouseButton::Right,
        B::Middle => MouseButton::Middle,
        B::Back => MouseButton::Other(4),
        B::Forward => MouseButton::Other(5),
        B::Other(n) => MouseButton::Other(n),
    }
}

fn key_from(key: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = key else {
        return Key::Unknown;
    };
    if let Some(c) = char_key(code) {
        return Key::Char(c);
    }
    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Space => Key::Space,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Ctrl,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,
        KeyCode::F1 => Key::F(1),
        KeyCode::F2 => Key::F(2),
        KeyCode::F3 => Key::F(3),
        KeyCode::F4 => Key::F(4),
        KeyCode::F5 => Key::F(5),
        KeyCode::F6 => Key::F(6),
        KeyCode::F7 => Key::F(7),
        KeyCode::F8 => Key::F(8),
        KeyCode::F9 => Key::F(9),
        KeyCode::F10 => Key::F(10),
        KeyCode::F11 => Key::F(11),
        KeyCode::F12 => Key::F(12),
        _ => Key::Unknown,
    }
}

fn char_key(code: KeyCode) -> Option<char> {
    let c = match code {
        KeyCode::KeyA => 'a',
        KeyCode::KeyB => 'b',
        KeyCode::KeyC => 'c',
        KeyCode::KeyD => 'd',
        KeyCode::KeyE => 'e',
        KeyCode::KeyF => 'f',
        KeyCode::KeyG => 'g',
        KeyCode::KeyH => 'h',
        KeyCode::KeyI => 'i',
        KeyCode::KeyJ => 'j',
        KeyCode::KeyK => 'k',
        KeyCode::KeyL => 'l',
        KeyCode::KeyM => 'm',
        KeyCode::KeyN => 'n',
        KeyCode::KeyO => 'o',
        KeyCode::KeyP => 'p',
        KeyCode::KeyQ => 'q',
        KeyCode::KeyR => 'r',
        KeyCode::KeyS => 's',
        KeyCode::KeyT => 't',
        KeyCode::KeyU => 'u',
        KeyCode::KeyV => 'v',
        KeyCode::KeyW => 'w',
        KeyCode::KeyX => 'x',
        KeyCode::KeyY => 'y',
        KeyCode::KeyZ => 'z',
        KeyCode::Digit0 => '0',
        KeyCode::Digit1 => '1',
        KeyCode::Digit2 => '2',
        KeyCode::Digit3 => '3',
        KeyCode::Digit4 => '4',
        KeyCode::Digit5 => '5',
        KeyCode::Digit6 => '6',
        KeyCode::Digit7 => '7',
        KeyCode::Digit8 => '8',
        KeyCode::Digit9 => '9',
        _ => return None,
    };
    Some(c)
}
