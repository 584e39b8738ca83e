use crate::event::{InputEvent, KeyInput, MouseInput};
use glhal_common::Size;

/// Receives translated input. Every method defaults to ignoring the event.
pub trait InputHandler {
    fn on_key(&mut self, _input: KeyInput) {}
    fn on_text(&mut self, _text: &str) {}
    fn on_mouse(&mut self, _input: MouseInput) {}
    fn on_focus_changed(&mut self, _focused: bool) {}
    fn on_resize(&mut self, _size: Size) {}
    fn on_quit(&mut self) {}
}

/// Route one event to the matching handler method.
pub fn dispatch(event: InputEvent, handler: &mut dyn InputHandler) {
    match event {
        InputEvent::Key(input) => handler.on_key(input),
        InputEvent::Text(text) => handler.on_text(&text),
        InputEvent::Mouse(input) => handler.on_mouse(input),
        InputEvent::Focus(focused) => handler.on_focus_changed(focused),
        InputEvent::Resized(size) => handler.on_resize(size),
        InputEvent::Quit => handler.on_quit(),
    }
}

/// Records every event in arrival order.
impl InputHandler for Vec<InputEvent> {
    fn on_key(&mut self, input: KeyInput) {
        self.push(InputEvent::Key(input));
    }

    fn on_text(&mut self, text: &str) {
        self.push(InputEvent::Text(text.to_owned()));
    }

    fn on_mouse(&mut self, input: MouseInput) {
        self.push(InputEvent::Mouse(input));
    }

    fn on_focus_changed(&mut self, focused: bool) {
        self.push(InputEvent::Focus(focused));
    }

    fn on_resize(&mut self, size: Size) {
        self.push(InputEvent::Resized(size));
    }

    fn on_quit(&mut self) {
        self.push(InputEvent::Quit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct QuitOnly {
        quit: bool,
    }

    impl InputHandler for QuitOnly {
        fn on_quit(&mut self) {
            self.quit = true;
        }
    }

    #[test]
    fn unhandled_families_are_ignored() {
        let mut handler = QuitOnly { quit: false };
        dispatch(InputEvent::Text("a".into()), &mut handler);
        dispatch(InputEvent::Focus(true), &mut handler);
        assert!(!handler.quit);
        dispatch(InputEvent::Quit, &mut handler);
        assert!(handler.quit);
    }

    #[test]
    fn vec_records_in_order() {
        let mut events: Vec<InputEvent> = Vec::new();
        dispatch(InputEvent::Resized(Size::new(4, 3)), &mut events);
        dispatch(InputEvent::Quit, &mut events);
        assert_eq!(
            events,
            vec![InputEvent::Resized(Size::new(4, 3)), InputEvent::Quit]
        );
    }
}
