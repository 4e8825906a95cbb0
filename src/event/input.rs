//! Terminal input adapter.
//!
//! Translates crossterm events into [`DomEvent`]s aimed at the surface's
//! global nodes, so the rest of the runtime never depends on crossterm
//! directly. Keyboard, pointer and paste input goes to the document; resize,
//! scroll and focus changes go to the viewport.

use std::ops::{BitAnd, BitOr};

use crossterm::event::{
    Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use super::dom_event::{DomEvent, EventDetail};

/// Keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Insert,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

/// Modifier key bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1);
    pub const CTRL: Modifiers = Modifiers(2);
    pub const ALT: Modifiers = Modifiers(4);

    /// Check whether `self` contains all the bits in `other`.
    pub fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;
    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;
    fn bitand(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 & rhs.0)
    }
}

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

/// Which global node a translated event is dispatched at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Document,
    Viewport,
}

fn convert_modifiers(m: KeyModifiers) -> Modifiers {
    let mut out = Modifiers::NONE;
    if m.contains(KeyModifiers::SHIFT) {
        out = out | Modifiers::SHIFT;
    }
    if m.contains(KeyModifiers::CONTROL) {
        out = out | Modifiers::CTRL;
    }
    if m.contains(KeyModifiers::ALT) {
        out = out | Modifiers::ALT;
    }
    out
}

fn convert_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::F(n) => Key::F(n),
        _ => return None,
    };
    Some(key)
}

fn convert_mouse_button(b: MouseButton) -> MouseBtn {
    match b {
        MouseButton::Left => MouseBtn::Left,
        MouseButton::Right => MouseBtn::Right,
        MouseButton::Middle => MouseBtn::Middle,
    }
}

/// Translate a crossterm event. Returns `None` for key codes the runtime
/// does not model.
pub fn translate(event: Event) -> Option<(Route, DomEvent)> {
    match event {
        Event::Key(ke) => {
            let key = convert_key(ke.code)?;
            let kind = match ke.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => "keydown",
                KeyEventKind::Release => "keyup",
            };
            let detail = EventDetail::Key {
                key,
                modifiers: convert_modifiers(ke.modifiers),
            };
            Some((Route::Document, DomEvent::new(kind).with_detail(detail)))
        }
        Event::Mouse(me) => {
            let modifiers = convert_modifiers(me.modifiers);
            let (kind, button) = match me.kind {
                MouseEventKind::Down(b) => ("mousedown", Some(convert_mouse_button(b))),
                MouseEventKind::Up(b) => ("mouseup", Some(convert_mouse_button(b))),
                MouseEventKind::Drag(b) => ("mousemove", Some(convert_mouse_button(b))),
                MouseEventKind::Moved => ("mousemove", None),
                MouseEventKind::ScrollUp => return Some(scroll(0, -1)),
                MouseEventKind::ScrollDown => return Some(scroll(0, 1)),
                MouseEventKind::ScrollLeft => return Some(scroll(-1, 0)),
                MouseEventKind::ScrollRight => return Some(scroll(1, 0)),
            };
            let detail = EventDetail::Pointer {
                x: me.column,
                y: me.row,
                button,
                modifiers,
            };
            Some((Route::Document, DomEvent::new(kind).with_detail(detail)))
        }
        Event::Resize(width, height) => Some((
            Route::Viewport,
            DomEvent::new("resize").with_detail(EventDetail::Resize { width, height }),
        )),
        Event::FocusGained => Some((Route::Viewport, DomEvent::new("focus"))),
        Event::FocusLost => Some((Route::Viewport, DomEvent::new("blur"))),
        Event::Paste(text) => Some((
            Route::Document,
            DomEvent::new("paste").with_detail(EventDetail::Text(text)),
        )),
    }
}

fn scroll(delta_x: i16, delta_y: i16) -> (Route, DomEvent) {
    (
        Route::Viewport,
        DomEvent::new("scroll").with_detail(EventDetail::Scroll { delta_x, delta_y }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState, MouseEvent};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16, modifiers: KeyModifiers) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers,
        })
    }

    #[test]
    fn modifiers_combined() {
        let mods = Modifiers::CTRL | Modifiers::ALT;
        assert!(mods.contains(Modifiers::CTRL));
        assert!(mods.contains(Modifiers::ALT));
        assert!(!mods.contains(Modifiers::SHIFT));
        assert_eq!(mods & Modifiers::CTRL, Modifiers::CTRL);
        assert!(Modifiers::NONE.is_empty());
    }

    #[test]
    fn key_press_goes_to_document() {
        let (route, event) = translate(key(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(route, Route::Document);
        assert_eq!(event.kind(), "keydown");
        assert_eq!(
            event.detail(),
            &EventDetail::Key {
                key: Key::Char('c'),
                modifiers: Modifiers::CTRL
            }
        );
    }

    #[test]
    fn key_release_is_keyup() {
        let release = Event::Key(KeyEvent::new_with_kind_and_state(
            KeyCode::Enter,
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        ));
        let (_, event) = translate(release).unwrap();
        assert_eq!(event.kind(), "keyup");
    }

    #[test]
    fn navigation_keys_map() {
        for (code, expected) in [
            (KeyCode::Home, Key::Home),
            (KeyCode::End, Key::End),
            (KeyCode::PageUp, Key::PageUp),
            (KeyCode::Esc, Key::Escape),
            (KeyCode::F(5), Key::F(5)),
        ] {
            let (_, event) = translate(key(code, KeyModifiers::NONE)).unwrap();
            match event.detail() {
                EventDetail::Key { key, .. } => assert_eq!(*key, expected),
                other => panic!("unexpected detail {other:?}"),
            }
        }
    }

    #[test]
    fn unmodelled_key_is_dropped() {
        assert!(translate(key(KeyCode::CapsLock, KeyModifiers::NONE)).is_none());
    }

    #[test]
    fn mouse_down_carries_position_and_button() {
        let event = mouse(
            MouseEventKind::Down(MouseButton::Left),
            10,
            5,
            KeyModifiers::NONE,
        );
        let (route, event) = translate(event).unwrap();
        assert_eq!(route, Route::Document);
        assert_eq!(event.kind(), "mousedown");
        assert_eq!(
            event.detail(),
            &EventDetail::Pointer {
                x: 10,
                y: 5,
                button: Some(MouseBtn::Left),
                modifiers: Modifiers::NONE
            }
        );
    }

    #[test]
    fn drag_is_mousemove_with_button() {
        let event = mouse(
            MouseEventKind::Drag(MouseButton::Right),
            3,
            7,
            KeyModifiers::CONTROL,
        );
        let (_, event) = translate(event).unwrap();
        assert_eq!(event.kind(), "mousemove");
        assert!(matches!(
            event.detail(),
            EventDetail::Pointer {
                button: Some(MouseBtn::Right),
                ..
            }
        ));
    }

    #[test]
    fn wheel_scrolls_viewport() {
        let (route, event) =
            translate(mouse(MouseEventKind::ScrollUp, 0, 0, KeyModifiers::NONE)).unwrap();
        assert_eq!(route, Route::Viewport);
        assert_eq!(event.kind(), "scroll");
        assert_eq!(
            event.detail(),
            &EventDetail::Scroll {
                delta_x: 0,
                delta_y: -1
            }
        );
    }

    #[test]
    fn resize_and_focus_go_to_viewport() {
        let (route, event) = translate(Event::Resize(120, 40)).unwrap();
        assert_eq!(route, Route::Viewport);
        assert_eq!(
            event.detail(),
            &EventDetail::Resize {
                width: 120,
                height: 40
            }
        );
        assert_eq!(translate(Event::FocusGained).unwrap().1.kind(), "focus");
        assert_eq!(translate(Event::FocusLost).unwrap().1.kind(), "blur");
    }

    #[test]
    fn paste_carries_text() {
        let (route, event) = translate(Event::Paste("hello".to_string())).unwrap();
        assert_eq!(route, Route::Document);
        assert_eq!(event.detail(), &EventDetail::Text("hello".into()));
    }
}
