use std::rc::Rc;

use crate::context::RenderPanel;
use crate::math::Vec2D;

/// Modifier keys held while an input event was generated.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Modifiers {
            shift: true,
            ..Modifiers::NONE
        }
    }

    pub fn ctrl() -> Self {
        Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum MouseButton {
    None,
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Move,
    Drag,
    Wheel,
}

/// A pointer event forwarded to the active tool.
///
/// Position is relative to the top-left corner of the panel the event
/// originated from. The event is owned by the dispatch call; tools must
/// copy out anything they want to keep.
#[derive(Debug, Clone)]
pub struct MouseEvent {
    pub panel: Rc<RenderPanel>,
    pub kind: MouseEventKind,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub pos: Vec2D,
    pub wheel_delta: f32,
}

impl MouseEvent {
    pub fn press(panel: &Rc<RenderPanel>, button: MouseButton, pos: Vec2D) -> Self {
        Self::new(panel, MouseEventKind::Press, button, pos)
    }

    pub fn release(panel: &Rc<RenderPanel>, button: MouseButton, pos: Vec2D) -> Self {
        Self::new(panel, MouseEventKind::Release, button, pos)
    }

    pub fn moved(panel: &Rc<RenderPanel>, pos: Vec2D) -> Self {
        Self::new(panel, MouseEventKind::Move, MouseButton::None, pos)
    }

    pub fn drag(panel: &Rc<RenderPanel>, button: MouseButton, pos: Vec2D) -> Self {
        Self::new(panel, MouseEventKind::Drag, button, pos)
    }

    pub fn wheel(panel: &Rc<RenderPanel>, delta: f32, pos: Vec2D) -> Self {
        let mut event = Self::new(panel, MouseEventKind::Wheel, MouseButton::None, pos);
        event.wheel_delta = delta;
        event
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn new(panel: &Rc<RenderPanel>, kind: MouseEventKind, button: MouseButton, pos: Vec2D) -> Self {
        Self {
            panel: Rc::clone(panel),
            kind,
            button,
            modifiers: Modifiers::NONE,
            pos,
            wheel_delta: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Return,
    Delete,
    Tab,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn character(c: char) -> Self {
        Self::new(Key::Char(c))
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
