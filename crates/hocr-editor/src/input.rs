//! Input abstraction layer.
//!
//! Normalizes host pointer and keyboard callbacks into `InputEvent`s
//! consumed by the interaction machine. Positions are in screen space.

use bitflags::bitflags;
use hocr_core::{Affine, Point, Vec2};

bitflags! {
    /// Modifier keys held while an event fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keys the canvas reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Control,
    Alt,
    Shift,
    Other,
}

impl Key {
    /// Unit step for arrow keys, in document units.
    pub fn arrow_delta(self) -> Option<Vec2> {
        match self {
            Key::Up => Some(Vec2::new(0.0, -1.0)),
            Key::Down => Some(Vec2::new(0.0, 1.0)),
            Key::Left => Some(Vec2::new(-1.0, 0.0)),
            Key::Right => Some(Vec2::new(1.0, 0.0)),
            _ => None,
        }
    }

    /// Keys whose press or release changes an in-flight resize.
    pub fn affects_resize(self) -> bool {
        matches!(self, Key::Control | Key::Alt)
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },
    /// Wheel scroll. Only the drag limit is recomputed.
    Wheel { delta: f64, modifiers: Modifiers },
    KeyDown { key: Key, modifiers: Modifiers },
    KeyUp { key: Key, modifiers: Modifiers },
    /// The host panned or zoomed: `transform` maps document to screen.
    TransformChanged { transform: Affine },
}

impl InputEvent {
    pub fn primary_down(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            modifiers,
        }
    }

    pub fn pointer_move(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerMove { x, y, modifiers }
    }

    pub fn primary_up(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerUp {
            x,
            y,
            button: PointerButton::Primary,
            modifiers,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Option<Modifiers> {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Wheel { modifiers, .. }
            | Self::KeyDown { modifiers, .. }
            | Self::KeyUp { modifiers, .. } => Some(*modifiers),
            Self::TransformChanged { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_map_to_unit_steps() {
        assert_eq!(Key::Left.arrow_delta(), Some(Vec2::new(-1.0, 0.0)));
        assert_eq!(Key::Down.arrow_delta(), Some(Vec2::new(0.0, 1.0)));
        assert_eq!(Key::Control.arrow_delta(), None);
    }

    #[test]
    fn position_only_for_pointer_events() {
        let down = InputEvent::primary_down(3.0, 4.0, Modifiers::NONE);
        assert_eq!(down.position(), Some(Point::new(3.0, 4.0)));
        let key = InputEvent::KeyDown {
            key: Key::Up,
            modifiers: Modifiers::CTRL,
        };
        assert_eq!(key.position(), None);
        assert_eq!(key.modifiers(), Some(Modifiers::CTRL));
    }
}
