//! Event model.
//!
//! A [`MacroEvent`] is one captured or synthesized input action. Fields that
//! are not meaningful for an event's kind are zero; construction never
//! rejects a combination, consumers decide what they read.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Right button.
    Right,
    /// Middle button.
    Middle,
}

impl MouseButton {
    /// Map a hook button id (0 = left, 1 = right, 2 = middle).
    ///
    /// Unknown ids fall back to [`MouseButton::Left`].
    #[must_use]
    pub const fn from_id(id: u32) -> Self {
        match id {
            1 => Self::Right,
            2 => Self::Middle,
            _ => Self::Left,
        }
    }
}

/// The kind of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Pointer moved to (x, y).
    PointerMove,
    /// A mouse button was pressed.
    ButtonDown(MouseButton),
    /// A mouse button was released.
    ButtonUp(MouseButton),
    /// The wheel was scrolled.
    WheelScroll,
    /// A key was pressed.
    KeyDown,
    /// A key was released.
    KeyUp,
    /// An explicit pause.
    Delay,
}

impl EventKind {
    /// Whether coordinates are meaningful for this kind.
    #[must_use]
    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::PointerMove | Self::ButtonDown(_) | Self::ButtonUp(_) | Self::WheelScroll
        )
    }

    /// Whether this is a button transition.
    #[must_use]
    pub const fn is_button(self) -> bool {
        matches!(self, Self::ButtonDown(_) | Self::ButtonUp(_))
    }

    /// Whether this is a key transition.
    #[must_use]
    pub const fn is_key(self) -> bool {
        matches!(self, Self::KeyDown | Self::KeyUp)
    }

    /// A stable name for diagnostics and statistics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PointerMove => "PointerMove",
            Self::ButtonDown(MouseButton::Left) => "LeftDown",
            Self::ButtonDown(MouseButton::Right) => "RightDown",
            Self::ButtonDown(MouseButton::Middle) => "MiddleDown",
            Self::ButtonUp(MouseButton::Left) => "LeftUp",
            Self::ButtonUp(MouseButton::Right) => "RightUp",
            Self::ButtonUp(MouseButton::Middle) => "MiddleUp",
            Self::WheelScroll => "WheelScroll",
            Self::KeyDown => "KeyDown",
            Self::KeyUp => "KeyUp",
            Self::Delay => "Delay",
        }
    }
}

/// One captured or synthesized input action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroEvent {
    /// Event kind.
    pub kind: EventKind,
    /// X coordinate (pointer kinds).
    #[serde(default)]
    pub x: i32,
    /// Y coordinate (pointer kinds).
    #[serde(default)]
    pub y: i32,
    /// Virtual key code (key kinds).
    #[serde(default)]
    pub key_code: u32,
    /// Wheel delta (wheel kind).
    #[serde(default)]
    pub wheel_delta: i32,
    /// Milliseconds from the start of the recording session.
    pub timestamp: f64,
    /// Milliseconds to wait (delay kind).
    #[serde(default)]
    pub duration: f64,
    /// Whether timing or position jitter has been applied.
    #[serde(default)]
    pub humanized: bool,
}

impl MacroEvent {
    /// Create a bare event of the given kind.
    #[must_use]
    pub const fn new(kind: EventKind, timestamp: f64) -> Self {
        Self {
            kind,
            x: 0,
            y: 0,
            key_code: 0,
            wheel_delta: 0,
            timestamp,
            duration: 0.0,
            humanized: false,
        }
    }

    /// Create a pointer move event.
    #[must_use]
    pub const fn pointer_move(x: i32, y: i32, timestamp: f64) -> Self {
        Self {
            x,
            y,
            ..Self::new(EventKind::PointerMove, timestamp)
        }
    }

    /// Create a button event; `kind` is expected to be a button kind.
    #[must_use]
    pub const fn button(kind: EventKind, x: i32, y: i32, timestamp: f64) -> Self {
        Self {
            x,
            y,
            ..Self::new(kind, timestamp)
        }
    }

    /// Create a key event; `kind` is expected to be a key kind.
    #[must_use]
    pub const fn key(kind: EventKind, key_code: u32, timestamp: f64) -> Self {
        Self {
            key_code,
            ..Self::new(kind, timestamp)
        }
    }

    /// Create a wheel event.
    #[must_use]
    pub const fn wheel(delta: i32, x: i32, y: i32, timestamp: f64) -> Self {
        Self {
            x,
            y,
            wheel_delta: delta,
            ..Self::new(EventKind::WheelScroll, timestamp)
        }
    }

    /// Create an explicit delay.
    #[must_use]
    pub const fn delay(duration: f64, timestamp: f64) -> Self {
        Self {
            duration,
            ..Self::new(EventKind::Delay, timestamp)
        }
    }
}

impl fmt::Display for MacroEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind.name();
        match self.kind {
            EventKind::PointerMove | EventKind::ButtonDown(_) | EventKind::ButtonUp(_) => {
                write!(f, "{name} ({}, {})", self.x, self.y)?;
            }
            EventKind::WheelScroll => {
                write!(f, "{name} {:+} ({}, {})", self.wheel_delta, self.x, self.y)?;
            }
            EventKind::KeyDown | EventKind::KeyUp => write!(f, "{name} ({})", self.key_code)?,
            EventKind::Delay => write!(f, "{name} ({:.2}ms)", self.duration)?,
        }
        write!(f, " @ {:.2}ms", self.timestamp)
    }
}
