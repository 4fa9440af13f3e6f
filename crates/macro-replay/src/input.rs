//! Boundary types for the OS input layer.
//!
//! The hook layer delivers [`RawInput`] notifications to the recorder; the
//! player produces events that an [`InputSink`] turns into synthetic input.
//! Neither side is implemented here.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::event::{EventKind, MacroEvent, MouseButton};

/// A raw notification delivered by an input hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    /// Pointer moved.
    PointerMove {
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
    },
    /// Mouse button transition.
    Button {
        /// Hook button id (0 = left, 1 = right, 2 = middle).
        button_id: u32,
        /// Pressed or released.
        is_down: bool,
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
    },
    /// Key transition.
    Key {
        /// Virtual key code.
        code: u32,
        /// Pressed or released.
        is_down: bool,
    },
    /// Wheel motion.
    Wheel {
        /// Wheel delta.
        delta: i32,
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
    },
}

/// A synthetic input request for the injection layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Move the pointer.
    MoveTo {
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
    },
    /// Press or release a mouse button at a position.
    Button {
        /// The button.
        button: MouseButton,
        /// Press (true) or release (false).
        pressed: bool,
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
    },
    /// Press or release a key.
    Key {
        /// Virtual key code.
        code: u32,
        /// Press (true) or release (false).
        pressed: bool,
    },
    /// Scroll the wheel at a position.
    Wheel {
        /// Wheel delta.
        delta: i32,
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
    },
    /// Wait without producing input.
    Wait {
        /// Milliseconds to wait.
        duration_ms: f64,
    },
}

impl From<&MacroEvent> for InputAction {
    fn from(event: &MacroEvent) -> Self {
        let (x, y) = (event.x, event.y);
        match event.kind {
            EventKind::PointerMove => Self::MoveTo { x, y },
            EventKind::ButtonDown(button) => Self::Button {
                button,
                pressed: true,
                x,
                y,
            },
            EventKind::ButtonUp(button) => Self::Button {
                button,
                pressed: false,
                x,
                y,
            },
            EventKind::WheelScroll => Self::Wheel {
                delta: event.wheel_delta,
                x,
                y,
            },
            EventKind::KeyDown => Self::Key {
                code: event.key_code,
                pressed: true,
            },
            EventKind::KeyUp => Self::Key {
                code: event.key_code,
                pressed: false,
            },
            EventKind::Delay => Self::Wait {
                duration_ms: event.duration,
            },
        }
    }
}

/// The injection collaborator.
///
/// Implementations realize an [`InputAction`] as OS-level input. They are
/// called from a background task and must be `Send + Sync`.
pub trait InputSink: Send + Sync {
    /// Inject one action.
    fn inject(&self, action: &InputAction) -> Result<()>;
}

impl<S: InputSink + ?Sized> InputSink for Arc<S> {
    fn inject(&self, action: &InputAction) -> Result<()> {
        (**self).inject(action)
    }
}

/// A sink that only remembers what it was asked to inject.
#[derive(Debug, Default)]
pub struct RecordingSink {
    actions: Mutex<Vec<InputAction>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions received so far.
    #[must_use]
    pub fn actions(&self) -> Vec<InputAction> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl InputSink for RecordingSink {
    fn inject(&self, action: &InputAction) -> Result<()> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*action);
        Ok(())
    }
}

/// A sink that logs each action, for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl InputSink for LoggingSink {
    fn inject(&self, action: &InputAction) -> Result<()> {
        tracing::info!(?action, "Dry-run input");
        Ok(())
    }
}
