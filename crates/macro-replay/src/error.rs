//! Error types for macro-replay.
//!
//! Recorder and player misuse (starting twice, stopping while idle, playing
//! an empty recording) is reported through [`MacroError`] synchronously from
//! the call that detected it. Cancelling a playback is never an error.

use std::fmt;

use thiserror::Error;

/// The state machine that rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The recorder.
    Recorder,
    /// The player.
    Player,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorder => write!(f, "recorder"),
            Self::Player => write!(f, "player"),
        }
    }
}

/// The main error type for macro-replay operations.
#[derive(Debug, Error)]
pub enum MacroError {
    /// Start requested while the component is already active.
    #[error("{component} is already active")]
    AlreadyActive {
        /// The component that is already active.
        component: Component,
    },

    /// Stop requested while the component is idle.
    #[error("{component} is not active")]
    NotActive {
        /// The component that is idle.
        component: Component,
    },

    /// Playback requested on an empty or malformed recording.
    #[error("invalid recording: {reason}")]
    InvalidRecording {
        /// Why the recording cannot be played.
        reason: String,
    },

    /// A playback speed that is zero, negative or not finite.
    #[error("invalid playback speed {speed}: speed must be a positive number")]
    InvalidSpeed {
        /// The rejected speed.
        speed: f64,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A recording could not be serialized or deserialized.
    #[error("{context}: {source}")]
    Serialization {
        /// What was being (de)serialized.
        context: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// No saved recording with the given name.
    #[error("recording '{name}' not found")]
    RecordingNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// A file name that would resolve outside the recording directory.
    #[error("invalid recording file name '{name}'")]
    InvalidFileName {
        /// The rejected name.
        name: String,
    },

    /// The injection collaborator failed to realize an input action.
    #[error("input injection failed: {message}")]
    Injection {
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for macro-replay operations.
pub type Result<T> = std::result::Result<T, MacroError>;

impl MacroError {
    /// Create an already-active error.
    #[must_use]
    pub const fn already_active(component: Component) -> Self {
        Self::AlreadyActive { component }
    }

    /// Create a not-active error.
    #[must_use]
    pub const fn not_active(component: Component) -> Self {
        Self::NotActive { component }
    }

    /// Create an invalid recording error.
    pub fn invalid_recording(reason: impl Into<String>) -> Self {
        Self::InvalidRecording {
            reason: reason.into(),
        }
    }

    /// Create an invalid speed error.
    #[must_use]
    pub const fn invalid_speed(speed: f64) -> Self {
        Self::InvalidSpeed { speed }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an injection error.
    pub fn injection(message: impl Into<String>) -> Self {
        Self::Injection {
            message: message.into(),
        }
    }

    /// Create a serialization error with context.
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: std::io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if this is an already-active error.
    #[must_use]
    pub const fn is_already_active(&self) -> bool {
        matches!(self, Self::AlreadyActive { .. })
    }

    /// Check if this is a not-active error.
    #[must_use]
    pub const fn is_not_active(&self) -> bool {
        matches!(self, Self::NotActive { .. })
    }

    /// The component that rejected the call, for state errors.
    #[must_use]
    pub const fn component(&self) -> Option<Component> {
        match self {
            Self::AlreadyActive { component } | Self::NotActive { component } => Some(*component),
            _ => None,
        }
    }
}

/// Validate a playback speed multiplier.
pub(crate) fn check_speed(speed: f64) -> Result<f64> {
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(MacroError::invalid_speed(speed))
    }
}
