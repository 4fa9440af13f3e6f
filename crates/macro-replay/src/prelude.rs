//! Convenient re-exports for common macro-replay usage.
//!
//! ```rust
//! use macro_replay::prelude::*;
//!
//! let recorder = Recorder::new();
//! assert!(!recorder.is_active());
//! ```

// Configuration
pub use crate::config::{EngineConfig, LogFormat, LoggingConfig};

// Error handling
pub use crate::error::{MacroError, Result};

// Data model
pub use crate::event::{EventKind, MacroEvent, MouseButton};
pub use crate::recording::{Recording, RecordingId};
pub use crate::types::{Hotkey, HotkeyModifiers};

// Engine
pub use crate::player::{PlaybackOptions, PlaybackReport, Player, PlayerEvent};
pub use crate::recorder::{Recorder, RecorderEvent};

// Boundaries
pub use crate::input::{InputAction, InputSink, RawInput};

// Collaborators
pub use crate::controller::{ActivationSignal, MacroController};
pub use crate::humanize::Humanizer;
pub use crate::storage::RecordingStore;
