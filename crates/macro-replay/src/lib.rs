//! macro-replay: input macro capture and timing-accurate playback
//!
//! This crate records pointer, button, key and wheel input into named
//! recordings and plays them back with the original timing, scaled by a
//! speed factor and repeated for a number of passes. The operating system
//! layer (input hooks and synthetic input) stays outside the crate; it
//! talks to the core through [`RawInput`] and [`InputSink`].
//!
//! # Features
//!
//! - **Recorder** stamping events with a monotonic session clock
//! - **Player** on the tokio clock with prompt cooperative cancellation
//! - **Typed notifications** over channels instead of callbacks
//! - **JSON persistence** with partial-failure tolerant bulk loading
//! - **Humanizer** adding Gaussian timing and position variance
//! - **Pattern analysis** with optimisation suggestions
//!
//! # Example
//!
//! ```rust
//! use macro_replay::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let recorder = Recorder::new();
//!     recorder.start(Some("demo"))?;
//!     recorder.record_pointer_move(10, 20);
//!     recorder.record_key(EventKind::KeyDown, 0x41);
//!     let recording = recorder.stop()?;
//!
//!     let player = Player::new();
//!     let mut events = player.subscribe();
//!     let report = player.play(&recording).await?;
//!     assert_eq!(report.events_played, 2);
//!
//!     while let Ok(event) = events.try_recv() {
//!         if let PlayerEvent::SimulateInput(e) = event {
//!             println!("inject {e}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types
pub mod config;
pub mod error;
pub mod event;
pub mod prelude;
pub mod recording;
pub mod types;

// Engine
pub mod input;
pub mod notify;
pub mod player;
pub mod recorder;
pub mod util;

// Collaborators
pub mod analysis;
pub mod controller;
pub mod humanize;
pub mod logging;
pub mod storage;

pub use analysis::{MacroAnalysis, RepeatedPattern, analyze};
pub use config::{
    EngineConfig, HotkeyConfig, LogFormat, LoggingConfig, PlaybackConfig, RecordingConfig,
    StorageConfig,
};
pub use controller::{ActivationSignal, HotkeyMap, MacroController, SignalOutcome};
pub use error::{Component, MacroError, Result};
pub use event::{EventKind, MacroEvent, MouseButton};
pub use humanize::Humanizer;
pub use input::{InputAction, InputSink, LoggingSink, RawInput, RecordingSink};
pub use notify::Notifier;
pub use player::{PlaybackOptions, PlaybackReport, Player, PlayerEvent};
pub use recorder::{Recorder, RecorderBuilder, RecorderEvent};
pub use recording::{Recording, RecordingId};
pub use storage::RecordingStore;
pub use types::{Hotkey, HotkeyModifiers};
pub use util::CancelToken;
