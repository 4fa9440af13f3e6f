//! Live input recording.
//!
//! A [`Recorder`] turns hook notifications into a [`Recording`]. Every
//! accepted event is stamped with the milliseconds elapsed since
//! [`Recorder::start`], so recorded timestamps never decrease.
//!
//! # Example
//!
//! ```rust
//! use macro_replay::recorder::Recorder;
//!
//! let recorder = Recorder::new();
//! recorder.start(Some("Login")).unwrap();
//! recorder.record_pointer_move(10, 20);
//! let recording = recorder.stop().unwrap();
//! assert_eq!(recording.event_count(), 1);
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::RecordingConfig;
use crate::error::{Component, MacroError, Result};
use crate::event::{EventKind, MacroEvent, MouseButton};
use crate::input::RawInput;
use crate::notify::Notifier;
use crate::recording::{DEFAULT_RECORDING_NAME, Recording, RecordingId};

/// Notifications published by a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// A session began.
    Started {
        /// Id of the new recording.
        id: RecordingId,
        /// Name of the new recording.
        name: String,
    },
    /// An event was appended.
    EventRecorded(MacroEvent),
    /// The session ended; carries the finished recording.
    Stopped(Recording),
}

// Notifications are sent while this lock is held so subscribers see them in
// transition order. Sending only queues on a channel.
#[derive(Debug)]
enum State {
    Idle,
    Recording { recording: Recording, started: Instant },
}

/// Records hook input into a [`Recording`].
#[derive(Debug)]
pub struct Recorder {
    state: Mutex<State>,
    notifier: Notifier<RecorderEvent>,
    default_name: String,
    max_events: Option<usize>,
    max_duration: Option<Duration>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    /// Create an idle recorder with no limits.
    #[must_use]
    pub fn new() -> Self {
        RecorderBuilder::new().build()
    }

    /// Create a recorder from configuration.
    #[must_use]
    pub fn from_config(config: &RecordingConfig) -> Self {
        let mut builder = RecorderBuilder::new().default_name(config.default_name.clone());
        if let Some(count) = config.max_events {
            builder = builder.max_events(count);
        }
        if let Some(ms) = config.max_duration_ms {
            let limit = Duration::try_from_secs_f64(ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX);
            builder = builder.max_duration(limit);
        }
        builder.build()
    }

    /// Create a builder.
    #[must_use]
    pub fn builder() -> RecorderBuilder {
        RecorderBuilder::new()
    }

    /// Subscribe to recorder notifications.
    #[must_use]
    pub fn subscribe(&self) -> UnboundedReceiver<RecorderEvent> {
        self.notifier.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a recording session.
    ///
    /// Uses the configured default name when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::AlreadyActive`] if a session is in progress.
    pub fn start(&self, name: Option<&str>) -> Result<()> {
        let mut state = self.lock();
        if matches!(*state, State::Recording { .. }) {
            return Err(MacroError::already_active(Component::Recorder));
        }
        let recording = Recording::new(name.unwrap_or(&self.default_name));
        let (id, name) = (recording.id, recording.name.clone());
        *state = State::Recording {
            recording,
            started: Instant::now(),
        };

        tracing::info!(recording.id = %id, name = %name, "Recording started");
        self.notifier.emit(RecorderEvent::Started { id, name });
        Ok(())
    }

    /// Record a pointer move.
    pub fn record_pointer_move(&self, x: i32, y: i32) {
        self.append(|t| MacroEvent::pointer_move(x, y, t));
    }

    /// Record a mouse button transition.
    ///
    /// Kinds other than button down/up are ignored.
    pub fn record_button(&self, kind: EventKind, x: i32, y: i32) {
        if !kind.is_button() {
            tracing::debug!(kind = kind.name(), "Ignoring non-button kind");
            return;
        }
        self.append(|t| MacroEvent::button(kind, x, y, t));
    }

    /// Record a key transition.
    ///
    /// Kinds other than key down/up are ignored.
    pub fn record_key(&self, kind: EventKind, key_code: u32) {
        if !kind.is_key() {
            tracing::debug!(kind = kind.name(), "Ignoring non-key kind");
            return;
        }
        self.append(|t| MacroEvent::key(kind, key_code, t));
    }

    /// Record wheel motion.
    pub fn record_wheel(&self, delta: i32, x: i32, y: i32) {
        self.append(|t| MacroEvent::wheel(delta, x, y, t));
    }

    /// Record a raw hook notification.
    pub fn handle(&self, input: RawInput) {
        match input {
            RawInput::PointerMove { x, y } => self.record_pointer_move(x, y),
            RawInput::Button {
                button_id,
                is_down,
                x,
                y,
            } => {
                let button = MouseButton::from_id(button_id);
                let kind = if is_down {
                    EventKind::ButtonDown(button)
                } else {
                    EventKind::ButtonUp(button)
                };
                self.record_button(kind, x, y);
            }
            RawInput::Key { code, is_down } => {
                let kind = if is_down {
                    EventKind::KeyDown
                } else {
                    EventKind::KeyUp
                };
                self.record_key(kind, code);
            }
            RawInput::Wheel { delta, x, y } => self.record_wheel(delta, x, y),
        }
    }

    fn append(&self, make: impl FnOnce(f64) -> MacroEvent) {
        let mut state = self.lock();
        let State::Recording { recording, started } = &mut *state else {
            return;
        };
        let elapsed = started.elapsed();
        if !self.within_limits(recording, elapsed) {
            return;
        }
        let event = make(elapsed.as_secs_f64() * 1000.0);
        recording.push_event(event);

        tracing::trace!(event = %event, "Recorded event");
        self.notifier.emit(RecorderEvent::EventRecorded(event));
    }

    fn within_limits(&self, recording: &Recording, elapsed: Duration) -> bool {
        if let Some(max) = self.max_events {
            if recording.event_count() >= max {
                return false;
            }
        }
        if let Some(max) = self.max_duration {
            if elapsed > max {
                return false;
            }
        }
        true
    }

    /// End the session and return the recording.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::NotActive`] if no session is in progress.
    pub fn stop(&self) -> Result<Recording> {
        let mut state = self.lock();
        let recording = match std::mem::replace(&mut *state, State::Idle) {
            State::Recording { recording, .. } => recording,
            State::Idle => return Err(MacroError::not_active(Component::Recorder)),
        };

        tracing::info!(
            recording.id = %recording.id,
            events = recording.event_count(),
            duration_ms = recording.total_duration(),
            "Recording stopped"
        );
        self.notifier.emit(RecorderEvent::Stopped(recording.clone()));
        Ok(recording)
    }

    /// Whether a session is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(*self.lock(), State::Recording { .. })
    }

    /// Events recorded so far, or 0 when idle.
    #[must_use]
    pub fn event_count(&self) -> usize {
        match &*self.lock() {
            State::Recording { recording, .. } => recording.event_count(),
            State::Idle => 0,
        }
    }

    /// Milliseconds since the session started, or 0 when idle.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        match &*self.lock() {
            State::Recording { started, .. } => started.elapsed().as_secs_f64() * 1000.0,
            State::Idle => 0.0,
        }
    }
}

/// Builder for creating recorders.
#[derive(Debug, Clone)]
pub struct RecorderBuilder {
    default_name: String,
    max_events: Option<usize>,
    max_duration: Option<Duration>,
}

impl Default for RecorderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_name: DEFAULT_RECORDING_NAME.to_string(),
            max_events: None,
            max_duration: None,
        }
    }

    /// Set the name used when `start` is given none.
    #[must_use]
    pub fn default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// Set maximum events.
    #[must_use]
    pub const fn max_events(mut self, count: usize) -> Self {
        self.max_events = Some(count);
        self
    }

    /// Set maximum duration.
    #[must_use]
    pub const fn max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    /// Build the recorder.
    #[must_use]
    pub fn build(self) -> Recorder {
        Recorder {
            state: Mutex::new(State::Idle),
            notifier: Notifier::new(),
            default_name: self.default_name,
            max_events: self.max_events,
            max_duration: self.max_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_twice_fails() {
        let recorder = Recorder::new();
        recorder.start(None).unwrap();
        let err = recorder.start(Some("again")).unwrap_err();
        assert!(err.is_already_active());
        assert_eq!(err.component(), Some(Component::Recorder));
        assert!(recorder.is_active());
    }

    #[test]
    fn stop_when_idle_fails() {
        let recorder = Recorder::new();
        assert!(recorder.stop().unwrap_err().is_not_active());
    }

    #[test]
    fn idle_observers() {
        let recorder = Recorder::new();
        assert!(!recorder.is_active());
        assert_eq!(recorder.event_count(), 0);
        assert_eq!(recorder.elapsed_ms(), 0.0);
    }

    #[test]
    fn default_name_applies() {
        let recorder = Recorder::builder().default_name("Untitled").build();
        recorder.start(None).unwrap();
        assert_eq!(recorder.stop().unwrap().name, "Untitled");

        let recorder = Recorder::new();
        recorder.start(None).unwrap();
        assert_eq!(recorder.stop().unwrap().name, DEFAULT_RECORDING_NAME);
    }

    #[test]
    fn input_ignored_when_idle() {
        let recorder = Recorder::new();
        recorder.record_pointer_move(1, 1);
        recorder.handle(RawInput::Key {
            code: 0x41,
            is_down: true,
        });
        recorder.start(None).unwrap();
        assert_eq!(recorder.event_count(), 0);
    }

    #[test]
    fn handle_maps_raw_input() {
        let recorder = Recorder::new();
        recorder.start(Some("raw")).unwrap();
        recorder.handle(RawInput::PointerMove { x: 3, y: 4 });
        recorder.handle(RawInput::Button {
            button_id: 1,
            is_down: true,
            x: 3,
            y: 4,
        });
        recorder.handle(RawInput::Key {
            code: 0x41,
            is_down: false,
        });
        recorder.handle(RawInput::Wheel {
            delta: -120,
            x: 3,
            y: 4,
        });
        let recording = recorder.stop().unwrap();

        let kinds: Vec<_> = recording.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::PointerMove,
                EventKind::ButtonDown(MouseButton::Right),
                EventKind::KeyUp,
                EventKind::WheelScroll,
            ]
        );
        assert_eq!(recording.events()[2].key_code, 0x41);
        assert_eq!(recording.events()[3].wheel_delta, -120);
    }

    #[test]
    fn mismatched_kinds_are_ignored() {
        let recorder = Recorder::new();
        recorder.start(None).unwrap();
        recorder.record_button(EventKind::KeyDown, 0, 0);
        recorder.record_key(EventKind::PointerMove, 0x41);
        recorder.record_button(EventKind::Delay, 0, 0);
        assert_eq!(recorder.event_count(), 0);
    }

    #[test]
    fn max_events_limit() {
        let recorder = Recorder::builder().max_events(2).build();
        recorder.start(None).unwrap();
        for i in 0..5 {
            recorder.record_pointer_move(i, i);
        }
        assert_eq!(recorder.stop().unwrap().event_count(), 2);
    }

    #[test]
    fn notifications_follow_transitions() {
        let recorder = Recorder::new();
        let mut rx = recorder.subscribe();

        recorder.start(Some("observed")).unwrap();
        recorder.record_wheel(120, 0, 0);
        let recording = recorder.stop().unwrap();

        match rx.try_recv().unwrap() {
            RecorderEvent::Started { id, name } => {
                assert_eq!(id, recording.id);
                assert_eq!(name, "observed");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            RecorderEvent::EventRecorded(recording.events()[0])
        );
        assert_eq!(rx.try_recv().unwrap(), RecorderEvent::Stopped(recording));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn from_config_limits() {
        let config = RecordingConfig::default()
            .default_name("Configured")
            .max_events(1);
        let recorder = Recorder::from_config(&config);
        recorder.start(None).unwrap();
        recorder.record_pointer_move(0, 0);
        recorder.record_pointer_move(1, 1);
        let recording = recorder.stop().unwrap();
        assert_eq!(recording.name, "Configured");
        assert_eq!(recording.event_count(), 1);
    }

    #[test]
    fn restart_gives_fresh_recording() {
        let recorder = Recorder::new();
        recorder.start(None).unwrap();
        recorder.record_pointer_move(0, 0);
        let first = recorder.stop().unwrap();

        recorder.start(None).unwrap();
        assert_eq!(recorder.event_count(), 0);
        let second = recorder.stop().unwrap();
        assert_ne!(first.id, second.id);
        assert!(second.is_empty());
    }
}
