//! Recording playback.
//!
//! A [`Player`] walks a [`Recording`] on the tokio clock and publishes a
//! [`PlayerEvent::SimulateInput`] request for every event. It never touches
//! the operating system itself; an [`InputSink`](crate::input::InputSink)
//! subscribed to the player does that.
//!
//! # Timing
//!
//! Each pass has its own clock starting at zero. Before event `e` the
//! player sleeps for `e.timestamp / speed - elapsed` milliseconds when that
//! is positive. An event that is already late fires immediately and the
//! lag is not compensated: later events are still scheduled against the
//! pass clock, and the next pass starts a fresh clock.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use macro_replay::player::{PlaybackOptions, Player};
//! use macro_replay::recording::Recording;
//!
//! # async fn demo(recording: Recording) -> macro_replay::Result<()> {
//! let player = Arc::new(Player::new());
//! let report = player
//!     .play_with(&recording, PlaybackOptions::new().speed(2.0))
//!     .await?;
//! println!("played {} events", report.events_played);
//! # Ok(())
//! # }
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

use crate::error::{Component, MacroError, Result, check_speed};
use crate::event::MacroEvent;
use crate::notify::Notifier;
use crate::recording::{Recording, RecordingId};
use crate::util::CancelToken;

/// Notifications published by a [`Player`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Playback began.
    Started {
        /// Id of the recording being played.
        id: RecordingId,
    },
    /// An event is about to be played.
    EventPlaying(MacroEvent),
    /// Request for the injection layer to perform an event.
    SimulateInput(MacroEvent),
    /// Progress within the current pass.
    Progress {
        /// Fraction of the pass completed, in `(0, 1]`.
        fraction: f64,
        /// One-based pass number.
        pass: u32,
    },
    /// Playback ended, normally or by cancellation.
    Stopped,
}

/// Per-invocation overrides for [`Player::play_with`].
///
/// Unset fields fall back to the recording's own settings. Overrides are
/// never written back to the recording.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackOptions {
    /// Speed multiplier.
    pub speed: Option<f64>,
    /// Number of passes; 0 repeats until stopped.
    pub loop_count: Option<u32>,
}

impl PlaybackOptions {
    /// Create options that use the recording's settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the speed.
    #[must_use]
    pub const fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Override the loop count.
    #[must_use]
    pub const fn loop_count(mut self, count: u32) -> Self {
        self.loop_count = Some(count);
        self
    }
}

/// Summary of one playback invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Simulate-input requests issued.
    pub events_played: usize,
    /// Passes that ran to their last event.
    pub passes_completed: u32,
    /// Whether playback ended because of [`Player::stop`].
    pub cancelled: bool,
}

#[derive(Debug)]
enum State {
    Idle,
    Playing { cancel: CancelToken, speed: f64 },
}

/// Plays recordings back as simulate-input requests.
///
/// Share it with `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct Player {
    state: Mutex<State>,
    notifier: Notifier<PlayerEvent>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// Create an idle player.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Idle),
            notifier: Notifier::new(),
        }
    }

    /// Subscribe to player notifications.
    #[must_use]
    pub fn subscribe(&self) -> UnboundedReceiver<PlayerEvent> {
        self.notifier.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Play a recording with its own speed and loop count.
    ///
    /// See [`play_with`](Self::play_with).
    pub async fn play(&self, recording: &Recording) -> Result<PlaybackReport> {
        self.play_with(recording, PlaybackOptions::default()).await
    }

    /// Play a recording, resolving once playback has ended.
    ///
    /// Stopping is not an error: a stopped playback resolves to `Ok` with
    /// [`PlaybackReport::cancelled`] set. Dropping the future also ends
    /// playback and still publishes [`PlayerEvent::Stopped`].
    ///
    /// # Errors
    ///
    /// Checked in this order, before any state change:
    ///
    /// - [`MacroError::InvalidRecording`] if the recording has no events
    ///   or a timestamp is not finite.
    /// - [`MacroError::InvalidSpeed`] if the effective speed is not a
    ///   positive number.
    /// - [`MacroError::AlreadyActive`] if a playback is in progress.
    pub async fn play_with(
        &self,
        recording: &Recording,
        options: PlaybackOptions,
    ) -> Result<PlaybackReport> {
        validate(recording)?;
        let speed = check_speed(options.speed.unwrap_or(recording.playback_speed))?;
        let loop_count = options.loop_count.unwrap_or(recording.loop_count);

        let cancel = {
            let mut state = self.lock();
            if matches!(*state, State::Playing { .. }) {
                return Err(MacroError::already_active(Component::Player));
            }
            let cancel = CancelToken::new();
            *state = State::Playing {
                cancel: cancel.clone(),
                speed,
            };
            cancel
        };
        let _playing = PlayingGuard { player: self };

        tracing::info!(
            recording.id = %recording.id,
            events = recording.event_count(),
            speed,
            loop_count,
            "Playback started"
        );
        self.notifier.emit(PlayerEvent::Started { id: recording.id });

        let report = self.run(recording.events(), loop_count, &cancel).await;

        tracing::info!(
            recording.id = %recording.id,
            events_played = report.events_played,
            passes = report.passes_completed,
            cancelled = report.cancelled,
            "Playback finished"
        );
        Ok(report)
    }

    async fn run(
        &self,
        events: &[MacroEvent],
        loop_count: u32,
        cancel: &CancelToken,
    ) -> PlaybackReport {
        let total = events.len();
        let mut report = PlaybackReport::default();
        let mut pass: u32 = 0;

        while loop_count == 0 || pass < loop_count {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return report;
            }
            pass = pass.saturating_add(1);
            tracing::debug!(pass, "Starting pass");
            let pass_start = Instant::now();

            for (index, event) in events.iter().enumerate() {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    return report;
                }

                let target = event.timestamp / self.current_speed();
                let elapsed = pass_start.elapsed().as_secs_f64() * 1000.0;
                let delay = target - elapsed;
                if delay > 0.0 {
                    let delay =
                        Duration::try_from_secs_f64(delay / 1000.0).unwrap_or(Duration::MAX);
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            report.cancelled = true;
                            return report;
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                } else if delay < 0.0 {
                    tracing::trace!(late_ms = -delay, "Event is behind schedule");
                }

                tracing::trace!(pass, index, event = %event, "Playing event");
                self.notifier.emit(PlayerEvent::EventPlaying(*event));
                self.notifier.emit(PlayerEvent::SimulateInput(*event));
                report.events_played += 1;
                self.notifier.emit(PlayerEvent::Progress {
                    fraction: (index + 1) as f64 / total as f64,
                    pass,
                });
            }

            report.passes_completed += 1;
        }

        report
    }

    fn current_speed(&self) -> f64 {
        match &*self.lock() {
            State::Playing { speed, .. } => *speed,
            State::Idle => 1.0,
        }
    }

    /// Request that the current playback stop.
    ///
    /// Only signals; the playback unwinds on its own task. No-op when idle.
    pub fn stop(&self) {
        if let State::Playing { cancel, .. } = &*self.lock() {
            tracing::info!("Playback stop requested");
            cancel.cancel();
        }
    }

    /// Change the speed of the current playback.
    ///
    /// Takes effect from the next event.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidSpeed`] for a non-positive speed and
    /// [`MacroError::NotActive`] when nothing is playing.
    pub fn set_speed(&self, speed: f64) -> Result<()> {
        let speed = check_speed(speed)?;
        match &mut *self.lock() {
            State::Playing { speed: current, .. } => {
                *current = speed;
                tracing::debug!(speed, "Playback speed changed");
                Ok(())
            }
            State::Idle => Err(MacroError::not_active(Component::Player)),
        }
    }

    /// Whether a playback is in progress.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(*self.lock(), State::Playing { .. })
    }
}

fn validate(recording: &Recording) -> Result<()> {
    if recording.is_empty() {
        return Err(MacroError::invalid_recording(format!(
            "'{}' has no events",
            recording.name
        )));
    }
    if let Some(index) = recording
        .events()
        .iter()
        .position(|e| !e.timestamp.is_finite())
    {
        return Err(MacroError::invalid_recording(format!(
            "event {index} of '{}' has a non-finite timestamp",
            recording.name
        )));
    }
    Ok(())
}

/// Returns the player to idle and publishes `Stopped` on every exit path.
struct PlayingGuard<'a> {
    player: &'a Player,
}

impl Drop for PlayingGuard<'_> {
    fn drop(&mut self) {
        *self.player.lock() = State::Idle;
        self.player.notifier.emit(PlayerEvent::Stopped);
    }
}
