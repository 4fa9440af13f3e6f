//! Orchestration of recorder, player and storage.
//!
//! A [`MacroController`] owns one [`Recorder`], one [`Player`], a
//! [`RecordingStore`] and the in-memory library of saved recordings. It
//! reacts to the three [`ActivationSignal`]s that hotkeys map to and keeps
//! the library and selection in step with what was recorded.
//!
//! # Example
//!
//! ```rust,no_run
//! use macro_replay::config::EngineConfig;
//! use macro_replay::controller::{ActivationSignal, MacroController};
//! use macro_replay::input::LoggingSink;
//!
//! # async fn demo() -> macro_replay::Result<()> {
//! let mut controller = MacroController::new(EngineConfig::default())?;
//! let _injector = controller.spawn_injector(LoggingSink);
//!
//! controller.signal(ActivationSignal::BeginRecording)?;
//! // ... hook input arrives through controller.handle_input(..)
//! controller.signal(ActivationSignal::StopActive)?;
//! controller.signal(ActivationSignal::BeginPlayback)?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{EngineConfig, HotkeyConfig};
use crate::error::Result;
use crate::humanize::Humanizer;
use crate::input::{InputAction, InputSink, RawInput};
use crate::player::{PlaybackReport, Player, PlayerEvent};
use crate::recorder::Recorder;
use crate::recording::{Recording, RecordingId};
use crate::storage::RecordingStore;
use crate::types::{Hotkey, HotkeyModifiers};

/// The three named triggers a hotkey can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationSignal {
    /// Start a new recording.
    BeginRecording,
    /// Stop the recording or playback in progress.
    StopActive,
    /// Play the selected recording.
    BeginPlayback,
}

/// Maps hotkeys to activation signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyMap {
    bindings: Vec<(Hotkey, ActivationSignal)>,
}

impl HotkeyMap {
    /// Build a map from configuration.
    #[must_use]
    pub fn from_config(config: &HotkeyConfig) -> Self {
        Self {
            bindings: vec![
                (config.record, ActivationSignal::BeginRecording),
                (config.stop, ActivationSignal::StopActive),
                (config.play, ActivationSignal::BeginPlayback),
            ],
        }
    }

    /// Resolve a key press to a signal.
    #[must_use]
    pub fn resolve(&self, code: u32, modifiers: HotkeyModifiers) -> Option<ActivationSignal> {
        self.bindings
            .iter()
            .find(|(hotkey, _)| hotkey.matches(code, modifiers))
            .map(|(_, signal)| *signal)
    }

    /// The hotkey bound to a signal.
    #[must_use]
    pub fn hotkey_for(&self, signal: ActivationSignal) -> Option<Hotkey> {
        self.bindings
            .iter()
            .find(|(_, s)| *s == signal)
            .map(|(hotkey, _)| *hotkey)
    }
}

impl Default for HotkeyMap {
    fn default() -> Self {
        Self::from_config(&HotkeyConfig::default())
    }
}

/// What a signal did.
#[derive(Debug)]
pub enum SignalOutcome {
    /// The signal did not apply in the current state.
    Ignored,
    /// A recording session began.
    RecordingStarted,
    /// The recording was stopped, saved, and selected at the head of the library.
    RecordingSaved,
    /// Playback was asked to stop.
    PlaybackStopRequested,
    /// Playback was spawned; the handle resolves when it ends.
    PlaybackSpawned(JoinHandle<Result<PlaybackReport>>),
}

/// Coordinates recording, playback and the saved library.
#[derive(Debug)]
pub struct MacroController {
    config: EngineConfig,
    recorder: Arc<Recorder>,
    player: Arc<Player>,
    store: RecordingStore,
    hotkeys: HotkeyMap,
    library: Vec<Recording>,
    selected: Option<usize>,
    playing: Option<RecordingId>,
}

impl MacroController {
    /// Create a controller and load the saved library.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the storage
    /// directory cannot be listed. Individual corrupt files are skipped.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let store = RecordingStore::from_config(&config.storage);
        let library = store.load_all()?;
        tracing::info!(
            path = %store.directory().display(),
            recordings = library.len(),
            "Controller ready"
        );

        Ok(Self {
            recorder: Arc::new(Recorder::from_config(&config.recording)),
            player: Arc::new(Player::new()),
            hotkeys: HotkeyMap::from_config(&config.hotkeys),
            store,
            library,
            selected: None,
            playing: None,
            config,
        })
    }

    /// The recorder. Clone the `Arc` to feed it from a hook thread.
    #[must_use]
    pub const fn recorder(&self) -> &Arc<Recorder> {
        &self.recorder
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Arc<Player> {
        &self.player
    }

    /// The store backing the library.
    #[must_use]
    pub const fn store(&self) -> &RecordingStore {
        &self.store
    }

    /// The hotkey bindings.
    #[must_use]
    pub const fn hotkeys(&self) -> &HotkeyMap {
        &self.hotkeys
    }

    /// Saved recordings, most recent first.
    #[must_use]
    pub fn library(&self) -> &[Recording] {
        &self.library
    }

    /// Forward hook input to the recorder.
    pub fn handle_input(&self, input: RawInput) {
        self.recorder.handle(input);
    }

    /// Resolve a key press against the hotkeys and act on it.
    ///
    /// Returns `Ok(None)` if the key is not bound.
    pub fn handle_hotkey(
        &mut self,
        code: u32,
        modifiers: HotkeyModifiers,
    ) -> Result<Option<SignalOutcome>> {
        match self.hotkeys.resolve(code, modifiers) {
            Some(signal) => self.signal(signal).map(Some),
            None => Ok(None),
        }
    }

    /// Act on an activation signal.
    ///
    /// `BeginPlayback` spawns onto the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if a stopped recording cannot be saved. The
    /// recording is still added to the library in that case.
    pub fn signal(&mut self, signal: ActivationSignal) -> Result<SignalOutcome> {
        tracing::debug!(?signal, "Activation signal");
        match signal {
            ActivationSignal::BeginRecording => self.begin_recording(),
            ActivationSignal::StopActive => self.stop_active(),
            ActivationSignal::BeginPlayback => Ok(self.begin_playback()),
        }
    }

    fn begin_recording(&self) -> Result<SignalOutcome> {
        if self.recorder.is_active() || self.player.is_playing() {
            return Ok(SignalOutcome::Ignored);
        }
        let name = format!(
            "{} {}",
            self.config.recording.default_name,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.recorder.start(Some(&name))?;
        Ok(SignalOutcome::RecordingStarted)
    }

    fn stop_active(&mut self) -> Result<SignalOutcome> {
        if self.recorder.is_active() {
            let mut recording = self.recorder.stop()?;
            let name = self.unused_name(&recording.name);
            recording.rename(name);
            let playback = &self.config.playback;
            recording.playback_speed = playback.clamp_speed(playback.default_speed);
            recording.set_loop_count(playback.default_loop_count);

            self.library.insert(0, recording);
            self.selected = Some(0);
            self.store.save(&mut self.library[0])?;
            return Ok(SignalOutcome::RecordingSaved);
        }
        if self.player.is_playing() {
            self.player.stop();
            return Ok(SignalOutcome::PlaybackStopRequested);
        }
        Ok(SignalOutcome::Ignored)
    }

    /// `base`, or `base (N)` if a saved file or library entry already
    /// uses that file name.
    fn unused_name(&self, base: &str) -> String {
        let taken = |name: &str| {
            let path = self.store.path_for_name(name);
            path.exists() || self.library.iter().any(|r| self.store.path_for(r) == path)
        };
        let mut name = base.to_string();
        let mut n = 2;
        while taken(&name) {
            name = format!("{base} ({n})");
            n += 1;
        }
        name
    }

    fn begin_playback(&mut self) -> SignalOutcome {
        if self.player.is_playing() || self.recorder.is_active() {
            return SignalOutcome::Ignored;
        }
        let Some(selected) = self.selected() else {
            tracing::debug!("No recording selected");
            return SignalOutcome::Ignored;
        };

        let id = selected.id;
        let recording = if selected.humanization_level > 0.0 {
            Humanizer::new(selected.humanization_level).humanize_recording(selected)
        } else {
            selected.clone()
        };
        self.playing = Some(id);
        let player = Arc::clone(&self.player);
        let handle = tokio::spawn(async move { player.play(&recording).await });
        SignalOutcome::PlaybackSpawned(handle)
    }

    /// Select a library entry. Out-of-range indices clear the selection.
    pub fn select(&mut self, index: usize) -> Option<&Recording> {
        self.selected = (index < self.library.len()).then_some(index);
        self.selected()
    }

    /// The selected recording.
    #[must_use]
    pub fn selected(&self) -> Option<&Recording> {
        self.selected.and_then(|i| self.library.get(i))
    }

    /// Index of the selected recording.
    #[must_use]
    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Set the selected recording's speed, clamped to the configured range.
    ///
    /// If the selected recording is the one playing, the running playback
    /// picks the new speed up from its next event. Returns the applied
    /// speed, or `None` when nothing is selected.
    pub fn set_selected_speed(&mut self, speed: f64) -> Option<f64> {
        let speed = self.config.playback.clamp_speed(speed);
        let index = self.selected?;
        let recording = self.library.get_mut(index)?;
        recording.playback_speed = speed;

        if self.playing == Some(recording.id) && self.player.set_speed(speed).is_ok() {
            tracing::debug!(recording.id = %recording.id, speed, "Live speed change");
        }
        Some(speed)
    }

    /// Set the selected recording's loop count.
    pub fn set_selected_loop_count(&mut self, loop_count: u32) -> bool {
        let Some(recording) = self.selected.and_then(|i| self.library.get_mut(i)) else {
            return false;
        };
        recording.set_loop_count(loop_count);
        true
    }

    /// Save the selected recording.
    pub fn save_selected(&mut self) -> Result<bool> {
        let Some(recording) = self.selected.and_then(|i| self.library.get_mut(i)) else {
            return Ok(false);
        };
        self.store.save(recording)?;
        Ok(true)
    }

    /// Delete the selected recording from disk and the library.
    pub fn delete_selected(&mut self) -> Result<Option<Recording>> {
        let Some(index) = self.selected.filter(|i| *i < self.library.len()) else {
            return Ok(None);
        };
        self.store.delete(&self.library[index])?;
        self.selected = None;
        Ok(Some(self.library.remove(index)))
    }

    /// Import a recording file and put it at the head of the library.
    pub fn import(&mut self, source: &Path) -> Result<Option<&Recording>> {
        let Some(recording) = self.store.import(source)? else {
            return Ok(None);
        };
        self.library.insert(0, recording);
        self.selected = self.selected.map(|i| i + 1);
        Ok(self.library.first())
    }

    /// Export the selected recording.
    pub fn export_selected(&self, destination: &Path) -> Result<bool> {
        let Some(recording) = self.selected() else {
            return Ok(false);
        };
        self.store.export(recording, destination)?;
        Ok(true)
    }

    /// Library entries whose name or description contains `text`,
    /// ignoring case.
    #[must_use]
    pub fn search(&self, text: &str) -> Vec<&Recording> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.library.iter().collect();
        }
        self.library
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Drain the player's simulate-input requests into a sink.
    ///
    /// Runs on a background task until the player is dropped. Sink errors
    /// are logged and do not interrupt playback.
    pub fn spawn_injector<S>(&self, sink: S) -> JoinHandle<()>
    where
        S: InputSink + 'static,
    {
        let mut rx = self.player.subscribe();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let PlayerEvent::SimulateInput(event) = event {
                    let action = InputAction::from(&event);
                    if let Err(e) = sink.inject(&action) {
                        tracing::warn!(error = %e, ?action, "Input injection failed");
                    }
                }
            }
        })
    }
}
