//! Configuration types for macro-replay.
//!
//! An [`EngineConfig`] groups the settings for recording, playback,
//! storage, logging and hotkeys. It can be loaded from a TOML or JSON file
//! (see [`file`]) and overridden from `MACRO_*` environment variables (see
//! [`env`]).

pub mod env;
pub mod file;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MacroError, Result};
use crate::recording::DEFAULT_RECORDING_NAME;
use crate::types::{Hotkey, VK_F6, VK_F7, VK_F8};

pub use env::EnvConfig;
pub use file::{ConfigFormat, ConfigLoader};

/// Default playback speed multiplier.
pub const DEFAULT_SPEED: f64 = 1.0;

/// Default number of playback passes.
pub const DEFAULT_LOOP_COUNT: u32 = 1;

/// Default directory for saved recordings.
pub const DEFAULT_STORAGE_DIR: &str = "SavedMacros";

/// Default file extension for saved recordings.
pub const DEFAULT_EXTENSION: &str = "macro";

/// Lowest accepted playback speed.
pub const MIN_SPEED: f64 = 0.1;

/// Highest accepted playback speed.
pub const MAX_SPEED: f64 = 10.0;

/// Default log filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Recording settings.
    pub recording: RecordingConfig,
    /// Playback settings.
    pub playback: PlaybackConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Hotkey bindings.
    pub hotkeys: HotkeyConfig,
}

impl EngineConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        let speed = self.playback.default_speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(MacroError::config(format!(
                "playback.default_speed must be positive, got {speed}"
            )));
        }
        let PlaybackConfig {
            min_speed,
            max_speed,
            ..
        } = self.playback;
        if !(min_speed > 0.0 && min_speed <= max_speed && max_speed.is_finite()) {
            return Err(MacroError::config(format!(
                "playback speed range [{min_speed}, {max_speed}] is invalid"
            )));
        }
        if speed < min_speed || speed > max_speed {
            return Err(MacroError::config(format!(
                "playback.default_speed {speed} is outside [{min_speed}, {max_speed}]"
            )));
        }
        if self.storage.extension.trim_start_matches('.').is_empty() {
            return Err(MacroError::config("storage.extension must not be empty"));
        }
        if self.recording.max_events == Some(0) {
            return Err(MacroError::config("recording.max_events must be at least 1"));
        }
        Ok(())
    }

    /// Override values from environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(raw) = env.get(env::vars::PLAYBACK_SPEED) {
            match raw.parse::<f64>() {
                Ok(speed) => self.playback.default_speed = speed,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid playback speed override"),
            }
        }
        if let Some(raw) = env.get(env::vars::LOOP_COUNT) {
            match raw.parse::<u32>() {
                Ok(count) => self.playback.default_loop_count = count,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid loop count override"),
            }
        }
        if let Some(dir) = env.get(env::vars::STORAGE_DIR) {
            self.storage.directory = PathBuf::from(dir);
        }
        if let Some(level) = env.get(env::vars::LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(raw) = env.get(env::vars::LOG_FORMAT) {
            match raw.parse::<LogFormat>() {
                Ok(format) => self.logging.format = format,
                Err(e) => tracing::warn!(value = %raw, error = %e, "Ignoring invalid log format override"),
            }
        }
    }
}

/// Configuration for the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Name given to recordings started without one.
    pub default_name: String,
    /// Stop accepting events after this many.
    pub max_events: Option<usize>,
    /// Stop accepting events after this many milliseconds.
    pub max_duration_ms: Option<f64>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_RECORDING_NAME.to_string(),
            max_events: None,
            max_duration_ms: None,
        }
    }
}

impl RecordingConfig {
    /// Set the default recording name.
    #[must_use]
    pub fn default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// Set the maximum number of events.
    #[must_use]
    pub const fn max_events(mut self, count: usize) -> Self {
        self.max_events = Some(count);
        self
    }

    /// Set the maximum recording duration in milliseconds.
    #[must_use]
    pub const fn max_duration_ms(mut self, ms: f64) -> Self {
        self.max_duration_ms = Some(ms);
        self
    }
}

/// Configuration for playback defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Speed applied to newly recorded recordings.
    pub default_speed: f64,
    /// Loop count applied to newly recorded recordings.
    pub default_loop_count: u32,
    /// Lowest speed a recording may be given.
    pub min_speed: f64,
    /// Highest speed a recording may be given.
    pub max_speed: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_speed: DEFAULT_SPEED,
            default_loop_count: DEFAULT_LOOP_COUNT,
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
        }
    }
}

impl PlaybackConfig {
    /// Set the default speed.
    #[must_use]
    pub const fn default_speed(mut self, speed: f64) -> Self {
        self.default_speed = speed;
        self
    }

    /// Set the default loop count.
    #[must_use]
    pub const fn default_loop_count(mut self, count: u32) -> Self {
        self.default_loop_count = count;
        self
    }

    /// Set the accepted speed range.
    #[must_use]
    pub const fn speed_range(mut self, min: f64, max: f64) -> Self {
        self.min_speed = min;
        self.max_speed = max;
        self
    }

    /// Clamp a speed into the accepted range.
    #[must_use]
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            return self.default_speed;
        }
        speed.max(self.min_speed).min(self.max_speed)
    }
}

/// Configuration for saved recordings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding saved recordings.
    pub directory: PathBuf,
    /// File extension, without the dot.
    pub extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_STORAGE_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl StorageConfig {
    /// Create a storage configuration for a directory.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// Set the file extension.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Configuration for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `macro_replay=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter directive.
    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the log format.
    #[must_use]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(MacroError::config(format!("unknown log format '{other}'"))),
        }
    }
}

/// Hotkeys for the three activation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Begin recording.
    pub record: Hotkey,
    /// Stop the active operation.
    pub stop: Hotkey,
    /// Begin playback of the selected recording.
    pub play: Hotkey,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            record: Hotkey::new(VK_F6),
            stop: Hotkey::new(VK_F7),
            play: Hotkey::new(VK_F8),
        }
    }
}
