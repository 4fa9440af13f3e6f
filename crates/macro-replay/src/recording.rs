//! Recordings: a named, taggable sequence of events plus replay settings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MacroError, Result, check_speed};
use crate::event::MacroEvent;
use crate::types::{Hotkey, HotkeyModifiers};

/// Name given to recordings when the caller does not provide one.
pub const DEFAULT_RECORDING_NAME: &str = "New Macro";

/// Suffix appended to the name of a cloned recording.
pub const COPY_SUFFIX: &str = " (Copy)";

/// Globally unique recording identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingId(Uuid);

impl RecordingId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, ordered sequence of events plus replay metadata.
///
/// Events are appended only by the [`Recorder`](crate::Recorder) that owns
/// the recording while a session is active. Afterwards only metadata
/// changes; the event sequence is replaced wholesale only by loading,
/// importing or cloning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Unique identifier.
    pub id: RecordingId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Tags for categorization.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the recording was created.
    pub created_at: DateTime<Utc>,
    /// When the recording was last modified.
    pub modified_at: DateTime<Utc>,
    events: Vec<MacroEvent>,
    /// Playback speed multiplier (1.0 = real time).
    #[serde(default = "default_speed")]
    pub playback_speed: f64,
    /// Number of passes (0 = repeat until cancelled).
    #[serde(default = "default_loop_count")]
    pub loop_count: u32,
    /// Humanization level in `[0.0, 1.0]`.
    #[serde(default)]
    pub humanization_level: f64,
    /// Bound hotkey virtual key code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey_code: Option<u32>,
    /// Bound hotkey modifier bits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey_modifiers: Option<u32>,
}

const fn default_speed() -> f64 {
    1.0
}

const fn default_loop_count() -> u32 {
    1
}

impl Recording {
    /// Create an empty recording with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RecordingId::new(),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            created_at: now,
            modified_at: now,
            events: Vec::new(),
            playback_speed: default_speed(),
            loop_count: default_loop_count(),
            humanization_level: 0.0,
            hotkey_code: None,
            hotkey_modifiers: None,
        }
    }

    /// Create a recording around an existing event sequence.
    ///
    /// Timestamps must already be non-decreasing; they are taken as-is.
    #[must_use]
    pub fn from_events(name: impl Into<String>, events: Vec<MacroEvent>) -> Self {
        Self {
            events,
            ..Self::new(name)
        }
    }

    /// The recorded events in append order.
    #[must_use]
    pub fn events(&self) -> &[MacroEvent] {
        &self.events
    }

    /// Number of events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Whether the recording has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Largest event timestamp in milliseconds, 0 when empty.
    #[must_use]
    pub fn total_duration(&self) -> f64 {
        self.events
            .iter()
            .map(|e| e.timestamp)
            .fold(0.0, f64::max)
    }

    pub(crate) fn push_event(&mut self, event: MacroEvent) {
        self.events.push(event);
    }

    /// Build a copy identity carrying a different event sequence.
    #[must_use]
    pub fn with_events(&self, events: Vec<MacroEvent>) -> Self {
        let mut copy = self.clone_as_copy();
        copy.events = events;
        copy
    }

    /// Clone under a new identity.
    ///
    /// The clone gets a fresh id, a `" (Copy)"` name suffix and fresh
    /// timestamps; its events are structurally identical.
    #[must_use]
    pub fn clone_as_copy(&self) -> Self {
        let now = Utc::now();
        Self {
            id: RecordingId::new(),
            name: format!("{}{COPY_SUFFIX}", self.name),
            created_at: now,
            modified_at: now,
            ..self.clone()
        }
    }

    /// Give an imported recording a new identity, keeping its name.
    pub(crate) fn reissue(&mut self) {
        let now = Utc::now();
        self.id = RecordingId::new();
        self.created_at = now;
        self.modified_at = now;
    }

    /// Mark the recording as modified now.
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Rename the recording.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Add a tag if it is not already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Remove a tag. Returns whether it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Set the playback speed multiplier.
    pub fn set_playback_speed(&mut self, speed: f64) -> Result<()> {
        self.playback_speed = check_speed(speed)?;
        Ok(())
    }

    /// Set the loop count (0 = repeat until cancelled).
    pub const fn set_loop_count(&mut self, loop_count: u32) {
        self.loop_count = loop_count;
    }

    /// Set the humanization level, clamped to `[0.0, 1.0]`.
    pub fn set_humanization_level(&mut self, level: f64) {
        self.humanization_level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
    }

    /// Bind or clear the recording's hotkey.
    pub fn set_hotkey(&mut self, hotkey: Option<Hotkey>) {
        self.hotkey_code = hotkey.map(|h| h.code);
        self.hotkey_modifiers = hotkey.map(|h| h.modifiers.bits());
    }

    /// The bound hotkey, if any.
    #[must_use]
    pub fn hotkey(&self) -> Option<Hotkey> {
        self.hotkey_code.map(|code| {
            Hotkey::new(code).with_modifiers(HotkeyModifiers::from_bits_truncate(
                self.hotkey_modifiers.unwrap_or(0),
            ))
        })
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| MacroError::serialization(format!("serializing '{}'", self.name), e))
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MacroError::serialization(format!("serializing '{}'", self.name), e))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MacroError::serialization("parsing recording", e))
    }
}

impl Default for Recording {
    fn default() -> Self {
        Self::new(DEFAULT_RECORDING_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, MouseButton};

    fn sample() -> Recording {
        let mut recording = Recording::new("login");
        recording.push_event(MacroEvent::pointer_move(1, 2, 0.0));
        recording.push_event(MacroEvent::button(
            EventKind::ButtonDown(MouseButton::Left),
            1,
            2,
            16.5,
        ));
        recording.push_event(MacroEvent::key(EventKind::KeyDown, 13, 40.25));
        recording
    }

    #[test]
    fn derived_fields() {
        let recording = sample();
        assert_eq!(recording.event_count(), 3);
        assert!((recording.total_duration() - 40.25).abs() < f64::EPSILON);

        let empty = Recording::default();
        assert_eq!(empty.event_count(), 0);
        assert_eq!(empty.total_duration(), 0.0);
        assert_eq!(empty.name, DEFAULT_RECORDING_NAME);
    }

    #[test]
    fn clone_as_copy_gets_new_identity() {
        let original = sample();
        let copy = original.clone_as_copy();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "login (Copy)");
        assert_eq!(copy.events(), original.events());
        assert!(copy.created_at >= original.created_at);
    }

    #[test]
    fn metadata_edits_leave_events_alone() {
        let mut recording = sample();
        let events = recording.events().to_vec();

        recording.rename("renamed");
        recording.set_description("does things");
        recording.add_tag("work");
        recording.add_tag("work");
        recording.set_loop_count(0);
        recording.set_humanization_level(3.0);
        recording.set_playback_speed(2.0).unwrap();

        assert_eq!(recording.tags, vec!["work".to_string()]);
        assert!(recording.remove_tag("work"));
        assert!(!recording.remove_tag("work"));
        assert_eq!(recording.humanization_level, 1.0);
        assert_eq!(recording.events(), events.as_slice());
    }

    #[test]
    fn rejects_non_positive_speed() {
        let mut recording = sample();
        assert!(recording.set_playback_speed(0.0).is_err());
        assert!(recording.set_playback_speed(-1.0).is_err());
        assert_eq!(recording.playback_speed, 1.0);
    }

    #[test]
    fn hotkey_binding() {
        let mut recording = sample();
        assert!(recording.hotkey().is_none());

        let key = Hotkey::new(0x41).with_modifiers(HotkeyModifiers::CONTROL);
        recording.set_hotkey(Some(key));
        assert_eq!(recording.hotkey_code, Some(0x41));
        assert_eq!(recording.hotkey_modifiers, Some(2));
        assert_eq!(recording.hotkey(), Some(key));

        recording.set_hotkey(None);
        assert!(recording.hotkey_modifiers.is_none());
    }

    #[test]
    fn json_uses_documented_field_names() {
        let recording = sample();
        let json = recording.to_json().unwrap();
        for field in [
            "\"id\"",
            "\"createdAt\"",
            "\"modifiedAt\"",
            "\"events\"",
            "\"playbackSpeed\"",
            "\"loopCount\"",
            "\"humanizationLevel\"",
            "\"keyCode\"",
            "\"wheelDelta\"",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
        assert!(!json.contains("totalDuration"));
        assert!(!json.contains("eventCount"));
        assert!(!json.contains("hotkeyCode"));
    }

    #[test]
    fn json_defaults_for_missing_settings() {
        let json = r#"{
            "id": "4f1c1b2e-8d55-4a43-9f3c-2f0b9b1e6a10",
            "name": "minimal",
            "createdAt": "2024-01-01T00:00:00Z",
            "modifiedAt": "2024-01-02T00:00:00Z",
            "events": []
        }"#;
        let recording = Recording::from_json(json).unwrap();
        assert_eq!(recording.playback_speed, 1.0);
        assert_eq!(recording.loop_count, 1);
        assert!(recording.tags.is_empty());
    }
}
