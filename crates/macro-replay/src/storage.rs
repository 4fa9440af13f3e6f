//! Saved recordings on disk.
//!
//! Each recording is one pretty-printed JSON document named after the
//! recording, e.g. `SavedMacros/Login form.macro`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::{MacroError, Result};
use crate::recording::Recording;

/// Characters replaced by `_` in file names.
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace characters that are not valid in a file name with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_control() || INVALID_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// A directory of saved recordings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStore {
    directory: PathBuf,
    extension: String,
}

impl RecordingStore {
    /// Create a store for a directory using the default extension.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::from_config(&StorageConfig::new(directory))
    }

    /// Create a store from configuration.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
        }
    }

    /// The directory holding saved recordings.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The path a recording is saved under.
    #[must_use]
    pub fn path_for(&self, recording: &Recording) -> PathBuf {
        self.path_for_name(&recording.name)
    }

    /// The path a recording with this name is saved under.
    #[must_use]
    pub fn path_for_name(&self, name: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{}", sanitize_file_name(name), self.extension))
    }

    fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.directory).map_err(|e| {
            MacroError::io_context(format!("creating {}", self.directory.display()), e)
        })
    }

    /// Save a recording, replacing any file with the same name.
    ///
    /// Updates `modified_at` before writing. Returns the written path.
    pub fn save(&self, recording: &mut Recording) -> Result<PathBuf> {
        self.ensure_directory()?;
        recording.touch();
        let path = self.path_for(recording);
        write_json(recording, &path)?;
        tracing::info!(
            recording.id = %recording.id,
            path = %path.display(),
            events = recording.event_count(),
            "Saved recording"
        );
        Ok(path)
    }

    /// Load a recording by file name within the directory.
    ///
    /// Returns `Ok(None)` if the file does not exist and
    /// [`MacroError::InvalidFileName`] if `file_name` is not a plain file
    /// name (separators, `..` and absolute paths are rejected).
    pub fn load(&self, file_name: &str) -> Result<Option<Recording>> {
        if !is_plain_file_name(file_name) {
            return Err(MacroError::InvalidFileName {
                name: file_name.to_string(),
            });
        }
        let path = self.directory.join(file_name);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Load a recording by its name rather than its file name.
    pub fn load_named(&self, name: &str) -> Result<Recording> {
        let file_name = format!("{}.{}", sanitize_file_name(name), self.extension);
        self.load(&file_name)?
            .ok_or_else(|| MacroError::RecordingNotFound {
                name: name.to_string(),
            })
    }

    /// Load every saved recording, newest modification first.
    ///
    /// Files that cannot be read or parsed are skipped with a warning.
    /// A missing directory yields an empty list.
    pub fn load_all(&self) -> Result<Vec<Recording>> {
        if !self.directory.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.directory).map_err(|e| {
            MacroError::io_context(format!("listing {}", self.directory.display()), e)
        })?;

        let mut recordings = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !self.has_extension(&path) || !path.is_file() {
                continue;
            }
            match read_json(&path) {
                Ok(recording) => recordings.push(recording),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping saved recording");
                }
            }
        }

        recordings.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        tracing::debug!(
            path = %self.directory.display(),
            count = recordings.len(),
            "Loaded saved recordings"
        );
        Ok(recordings)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension)
    }

    /// Delete a recording's file. Returns whether a file was removed.
    pub fn delete(&self, recording: &Recording) -> Result<bool> {
        let path = self.path_for(recording);
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .map_err(|e| MacroError::io_context(format!("deleting {}", path.display()), e))?;
        tracing::info!(recording.id = %recording.id, path = %path.display(), "Deleted recording");
        Ok(true)
    }

    /// Write a recording to an arbitrary path.
    pub fn export(&self, recording: &Recording, destination: &Path) -> Result<()> {
        write_json(recording, destination)?;
        tracing::info!(
            recording.id = %recording.id,
            path = %destination.display(),
            "Exported recording"
        );
        Ok(())
    }

    /// Import a recording file into the store.
    ///
    /// The recording gets a fresh id and timestamps, then is saved.
    /// Returns `Ok(None)` if the source does not exist.
    pub fn import(&self, source: &Path) -> Result<Option<Recording>> {
        if !source.is_file() {
            return Ok(None);
        }
        let mut recording = read_json(source)?;
        recording.reissue();
        self.save(&mut recording)?;
        Ok(Some(recording))
    }
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::from_config(&StorageConfig::default())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn write_json(recording: &Recording, path: &Path) -> Result<()> {
    let json = recording.to_json_pretty()?;
    fs::write(path, json)
        .map_err(|e| MacroError::io_context(format!("writing {}", path.display()), e))
}

fn read_json(path: &Path) -> Result<Recording> {
    let json = fs::read_to_string(path)
        .map_err(|e| MacroError::io_context(format!("reading {}", path.display()), e))?;
    serde_json::from_str(&json)
        .map_err(|e| MacroError::serialization(format!("parsing {}", path.display()), e))
}
