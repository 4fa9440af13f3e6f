//! Environment-based configuration.

use std::collections::HashMap;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "MACRO";

/// Environment variable reader.
///
/// Values are snapshotted when the reader is created, so lookups never race
/// with later changes to the process environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Captured values, keyed by full variable name.
    values: HashMap<String, String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Capture the process environment under a prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Build a reader from an explicit set of variables.
    #[must_use]
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let prefix = prefix.into().to_uppercase();
        let wanted = format!("{prefix}_");
        let values = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| prefix.is_empty() || k.starts_with(&wanted))
            .collect();
        Self { prefix, values }
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.values.get(&self.var_name(name)).cloned()
    }

    /// Get a string value with default.
    #[must_use]
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Get a parsed value.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Check if a variable is set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of captured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Recognised variable names, without the prefix.
pub mod vars {
    /// Default playback speed.
    pub const PLAYBACK_SPEED: &str = "PLAYBACK_SPEED";
    /// Default loop count.
    pub const LOOP_COUNT: &str = "LOOP_COUNT";
    /// Storage directory.
    pub const STORAGE_DIR: &str = "STORAGE_DIR";
    /// Log filter directive.
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    /// Log format.
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}
