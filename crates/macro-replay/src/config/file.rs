//! File-based configuration loading.

use std::path::{Path, PathBuf};

use super::EngineConfig;
use crate::error::{MacroError, Result};

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect format from path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    const fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// Parse a TOML document. Missing keys take their defaults.
pub fn from_toml_str(content: &str) -> Result<EngineConfig> {
    toml::from_str(content).map_err(|e| MacroError::config(format!("invalid TOML: {e}")))
}

/// Parse a JSON document. Missing keys take their defaults.
pub fn from_json_str(content: &str) -> Result<EngineConfig> {
    serde_json::from_str(content)
        .map_err(|e| MacroError::config(format!("invalid JSON: {e}")))
}

/// Parse content in the given format.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<EngineConfig> {
    match format {
        ConfigFormat::Toml => from_toml_str(content),
        ConfigFormat::Json => from_json_str(content),
    }
}

/// Load a config file, detecting the format from its extension.
pub fn load(path: &Path) -> Result<EngineConfig> {
    ConfigLoader::new().load(path)
}

/// Configuration file loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Search paths.
    search_paths: Vec<PathBuf>,
    /// Format used when the extension is unknown.
    default_format: Option<ConfigFormat>,
}

impl ConfigLoader {
    /// Create a new loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a search path.
    #[must_use]
    pub fn add_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Set default format.
    #[must_use]
    pub const fn with_format(mut self, format: ConfigFormat) -> Self {
        self.default_format = Some(format);
        self
    }

    /// Find a config file by name in the search paths.
    ///
    /// The exact name is tried first, then `name.toml` and `name.json`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        for search_path in &self.search_paths {
            let path = search_path.join(name);
            if path.is_file() {
                return Some(path);
            }

            for format in [ConfigFormat::Toml, ConfigFormat::Json] {
                let path = search_path.join(format!("{name}.{}", format.extension()));
                if path.is_file() {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Load a config file.
    pub fn load(&self, path: &Path) -> Result<EngineConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MacroError::io_context(format!("reading config {}", path.display()), e)
        })?;

        let format = ConfigFormat::from_path(path)
            .or(self.default_format)
            .ok_or_else(|| {
                MacroError::config(format!("unknown config format: {}", path.display()))
            })?;

        let config = parse_config(&content, format)?;
        tracing::debug!(path = %path.display(), ?format, "Loaded configuration");
        Ok(config)
    }

    /// Load by name (searches paths).
    pub fn load_by_name(&self, name: &str) -> Result<EngineConfig> {
        let path = self
            .find(name)
            .ok_or_else(|| MacroError::config(format!("config file not found: {name}")))?;
        self.load(&path)
    }
}
