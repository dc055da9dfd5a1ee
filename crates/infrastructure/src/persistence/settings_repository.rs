//! Evaluator settings persistence.
//!
//! Settings live in the platform-specific config directory unless an
//! explicit path is given:
//! - Linux: ~/.config/vareval/settings.json
//! - macOS: ~/Library/Application Support/vareval/settings.json
//! - Windows: %APPDATA%/vareval/settings.json

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;
use vareval_domain::EvaluatorSettings;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for evaluator settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl SettingsRepository {
    /// Creates a repository using the default settings location.
    #[must_use]
    pub const fn new() -> Self {
        Self { path: None }
    }

    /// Creates a repository reading and writing `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns the default settings file path, if a config directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vareval").join("settings.json"))
    }

    /// Returns the path used by this repository.
    #[must_use]
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(Self::default_path)
    }

    /// Loads settings from disk.
    ///
    /// Returns default settings if the file doesn't exist. Missing fields
    /// take their default values.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<EvaluatorSettings, SettingsError> {
        let Some(path) = self.settings_path() else {
            return Ok(EvaluatorSettings::default());
        };

        if !fs::try_exists(&path).await? {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(EvaluatorSettings::default());
        }

        let content = fs::read(&path).await?;
        let settings = from_json_bytes(&content)?;
        Ok(settings)
    }

    /// Saves settings to disk, creating the parent directory if needed.
    ///
    /// # Errors
    /// Returns an error if no location is available or the write fails.
    pub async fn save(&self, settings: &EvaluatorSettings) -> Result<(), SettingsError> {
        let path = self.settings_path().ok_or(SettingsError::NoConfigDir)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(settings)?;
        fs::write(&path, content).await?;
        Ok(())
    }
}
