//! jobql Settings
//!
//! Persisted settings for the editor and the job runner:
//! - Editor settings (validation delay)
//! - Job settings (poll interval, error reset delay, job config, backend endpoint)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobqlSettings {
    pub editor: EditorSettings,
    pub jobs: JobSettings,
}

impl JobqlSettings {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::info!(?path, "settings saved");
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(config_dir.join("jobql").join("settings.json"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Quiet period after the last keystroke before a dry run
    pub validation_delay_ms: u64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            validation_delay_ms: 1500,
        }
    }
}

impl EditorSettings {
    pub fn validation_delay(&self) -> Duration {
        Duration::from_millis(self.validation_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub poll_interval_ms: u64,
    /// How long a failed run shows its error before the button resets
    pub error_reset_ms: u64,
    /// Passed through to the backend with every request
    pub job_config: serde_json::Value,
    pub endpoint: String,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            error_reset_ms: 2000,
            job_config: serde_json::json!({}),
            endpoint: "http://127.0.0.1:8080".to_string(),
        }
    }
}

impl JobSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_reset_delay(&self) -> Duration {
        Duration::from_millis(self.error_reset_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = JobqlSettings::default();
        assert_eq!(settings.editor.validation_delay(), Duration::from_millis(1500));
        assert_eq!(settings.jobs.poll_interval(), Duration::from_millis(2000));
        assert_eq!(settings.jobs.error_reset_delay(), Duration::from_millis(2000));
        assert_eq!(settings.jobs.job_config, serde_json::json!({}));
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = JobqlSettings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(loaded, JobqlSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = JobqlSettings::default();
        settings.jobs.poll_interval_ms = 500;
        settings.jobs.job_config = serde_json::json!({"location": "EU"});
        settings.save_to(&path).unwrap();

        assert_eq!(JobqlSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"jobs": {"endpoint": "http://jobs.internal"}}"#).unwrap();

        let loaded = JobqlSettings::load_from(&path).unwrap();
        assert_eq!(loaded.jobs.endpoint, "http://jobs.internal");
        assert_eq!(loaded.jobs.poll_interval_ms, 2000);
        assert_eq!(loaded.editor, EditorSettings::default());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JobqlSettings::load_from(&path).is_err());
    }
}
