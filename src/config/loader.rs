//! Configuration Loader
//!
//! Loads and merges chat settings from the default file locations.

use crate::config::settings::{ChatConfig, ChatSettings};
use crate::error::{ChatError, Result};
use std::path::{Path, PathBuf};

/// Settings loader with support for multiple sources
pub struct ConfigLoader {
    settings: ChatSettings,
}

impl ConfigLoader {
    /// Create a new loader and load from default locations
    pub fn new() -> Result<Self> {
        let mut loader = Self {
            settings: ChatSettings::default(),
        };

        loader.load_from_default_paths()?;

        Ok(loader)
    }

    /// Create a loader with a specific settings file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self {
            settings: ChatSettings::default(),
        };

        loader.load_from_file(path)?;

        Ok(loader)
    }

    /// Load settings from default paths
    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_config_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }

        Ok(())
    }

    /// Get list of settings paths to check, lowest precedence first
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("xfchat").join("config.json"));
        }

        // 2. Current directory
        paths.push(PathBuf::from("xfchat.json"));

        // 3. Environment variable
        if let Ok(custom_path) = std::env::var("XFCHAT_CONFIG_PATH") {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    /// Load settings from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let settings: ChatSettings = serde_json::from_str(&content).map_err(|e| {
            ChatError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "loaded chat settings");
        self.settings.merge(settings);
        Ok(())
    }

    /// Get the loaded settings
    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Build a config from defaults with the loaded settings applied
    pub fn into_config(self) -> ChatConfig {
        let mut config = ChatConfig::default();
        self.settings.apply_to(&mut config);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiVersion;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_custom_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "version": "v2",
                "temperature": 0.9,
                "max_tokens": 6000,
                "top_k": 2,
                "endpoint": "ws://localhost:8080",
                "read_timeout_secs": 45
            }}"#
        )
        .unwrap();

        let config = ConfigLoader::from_path(file.path()).unwrap().into_config();
        assert_eq!(config.version(), ApiVersion::V2);
        assert_eq!(config.temperature(), 0.9);
        assert_eq!(config.max_tokens(), 6000);
        assert_eq!(config.top_k(), 2);
        assert_eq!(config.base_url(), "ws://localhost:8080/v2.1/chat");
        assert_eq!(
            config.read_timeout(),
            Some(std::time::Duration::from_secs(45))
        );
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not json").unwrap();

        let err = ConfigLoader::from_path(file.path()).err().unwrap();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ConfigLoader::from_path("/nonexistent/xfchat.json").err().unwrap();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn test_later_files_override_earlier() {
        let mut first = NamedTempFile::new().unwrap();
        writeln!(first, r#"{{ "temperature": 0.1, "top_k": 2 }}"#).unwrap();
        let mut second = NamedTempFile::new().unwrap();
        writeln!(second, r#"{{ "top_k": 5 }}"#).unwrap();

        let mut loader = ConfigLoader::from_path(first.path()).unwrap();
        loader.load_from_file(second.path()).unwrap();

        assert_eq!(loader.settings().temperature, Some(0.1));
        assert_eq!(loader.settings().top_k, Some(5));
    }
}
