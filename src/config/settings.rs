//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and log data, and the
//! optional JSON settings file that supplies scan defaults.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portsweep)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/portsweep)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Locate the platform directories. Nothing is created on disk.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "portsweep", "portsweep")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
            data_dir: project.data_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the default log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Upper bound on worker threads.
    pub threads: usize,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Banner read/write timeout in milliseconds.
    pub banner_timeout_ms: u64,
    /// Grab banners from open ports.
    pub grab_banners: bool,
    /// Idle worker poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Default log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Directory for the log file. Defaults to the XDG data directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            threads: 100,
            connect_timeout_ms: 1000,
            banner_timeout_ms: 500,
            grab_banners: true,
            poll_interval_ms: 1000,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults
    /// when no settings file exists.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.settings_file();
        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_millis(self.banner_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.threads, 100);
        assert_eq!(settings.connect_timeout(), Duration::from_secs(1));
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert!(settings.grab_banners);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = AppSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(&file, r#"{ "threads": 16, "grab_banners": false }"#).unwrap();

        let settings = AppSettings::load_from(&file).unwrap();
        assert_eq!(settings.threads, 16);
        assert!(!settings.grab_banners);
        assert_eq!(settings.connect_timeout_ms, 1000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            threads: 32,
            log_dir: Some(dir.path().join("logs")),
            ..AppSettings::default()
        };

        settings.save_to(&file).unwrap();
        assert_eq!(AppSettings::load_from(&file).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let result = AppSettings::load_from(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }

    #[test]
    fn test_malformed_file_is_format_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(&file, "{ threads: ").unwrap();
        assert!(matches!(
            AppSettings::load_from(&file),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_load_without_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = Paths {
            config_dir: dir.path().join("config"),
            data_dir: dir.path().join("data"),
        };
        assert_eq!(AppSettings::load(&paths).unwrap(), AppSettings::default());
        assert_eq!(paths.log_dir(), dir.path().join("data").join("logs"));
    }
}
