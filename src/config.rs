// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for wcagbot

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Which rules run and over which candidates
    #[serde(default)]
    pub audit: AuditConfig,

    /// Live re-scan settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Ignore annotations and the persisted suppression list
    #[serde(default)]
    pub suppression: SuppressionConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Rule toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub check_alt_text: bool,

    #[serde(default = "default_true")]
    pub check_labels: bool,

    #[serde(default = "default_true")]
    pub check_contrast: bool,

    /// Restrict the contrast rule to interactive elements
    #[serde(default)]
    pub interactive_only: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            check_alt_text: true,
            check_labels: true,
            check_contrast: true,
            interactive_only: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Debounced re-scan configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Quiet period after the last mutation before re-scanning
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// `id` of the report UI container; mutations inside it never trigger a re-scan
    #[serde(default)]
    pub ui_root_id: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ui_root_id: None,
        }
    }
}

impl SchedulerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    500
}

/// Suppression configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionConfig {
    /// Attribute holding comma-separated ignore tokens
    #[serde(default = "default_ignore_attribute")]
    pub attribute: String,

    /// Directory for per-host persisted suppression lists
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            attribute: default_ignore_attribute(),
            store_dir: None,
        }
    }
}

fn default_ignore_attribute() -> String {
    crate::suppression::DEFAULT_IGNORE_ATTRIBUTE.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Load configuration from a path. TOML for `.toml` files, YAML otherwise.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    let config: Config = if path.extension().map(|e| e == "toml").unwrap_or(false) {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Get the default config path
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".wcagbot.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.audit.check_alt_text);
        assert!(config.audit.check_labels);
        assert!(config.audit.check_contrast);
        assert!(!config.audit.interactive_only);
        assert_eq!(config.scheduler.debounce(), Duration::from_millis(500));
        assert_eq!(config.suppression.attribute, "data-a11y-ignore");
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [audit]
            interactive_only = true
            check_labels = false

            [scheduler]
            debounce_ms = 250
            "#,
        )
        .unwrap();
        assert!(config.audit.interactive_only);
        assert!(!config.audit.check_labels);
        assert!(config.audit.check_alt_text);
        assert_eq!(config.scheduler.debounce_ms, 250);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wcagbot.yml");
        std::fs::write(&path, "audit:\n  check_contrast: false\nlog:\n  level: debug\n").unwrap();
        let config = load_config(&path).unwrap();
        assert!(!config.audit.check_contrast);
        assert_eq!(config.log.level, "debug");
    }
}
