//! Configuration management for sendguard.
//!
//! Configuration is loaded with figment from defaults, an optional TOML
//! file, and environment variables. The host-page selectors live here as
//! fixed constants of the deployment: they are not discovered dynamically
//! and must be updated by hand when the host page's markup changes.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "sendguard";

/// Default store document file name.
const STORE_FILE_NAME: &str = "issues.json";

/// Application configuration.
///
/// Loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SENDGUARD_`)
/// 2. TOML config file at `~/.config/sendguard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host-page selector configuration.
    pub selectors: SelectorConfig,
    /// Submission monitor timing configuration.
    pub monitor: MonitorTimingConfig,
    /// Backing store configuration.
    pub store: StoreConfig,
}

/// Selectors locating the host page's composer parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Selector for the editable-content root.
    pub editor: String,
    /// Element id of the submit control.
    pub submit_control: String,
    /// Class marking the composer's submit form.
    pub composer_form_class: String,
    /// Data attribute value marking the composer's submit form.
    pub composer_form_data_type: String,
    /// Element id of this tool's own notification overlay container.
    pub overlay_container: String,
}

/// Timing configuration for the submission monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorTimingConfig {
    /// Interval between editor-discovery polls in milliseconds.
    pub poll_interval_ms: u64,
    /// How long discovery keeps polling before giving up, in milliseconds.
    pub discovery_timeout_ms: u64,
    /// Delay before an alert is emitted after a submission, in
    /// milliseconds. Lets the host page finish its own submit animation.
    pub alert_delay_ms: u64,
}

/// Backing store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the store document.
    /// Defaults to `~/.local/share/sendguard/issues.json`
    pub file_path: Option<PathBuf>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            editor: "#prompt-textarea".to_string(),
            submit_control: "composer-submit-button".to_string(),
            composer_form_class: "group/composer".to_string(),
            composer_form_data_type: "unified-composer".to_string(),
            overlay_container: "sendguard-overlay".to_string(),
        }
    }
}

impl Default for MonitorTimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            discovery_timeout_ms: 120_000,
            alert_delay_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("SENDGUARD_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let selectors = [
            ("selectors.editor", &self.selectors.editor),
            ("selectors.submit_control", &self.selectors.submit_control),
            (
                "selectors.composer_form_class",
                &self.selectors.composer_form_class,
            ),
            (
                "selectors.composer_form_data_type",
                &self.selectors.composer_form_data_type,
            ),
            (
                "selectors.overlay_container",
                &self.selectors.overlay_container,
            ),
        ];
        for (name, value) in selectors {
            if value.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must not be empty"),
                });
            }
        }

        if self.monitor.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.monitor.discovery_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "discovery_timeout_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the store document path, resolving defaults if not set.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.store
            .file_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(STORE_FILE_NAME))
    }

    /// Get the editor-discovery poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.poll_interval_ms)
    }

    /// Get the editor-discovery timeout as a Duration.
    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor.discovery_timeout_ms)
    }

    /// Get the alert-emission delay as a Duration.
    #[must_use]
    pub fn alert_delay(&self) -> Duration {
        Duration::from_millis(self.monitor.alert_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.selectors.editor, "#prompt-textarea");
        assert_eq!(config.selectors.submit_control, "composer-submit-button");
        assert_eq!(config.monitor.poll_interval_ms, 500);
        assert_eq!(config.monitor.alert_delay_ms, 500);
        assert!(config.store.file_path.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_selector() {
        let mut config = Config::default();
        config.selectors.submit_control = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("submit_control"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.monitor.poll_interval_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_zero_discovery_timeout() {
        let mut config = Config::default();
        config.monitor.discovery_timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("discovery_timeout_ms"));
    }

    #[test]
    fn test_store_path_default() {
        let config = Config::default();
        assert!(config
            .store_path()
            .to_string_lossy()
            .contains("issues.json"));
    }

    #[test]
    fn test_store_path_custom() {
        let mut config = Config::default();
        config.store.file_path = Some(PathBuf::from("/custom/store.json"));

        assert_eq!(config.store_path(), PathBuf::from("/custom/store.json"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();

        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.discovery_timeout(), Duration::from_millis(120_000));
        assert_eq!(config.alert_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("sendguard"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config_uses_defaults() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("submit_control"));
        assert!(json.contains("poll_interval_ms"));
    }

    #[test]
    fn test_selector_config_deserialize() {
        let json = r##"{"editor": "#composer", "submit_control": "send-btn"}"##;
        let selectors: SelectorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(selectors.editor, "#composer");
        assert_eq!(selectors.submit_control, "send-btn");
        // Unset fields keep their defaults.
        assert_eq!(selectors.composer_form_data_type, "unified-composer");
    }
}
