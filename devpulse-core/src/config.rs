//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/devpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/devpulse/` (~/.config/devpulse/)
//! - Data: `$XDG_DATA_HOME/devpulse/` (~/.local/share/devpulse/)
//! - State/Logs: `$XDG_STATE_HOME/devpulse/` (~/.local/state/devpulse/)
//!
//! ## Example
//!
//! ```toml
//! [metrics]
//! default_period = "week"
//! code_lines_normalization = "grand-total"
//!
//! [report]
//! productivity_weeks = 10
//! productivity_months = 6
//! usage_days = 7
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::{Error, Result};
use crate::metrics::period::Period;
use crate::metrics::productivity::CodeLinesNormalization;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Defaults for metric queries
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Periodic report windows
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied when a query does not say otherwise
#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    /// Bucket size for productivity and usage series
    #[serde(default = "default_period")]
    pub default_period: Period,

    /// Denominator for the code-lines AI percentage
    #[serde(default)]
    pub code_lines_normalization: CodeLinesNormalization,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            default_period: default_period(),
            code_lines_normalization: CodeLinesNormalization::default(),
        }
    }
}

fn default_period() -> Period {
    Period::Week
}

/// Lookback windows of the periodic report
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Weeks of weekly code-lines productivity
    #[serde(default = "default_productivity_weeks")]
    pub productivity_weeks: u32,

    /// Months of monthly code-lines productivity
    #[serde(default = "default_productivity_months")]
    pub productivity_months: u32,

    /// Days covered by the language, daily usage and users sections
    #[serde(default = "default_usage_days")]
    pub usage_days: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            productivity_weeks: default_productivity_weeks(),
            productivity_months: default_productivity_months(),
            usage_days: default_usage_days(),
        }
    }
}

impl ReportConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("report.productivity_weeks", self.productivity_weeks),
            ("report.productivity_months", self.productivity_months),
            ("report.usage_days", self.usage_days),
        ];
        for (key, value) in windows {
            if value == 0 {
                return Err(Error::Config(format!("{} must be at least 1", key)));
            }
        }
        Ok(())
    }
}

fn default_productivity_weeks() -> u32 {
    10
}

fn default_productivity_months() -> u32 {
    6
}

fn default_usage_days() -> u32 {
    7
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.report.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/devpulse/config.toml` (~/.config/devpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("devpulse").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/devpulse/` (~/.local/share/devpulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("devpulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/devpulse/` (~/.local/state/devpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("devpulse")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/devpulse/data.db` (~/.local/share/devpulse/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.metrics.default_period, Period::Week);
        assert_eq!(
            config.metrics.code_lines_normalization,
            CodeLinesNormalization::GrandTotal
        );
        assert_eq!(config.report.productivity_weeks, 10);
        assert_eq!(config.report.productivity_months, 6);
        assert_eq!(config.report.usage_days, 7);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[metrics]
default_period = "month"
code_lines_normalization = "per-bucket"

[report]
usage_days = 14

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.metrics.default_period, Period::Month);
        assert_eq!(
            config.metrics.code_lines_normalization,
            CodeLinesNormalization::PerBucket
        );
        assert_eq!(config.report.usage_days, 14);
        assert_eq!(config.report.productivity_weeks, 10);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn test_unknown_period_rejected() {
        let toml = r#"
[metrics]
default_period = "fortnight"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_load_from_rejects_zero_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[report]\nproductivity_weeks = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("report.productivity_weeks"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
