//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/toolpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/toolpulse/` (~/.config/toolpulse/)
//! - State/Logs: `$XDG_STATE_HOME/toolpulse/` (~/.local/state/toolpulse/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

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

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Log source configuration
    #[serde(default)]
    pub logs: LogSourceConfig,

    /// Report configuration
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where to find the assistant's session logs
#[derive(Debug, Deserialize, Default)]
pub struct LogSourceConfig {
    /// Override path for the projects directory (default: ~/.claude/projects)
    pub projects_root: Option<PathBuf>,
}

/// Report defaults, overridable from the CLI
#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    /// Success rate below which a tool is reported as problematic
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Prefix tool names with their owning project
    #[serde(default = "default_project_prefix")]
    pub project_prefix: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            project_prefix: default_project_prefix(),
        }
    }
}

fn default_threshold() -> f64 {
    0.80
}

fn default_project_prefix() -> bool {
    true
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
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/toolpulse/config.toml` (~/.config/toolpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("toolpulse").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/toolpulse/` (~/.local/state/toolpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("toolpulse")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/toolpulse/toolpulse.log` (~/.local/state/toolpulse/toolpulse.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("toolpulse.log")
    }

    /// Returns the projects root, honoring the config override.
    pub fn projects_root(&self) -> Option<PathBuf> {
        self.logs
            .projects_root
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".claude").join("projects")))
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
