//! TOML-based configuration for Tally.
//!
//! Supports a config file (tally.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [database]
//! path = "${TALLY_DATA}/erp.sqlite"
//! dialect = "sqlite"
//!
//! [grouping]
//! group_order = "first_seen"   # or "sorted"
//! missing_field = "empty_key"  # or "reject"
//! empty_extremes = "fail"      # or "zero"
//!
//! [preview]
//! limit = 100
//! rows = 10
//!
//! [export]
//! currency_symbol = "$"
//! precision = 2
//! date_format = "%Y-%m-%d"
//! max_column_width = 50
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::executor::ExecutorOptions;
use crate::export::ExportOptions;
use crate::grouping::GroupingOptions;
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub grouping: GroupingOptions,
    pub preview: PreviewSettings,
    pub export: ExportOptions,
    pub logging: LoggingSettings,
}

/// Where report queries run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file (supports ${ENV_VAR} expansion).
    pub path: Option<String>,

    /// Dialect used when rendering SQL for display.
    pub dialect: Dialect,
}

/// Query preview limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// LIMIT appended to preview queries that have none.
    pub limit: u64,

    /// Rows shown from a preview.
    pub rows: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            limit: 100,
            rows: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset (e.g. "info", "tally=debug").
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `TALLY_CONFIG`
    /// 2. `./tally.toml`
    /// 3. `~/.config/tally/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("TALLY_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("tally.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tally").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Database path with environment variables expanded.
    pub fn database_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.database
            .path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            grouping: self.grouping,
            preview_limit: self.preview.limit,
            preview_rows: self.preview.rows,
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            let name = std::iter::from_fn(|| chars.next_if(|&ch| ch != '}')).collect();
            chars.next(); // consume '}'
            name
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            std::iter::from_fn(|| chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_')).collect()
        };

        if var_name.is_empty() {
            // Just a lone $, keep it
            result.push('$');
            continue;
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
