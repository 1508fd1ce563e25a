//! TOML settings for the `prorate` binary.
//!
//! ## File Format
//!
//! Every key is optional.
//!
//! | Key             | Type            | Notes |
//! |-----------------|-----------------|-------|
//! | `log_level`     | string          | Any `EnvFilter` directive, e.g. `debug` or `prorate_core=trace` |
//! | `log_file`      | path            | Also append log records to this file |
//! | `format`        | `text` / `json` | Output format when `--format` is not given |
//! | `brackets_file` | path            | Bracket CSV; relative paths resolve against the settings file |
//! | `[[brackets]]`  | table array     | Inline bracket table, used when no CSV is configured |
//!
//! ```toml
//! log_level = "warn"
//! format = "json"
//!
//! [[brackets]]
//! upper_threshold = "10000"
//! rate = "0.10"
//!
//! [[brackets]]
//! rate = "0.25"
//! ```

use std::path::{Path, PathBuf};

use prorate_core::Bracket;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Errors that can occur while loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub format: OutputFormat,
    pub brackets_file: Option<PathBuf>,
    pub brackets: Vec<Bracket>,
}

impl Settings {
    /// Parses settings from TOML text. Paths are left as written.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Reads settings from `path`.
    ///
    /// Relative `brackets_file` and `log_file` paths are resolved against
    /// the directory containing the settings file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            settings.brackets_file = settings.brackets_file.map(|p| resolve(base, p));
            settings.log_file = settings.log_file.map(|p| resolve(base, p));
        }

        Ok(settings)
    }
}

fn resolve(
    base: &Path,
    path: PathBuf,
) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}
