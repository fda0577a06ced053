//! # rf-config
//!
//! Layered settings for the rusty-forum binary.
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `rusty-forum.toml`, then `RUSTY_FORUM__*` environment variables
//! (a `.env` file is folded into the environment first).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "rusty-forum.toml";
pub const ENV_PREFIX: &str = "RUSTY_FORUM";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Folds `.env` from the working directory into the process environment.
///
/// Call it before parsing arguments so clap's `env` fallbacks see those values.
/// Variables already set are left alone.
pub fn load_dotenv() -> Option<PathBuf> {
    let path = dotenvy::dotenv().ok()?;
    tracing::debug!(?path, ".env loaded");
    Some(path)
}

/// Like [`load_dotenv`] for an explicit file. Returns whether it was read.
pub fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(?path, "env file loaded");
            true
        }
        Err(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Where the JSON store keeps the forum document.
    pub data_file: PathBuf,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Settings {
    /// Loads `.env`, then the default config file (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Like [`Settings::load`] but reads `file` instead of the default config file.
    pub fn load_with(file: &Path) -> Result<Self, ConfigError> {
        load_dotenv();
        Self::load_from(Some(file))
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("data_file", "data/forum.json")?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?;

        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
