// Application configuration loading (config/draftboard.toml).
//
// This file covers process-level knobs only: where the database lives,
// which port the command surface binds, and the default drop-scoring
// lookahead. League settings are administrative state and live in the
// store, not here.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Assembled application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub ws_port: u16,
    pub db_path: String,
    pub lookahead: usize,
}

/// Raw deserialization target for the entire draftboard.toml file.
/// Every section is optional so a partial (or absent) file falls back to
/// the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    websocket: WebsocketSection,
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    scoring: ScoringSection,
}

#[derive(Debug, Clone, Deserialize)]
struct WebsocketSection {
    port: u16,
}

impl Default for WebsocketSection {
    fn default() -> Self {
        WebsocketSection { port: 9100 }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: "draftboard.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ScoringSection {
    lookahead: usize,
}

impl Default for ScoringSection {
    fn default() -> Self {
        ScoringSection {
            lookahead: crate::engine::DEFAULT_LOOKAHEAD,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load configuration from `config/draftboard.toml` relative to `base_dir`.
/// A missing file is not an error; built-in defaults apply.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("draftboard.toml");

    let file: ConfigFile = if path.exists() {
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?
    } else {
        ConfigFile::default()
    };

    let config = Config {
        ws_port: file.websocket.port,
        db_path: file.database.path,
        lookahead: file.scoring.lookahead,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working
/// directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::ReadError {
        path: PathBuf::from("."),
        message: e.to_string(),
    })?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.lookahead == 0 {
        return Err(ConfigError::ValidationError {
            field: "scoring.lookahead".into(),
            message: "must be at least 1".into(),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
