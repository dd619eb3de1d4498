use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path};

const DEFAULT_DATABASE_PATH: &str = "notes.db";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to parse {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Builds a config from `NOTES_DB_PATH`, `NOTES_HOST` and `NOTES_PORT`
    /// as returned by `lookup`. Missing variables keep their defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("NOTES_DB_PATH") {
            config.database_path = path;
        }
        if let Some(host) = lookup("NOTES_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("NOTES_PORT") {
            config.port = port.parse().map_err(|e| ConfigError::InvalidValue {
                name: "NOTES_PORT",
                reason: format!("{e}"),
            })?;
        }

        Ok(config)
    }
}

fn read_file(path: &str) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    Config::from_yaml(&contents)
}

pub fn load_config() -> Result<Config, ConfigError> {
    // Retrieve env variable
    let config_path = env::var("NOTES_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path
    if Path::new(&config_path).exists() {
        return read_file(&config_path);
    }

    // Fallback to config.example.yaml
    if Path::new("config.example.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.example.yaml'",
            config_path
        );
        return read_file("config.example.yaml");
    }

    // Fallback to environment variables and defaults
    tracing::info!("No config file found, loading configuration from environment variables");
    Config::from_vars(|name| env::var(name).ok())
}
