//! Configuration management for the command-line front end.

use keysync_engine::StoreOptions;
use std::env;
use std::path::PathBuf;

/// Runtime configuration, from the environment with command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backing log file
    pub db_path: PathBuf,
    /// Optional fixture file in the log format
    pub fixtures: Option<PathBuf>,
    /// Fail on malformed log lines instead of skipping them
    pub strict: bool,
}

/// Values given on the command line. They win over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub fixtures: Option<PathBuf>,
    pub strict: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |name| env::var(name).ok())
    }

    fn from_lookup<F>(overrides: Overrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = overrides
            .db_path
            .or_else(|| lookup("KEYSYNC_DB").map(PathBuf::from))
            .ok_or(ConfigError::MissingDbPath)?;

        let fixtures = overrides
            .fixtures
            .or_else(|| lookup("KEYSYNC_FIXTURES").map(PathBuf::from));

        let strict = match lookup("KEYSYNC_STRICT") {
            _ if overrides.strict => true,
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidStrict(value))?,
            None => false,
        };

        Ok(Self {
            db_path,
            fixtures,
            strict,
        })
    }

    /// Store options implied by this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            strict: self.strict,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("KEYSYNC_DB environment variable or --db is required")]
    MissingDbPath,

    #[error("Invalid KEYSYNC_STRICT value: {0}")]
    InvalidStrict(String),
}
