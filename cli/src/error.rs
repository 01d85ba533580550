//! Unified error handling for the command-line front end.

use crate::config::ConfigError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] keysync_engine::Error),

    #[error("Store failed to load: {0}")]
    Load(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::BadRequest(_) => 2,
            AppError::Engine(e) if e.is_not_found() => 3,
            AppError::Engine(_) | AppError::Load(_) | AppError::Output(_) => 1,
        }
    }
}

/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, AppError>;
