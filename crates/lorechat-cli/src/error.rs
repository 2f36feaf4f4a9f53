//! Lorechat CLI error types.

use lorechat_core::error::ChatError;
use thiserror::Error;

/// Startup and runtime errors for the terminal client.
#[derive(Debug, Error)]
pub enum AppError {
    /// A command-line option or environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading stdin or writing stdout failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A backend or session operation failed.
    #[error(transparent)]
    Chat(#[from] ChatError),
}
