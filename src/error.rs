//! Error types for the streamvault application.

use std::path::PathBuf;

use thiserror::Error;

use crate::download::SessionState;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // Provider errors
    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("No downloadable streams: {0}")]
    NoStreams(String),

    #[error("API error: {0}")]
    Api(String),

    // Session errors
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Destination not writable ({}): {message}", path.display())]
    DestinationUnwritable { path: PathBuf, message: String },

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Session already queued: {0}")]
    DuplicateSession(String),

    #[error("Cannot {action} a session that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes used by the CLI.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const PROVIDER_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
