//! Error types for Koble.

use thiserror::Error;

/// Library-level error type for Koble operations.
#[derive(Error, Debug)]
pub enum KobleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection lookup failed: {0}")]
    ConnectionLookup(String),

    #[error("Authorization was not completed within {waited_secs} seconds")]
    AuthTimeout { waited_secs: u64 },

    #[error("Authorization failed: {0}")]
    AuthFailed(String),

    #[error("Platform API error: {0}")]
    Platform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("No usable tools: {0}")]
    ToolUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Koble operations.
pub type Result<T> = std::result::Result<T, KobleError>;
