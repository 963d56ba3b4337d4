//! Error types for deja.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DejaError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // WAV encoding errors
    #[error("WAV encoding failed: {message}")]
    WavEncode { message: String },

    // Verify/transcribe server errors
    #[error("Speech server request failed: {message}")]
    Api { message: String },

    #[error("Speech server returned {status}: {body}")]
    ApiStatus { status: u16, body: String },

    // Pipeline errors
    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for DejaError {
    fn from(err: reqwest::Error) -> Self {
        DejaError::Api {
            message: err.to_string(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DejaError>;
