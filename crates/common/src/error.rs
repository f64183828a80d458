//! Error types shared across VigilCam crates.

use std::path::PathBuf;

/// Top-level error type for VigilCam operations.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    #[error("Motion processing error: {message}")]
    Motion { message: String },

    #[error("Region error: {message}")]
    Region { message: String },

    #[error("Recording control error: {message}")]
    Recording { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using VigilError.
pub type VigilResult<T> = Result<T, VigilError>;

impl VigilError {
    pub fn motion(msg: impl Into<String>) -> Self {
        Self::Motion {
            message: msg.into(),
        }
    }

    pub fn region(msg: impl Into<String>) -> Self {
        Self::Region {
            message: msg.into(),
        }
    }

    pub fn recording(msg: impl Into<String>) -> Self {
        Self::Recording {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
