use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while resolving and fetching repository content
///
/// The enum is `Clone` so a memoized fetch result can be handed to every
/// caller of a session; foreign errors are shared behind an `Arc`.
#[derive(Error, Debug, Clone)]
pub enum ContentError {
    #[error("ValidationError: {message}")]
    Validation { message: String },

    #[error("Content not found: {path}")]
    NotFound { path: String },

    #[error("Network error: {0}")]
    Network(Arc<reqwest::Error>),

    #[error("Rate limited by remote service: {message}")]
    RateLimited { message: String },

    #[error("Invalid remote structure: {message}")]
    InvalidStructure { message: String },

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Archive error: {0}")]
    Archive(Arc<zip::result::ZipError>),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Serialization error: {0}")]
    Serialization(Arc<serde_json::Error>),
}

impl ContentError {
    pub fn validation(message: impl Into<String>) -> Self {
        ContentError::Validation {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ContentError {
    fn from(error: reqwest::Error) -> Self {
        ContentError::Network(Arc::new(error))
    }
}

impl From<std::io::Error> for ContentError {
    fn from(error: std::io::Error) -> Self {
        ContentError::Io(Arc::new(error))
    }
}

impl From<zip::result::ZipError> for ContentError {
    fn from(error: zip::result::ZipError) -> Self {
        ContentError::Archive(Arc::new(error))
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(error: serde_json::Error) -> Self {
        ContentError::Serialization(Arc::new(error))
    }
}

/// Result type alias for content operations
pub type Result<T> = std::result::Result<T, ContentError>;
