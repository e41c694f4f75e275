/// Core error types for the teaser engine.
use std::path::PathBuf;

/// A specialized Result type for teaser operations.
pub type TeaserResult<T> = Result<T, TeaserError>;

/// Top-level error type encompassing all teaser subsystems.
#[derive(Debug, thiserror::Error)]
pub enum TeaserError {
    #[error("compile error: {0}")]
    Compile(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("asset error: {message} ({source_ref})")]
    Asset { message: String, source_ref: String },

    #[error("composition error: {0}")]
    Composition(String),

    #[error("config error: {message} ({path:?})")]
    Config { message: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl TeaserError {
    /// Create an asset error for a URL or path that could not be loaded.
    pub fn asset(message: impl Into<String>, source_ref: impl Into<String>) -> Self {
        TeaserError::Asset {
            message: message.into(),
            source_ref: source_ref.into(),
        }
    }

    /// Create a config error tied to a file.
    pub fn config(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        TeaserError::Config {
            message: message.into(),
            path: path.into(),
        }
    }
}
