//! Error types for loading placement resources.

use thiserror::Error;

/// Result type alias for API-layer operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while reading resource snapshots.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML snapshot: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
