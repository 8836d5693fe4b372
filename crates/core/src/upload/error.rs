//! Upload error types.

use ossup_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Upload operation errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Missing or malformed input; nothing was sent to the provider.
    #[error("{0}")]
    Validation(String),

    /// The storage provider failed the request.
    #[error("{0}")]
    Upstream(String),
}

impl UploadError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an upstream error.
    #[must_use]
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Wrap a storage error with the step that failed.
    #[must_use]
    pub fn upstream_context(context: &str, err: &StorageError) -> Self {
        Self::Upstream(format!("{context}: {err}"))
    }
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(msg) => Self::Validation(msg),
            UploadError::Upstream(msg) => Self::ExternalService(msg),
        }
    }
}
