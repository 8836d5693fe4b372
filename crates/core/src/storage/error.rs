//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The provider answered with an error document or a failure status.
    #[error("{code}: {message} (status {status})")]
    Provider {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider error code, e.g. `NoSuchUpload`.
        code: String,
        /// Provider error message.
        message: String,
    },

    /// The SDK failed before a response was received, or refused to sign.
    #[error("storage operation failed: {0}")]
    Sdk(String),

    /// The provider answered with a body that could not be understood.
    #[error("malformed storage response: {0}")]
    MalformedResponse(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a provider error.
    #[must_use]
    pub fn provider(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an SDK error.
    #[must_use]
    pub fn sdk(msg: impl Into<String>) -> Self {
        Self::Sdk(msg.into())
    }
}

impl From<s3::error::S3Error> for StorageError {
    fn from(err: s3::error::S3Error) -> Self {
        match err {
            s3::error::S3Error::HttpFailWithBody(status, body) => {
                match super::service::parse_error_document(&body) {
                    Some((code, message)) => Self::provider(status, code, message),
                    None => Self::provider(status, "HttpError", body.trim()),
                }
            }
            other => Self::Sdk(other.to_string()),
        }
    }
}

impl From<quick_xml::de::DeError> for StorageError {
    fn from(err: quick_xml::de::DeError) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_failure_body_is_parsed() {
        let err = StorageError::from(s3::error::S3Error::HttpFailWithBody(
            404,
            "<Error><Code>NoSuchUpload</Code><Message>The specified upload does not exist.</Message></Error>".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "NoSuchUpload: The specified upload does not exist. (status 404)"
        );
    }

    #[test]
    fn test_http_failure_plain_body() {
        let err = StorageError::from(s3::error::S3Error::HttpFailWithBody(
            502,
            "bad gateway\n".to_string(),
        ));
        assert!(matches!(err, StorageError::Provider { status: 502, ref message, .. } if message == "bad gateway"));
    }
}
