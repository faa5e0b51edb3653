//! Error taxonomy for the serving path
//!
//! Every failure on the prediction path is one of four kinds. The HTTP
//! boundary decides which status code each kind maps to; see
//! [`ErrorMapping`](crate::config::ErrorMapping).

use thiserror::Error;

/// Failure kind, independent of the message carried with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RegistryUnavailable,
    ArtifactLoadFailure,
    InvalidInput,
    InferenceFailure,
}

/// Errors raised while resolving models, transforming features or predicting
#[derive(Debug, Error)]
pub enum ServeError {
    /// The registry cannot be reached or the model reference does not resolve
    #[error("model registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// The resolved artifact cannot be turned into a usable predictor
    #[error("failed to load model artifact: {0}")]
    ArtifactLoadFailure(String),

    /// The request or table violates the input contract
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The model could not produce predictions for the assembled table
    #[error("inference failed: {0}")]
    InferenceFailure(String),
}

impl ServeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServeError::RegistryUnavailable(_) => ErrorKind::RegistryUnavailable,
            ServeError::ArtifactLoadFailure(_) => ErrorKind::ArtifactLoadFailure,
            ServeError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServeError::InferenceFailure(_) => ErrorKind::InferenceFailure,
        }
    }

    /// Only registry outages are worth another attempt
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RegistryUnavailable
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ServeError::InvalidInput(msg.into())
    }

    pub(crate) fn inference(msg: impl Into<String>) -> Self {
        ServeError::InferenceFailure(msg.into())
    }
}

/// Result alias for the serving path
pub type Result<T> = std::result::Result<T, ServeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_registry_errors_retry() {
        assert!(ServeError::RegistryUnavailable("down".into()).is_retryable());
        assert!(!ServeError::ArtifactLoadFailure("bad".into()).is_retryable());
        assert!(!ServeError::invalid("x").is_retryable());
        assert!(!ServeError::inference("x").is_retryable());
    }

    #[test]
    fn test_message_carries_cause() {
        let err = ServeError::RegistryUnavailable("alias 'champion' not found".into());
        assert_eq!(
            err.to_string(),
            "model registry unavailable: alias 'champion' not found"
        );
        assert_eq!(err.kind(), ErrorKind::RegistryUnavailable);
    }
}
