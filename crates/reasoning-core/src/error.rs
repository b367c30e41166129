//! Error taxonomy for the extraction pipeline.

use crate::graph::GraphError;

pub type Result<T, E = ReasoningError> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    /// Bad input shape or emptiness. Always raised, never wrapped.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure in a mandatory pipeline step.
    #[error("failed to process text: {message}")]
    Processing {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReasoningError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ReasoningError::InvalidInput(message.into())
    }

    /// Wrap an arbitrary failure as a processing error carrying its cause.
    pub fn processing<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        ReasoningError::Processing {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReasoningError::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_processing_error_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "worker died");
        let err = ReasoningError::processing("extract step failed", cause);
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "failed to process text: extract step failed");
        assert_eq!(err.source().unwrap().to_string(), "worker died");
    }

    #[test]
    fn test_validation_error() {
        let err = ReasoningError::invalid_input("text cannot be empty");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "invalid input: text cannot be empty");
    }
}
