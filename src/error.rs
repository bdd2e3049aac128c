//! Error types and handling for the farescout library

use thiserror::Error;

/// Main error type for the farescout library
#[derive(Error, Debug)]
pub enum FarescoutError {
    /// Empty or malformed location input
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A location term that matched no city, airport, or country
    #[error("Location not found: {term}")]
    NotFound { term: String },

    /// The upstream location/fare service call failed
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl FarescoutError {
    /// Create a new invalid-input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new not-found error carrying the original search term
    pub fn not_found<S: Into<String>>(term: S) -> Self {
        Self::NotFound { term: term.into() }
    }

    /// Create a new upstream error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True when the caller's request was at fault rather than the service
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FarescoutError::InvalidInput { .. } | FarescoutError::NotFound { .. }
        )
    }
}

impl From<reqwest::Error> for FarescoutError {
    fn from(err: reqwest::Error) -> Self {
        FarescoutError::Upstream {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let input_err = FarescoutError::invalid_input("empty location term");
        assert!(matches!(input_err, FarescoutError::InvalidInput { .. }));

        let not_found_err = FarescoutError::not_found("Atlantis");
        assert!(matches!(not_found_err, FarescoutError::NotFound { .. }));

        let upstream_err = FarescoutError::upstream("connection refused");
        assert!(matches!(upstream_err, FarescoutError::Upstream { .. }));
    }

    #[test]
    fn test_not_found_keeps_original_term() {
        let err = FarescoutError::not_found("Atlantis");
        assert_eq!(err.to_string(), "Location not found: Atlantis");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(FarescoutError::invalid_input("x").is_client_error());
        assert!(FarescoutError::not_found("x").is_client_error());
        assert!(!FarescoutError::upstream("x").is_client_error());
        assert!(!FarescoutError::config("x").is_client_error());
    }
}
