//! Error types for the DDI provider
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for DDI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDI provider
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal at startup, never retried)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failures, non-2xx statuses and undecodable bodies
    #[error("HTTP error: {0}")]
    Http(String),

    /// Structured rejection returned by the management API
    #[error("API rejected request (rcode {code}): {description}")]
    Api {
        /// Application-level result code
        code: i32,
        /// Human readable description from the API
        description: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an application-level rejection
    pub fn api(code: i32, description: impl Into<String>) -> Self {
        Self::Api {
            code,
            description: description.into(),
        }
    }

    /// Whether this error came back from the remote side rather than
    /// from local validation
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::api(3, "zone not found");
        assert_eq!(err.to_string(), "API rejected request (rcode 3): zone not found");
        assert!(err.is_remote());
    }

    #[test]
    fn test_config_error_is_local() {
        let err = Error::config("YAMU_HOST is required");
        assert!(!err.is_remote());
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_json_error_is_local() {
        let err: Error = serde_json::from_str::<Vec<String>>("{").unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
        assert!(!err.is_remote());
    }
}
