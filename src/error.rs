//! Error types and handling for Keraunos
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Keraunos operations
pub type Result<T> = std::result::Result<T, KeraunosError>;

/// Main error type for Keraunos
#[derive(Debug, Error)]
pub enum KeraunosError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Authentication/authorization errors (fatal at startup)
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Permanent remote-API errors (not retried)
    #[error("API error: {message}")]
    Api { message: String },

    /// Transient remote-API errors (retried with backoff)
    #[error("Transient API error: {message}")]
    Transient { message: String },

    /// Timeout errors (treated as transient)
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// A retried operation gave up after its attempt budget
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    /// Unknown VIN in a lookup or command
    #[error("No vehicle with VIN {vin}")]
    NotFound { vin: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },
}

impl KeraunosError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        KeraunosError::Config {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        KeraunosError::Auth {
            message: message.into(),
        }
    }

    /// Create a new permanent API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        KeraunosError::Api {
            message: message.into(),
        }
    }

    /// Create a new transient API error
    pub fn transient<S: Into<String>>(message: S) -> Self {
        KeraunosError::Transient {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        KeraunosError::Timeout {
            message: message.into(),
        }
    }

    /// Create a retry-exhaustion error wrapping the last failure
    pub fn retry_exhausted<S: Into<String>>(operation: S, attempts: u32, last: &Self) -> Self {
        KeraunosError::RetryExhausted {
            operation: operation.into(),
            attempts,
            last_error: last.to_string(),
        }
    }

    /// Create a new unknown-VIN error
    pub fn not_found<S: Into<String>>(vin: S) -> Self {
        KeraunosError::NotFound { vin: vin.into() }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        KeraunosError::Web {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        KeraunosError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        KeraunosError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether a retry of the failed operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            KeraunosError::Transient { .. } | KeraunosError::Timeout { .. }
        )
    }
}

impl From<std::io::Error> for KeraunosError {
    fn from(err: std::io::Error) -> Self {
        KeraunosError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for KeraunosError {
    fn from(err: serde_yaml::Error) -> Self {
        KeraunosError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for KeraunosError {
    fn from(err: serde_json::Error) -> Self {
        KeraunosError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for KeraunosError {
    fn from(err: reqwest::Error) -> Self {
        // Transport-level failures are worth a retry; anything else is not.
        if err.is_timeout() {
            KeraunosError::timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            KeraunosError::transient(err.to_string())
        } else {
            KeraunosError::api(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = KeraunosError::config("test config error");
        assert!(matches!(err, KeraunosError::Config { .. }));

        let err = KeraunosError::not_found("5YJ3E1EA7KF000000");
        assert!(matches!(err, KeraunosError::NotFound { .. }));

        let err = KeraunosError::validation("field", "test validation error");
        assert!(matches!(err, KeraunosError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = KeraunosError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = KeraunosError::not_found("A1");
        assert_eq!(format!("{}", err), "No vehicle with VIN A1");
    }

    #[test]
    fn test_transient_classification() {
        assert!(KeraunosError::transient("503").is_transient());
        assert!(KeraunosError::timeout("deadline").is_transient());
        assert!(!KeraunosError::api("404").is_transient());
        assert!(!KeraunosError::auth("revoked token").is_transient());
    }

    #[test]
    fn test_retry_exhausted_wraps_last_error() {
        let last = KeraunosError::transient("vehicle unavailable");
        let err = KeraunosError::retry_exhausted("charge state", 5, &last);
        let text = format!("{}", err);
        assert!(text.contains("charge state"));
        assert!(text.contains("5 attempts"));
        assert!(text.contains("vehicle unavailable"));
    }
}
