//! Error types for assoc-console.

use thiserror::Error;

/// Result type alias using assoc-console's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for assoc-console operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No bearer token is available (not logged in)
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// HTTP/network request failed before a response was received
    #[error("Request error: {0}")]
    Request(String),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (unknown action/resource names and the like)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status carried by this error, if the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error means the session has no usable credentials.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Error::Unauthenticated(_)) || self.status() == Some(401)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Error::Serialization(e.to_string());
        }
        match e.status() {
            Some(status) => Error::Status {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Error::Request(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unauthenticated() {
        let err = Error::Unauthenticated("no token".to_string());
        assert_eq!(err.to_string(), "Not authenticated: no token");
    }

    #[test]
    fn test_error_display_status() {
        let err = Error::Status {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned 503: maintenance");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_error_display_request() {
        let err = Error::Request("network unreachable".to_string());
        assert_eq!(err.to_string(), "Request error: network unreachable");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("unknown resource: budgets".to_string());
        assert_eq!(err.to_string(), "Invalid input: unknown resource: budgets");
    }

    #[test]
    fn test_is_unauthenticated() {
        assert!(Error::Unauthenticated(String::new()).is_unauthenticated());
        assert!(Error::Status {
            status: 401,
            message: String::new()
        }
        .is_unauthenticated());
        assert!(!Error::Status {
            status: 403,
            message: String::new()
        }
        .is_unauthenticated());
        assert!(!Error::Request("timeout".into()).is_unauthenticated());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
