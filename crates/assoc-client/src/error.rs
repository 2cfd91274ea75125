//! Backend error classification.

use assoc_core::Error;

/// Error class derived from an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Token missing, expired, or revoked.
    Unauthorized,
    /// Authenticated but not allowed.
    Forbidden,
    /// Entity does not exist.
    NotFound,
    /// Rate limit exceeded.
    RateLimited,
    /// Server error.
    ServerError,
    /// Anything else.
    Unknown,
}

impl ApiErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Whether the next poll tick may reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError)
    }
}

/// Best human-readable message from an error body.
///
/// Understands `{"detail": "..."}` and `{"error": "..."}`, else returns the
/// raw body (empty bodies fall back to the status reason).
pub fn extract_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Convert a failed response into a console error.
pub fn to_console_error(status: u16, body: &str) -> Error {
    let message = extract_message(status, body);
    match ApiErrorCode::from_status(status) {
        ApiErrorCode::Forbidden => Error::Forbidden(message),
        ApiErrorCode::NotFound => Error::NotFound(message),
        _ => Error::Status { status, message },
    }
}
