//! Backend-related errors.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the CRM backend.
///
/// HTTP failures are normalized by status so callers can branch on the
/// kind (e.g. treat a missing settings row as "use defaults") without
/// inspecting raw responses.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing or rejected bearer token (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token valid but not allowed (403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend rejected the request (400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Any other non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Could not build the request URL.
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl BackendError {
    /// Build the error for a non-success status and its body.
    ///
    /// The message is taken from the body's `message` field, then `error`,
    /// then the status reason phrase.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            _ => Self::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// HTTP status the backend answered with, if it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Api { status, .. } => Some(*status),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => None,
        }
    }

    /// "No row yet": the backend answers 400 or 404 for records that were
    /// never created.
    #[must_use]
    pub const fn is_missing_record(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::BadRequest(_))
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::BadRequest(m)
            | Self::Api { message: m, .. } => m.clone(),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => {
                "Unable to reach the server. Please try again.".to_string()
            }
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_preferred() {
        let err = BackendError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"phone already used","error":"Bad Request"}"#,
        );
        assert!(matches!(err, BackendError::BadRequest(ref m) if m == "phone already used"));
    }

    #[test]
    fn test_error_field_fallback() {
        let err = BackendError::from_status(StatusCode::UNAUTHORIZED, r#"{"error":"jwt expired"}"#);
        assert!(matches!(err, BackendError::Unauthorized(ref m) if m == "jwt expired"));
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_non_json_body_uses_reason() {
        let err = BackendError::from_status(StatusCode::NOT_FOUND, "<html>nope</html>");
        assert!(matches!(err, BackendError::NotFound(ref m) if m == "Not Found"));
        assert!(err.is_missing_record());
    }

    #[test]
    fn test_other_status_keeps_code() {
        let err = BackendError::from_status(StatusCode::CONFLICT, r#"{"message":"duplicate"}"#);
        assert!(matches!(err, BackendError::Api { status: 409, .. }));
        assert!(!err.is_missing_record());
        assert_eq!(err.user_message(), "duplicate");
    }
}
