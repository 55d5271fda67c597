use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Line count failed: {0}")]
    LineCount(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Prefix the message with the operation that failed, keeping the variant.
    pub fn context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Error::NotFound(msg) => Error::NotFound(format!("{context}: {msg}")),
            Error::InvalidIdentifier(msg) => Error::InvalidIdentifier(format!("{context}: {msg}")),
            Error::Upstream(msg) => Error::Upstream(format!("{context}: {msg}")),
            Error::LineCount(msg) => Error::LineCount(format!("{context}: {msg}")),
            Error::Validation(msg) => Error::Validation(format!("{context}: {msg}")),
            Error::Internal(msg) => Error::Internal(format!("{context}: {msg}")),
            other => other,
        }
    }

    /// Get a sanitized error message safe for logging
    /// Filters out potentially sensitive information
    pub fn log_safe(&self) -> String {
        match self {
            // Upstream messages may echo request URLs or auth failures
            Error::Upstream(msg) => {
                if contains_secret_hint(msg) {
                    "Upstream request failed (details redacted)".to_string()
                } else {
                    format!("Upstream failure: {msg}")
                }
            }

            Error::Internal(msg) => {
                if contains_secret_hint(msg) {
                    "Internal error (details redacted)".to_string()
                } else {
                    format!("Internal error: {msg}")
                }
            }

            Error::Serialization(_) => "Payload serialization failed".to_string(),
            Error::Io(_) => "File system operation failed".to_string(),
            Error::NotFound(msg) => format!("Not found: {msg}"),
            Error::InvalidIdentifier(msg) => format!("Invalid identifier: {msg}"),
            Error::LineCount(msg) => format!("Line count failed: {msg}"),
            Error::Config(msg) => format!("Configuration error: {msg}"),
            Error::Metrics(_) => "Metrics registry failure".to_string(),
            Error::Validation(msg) => format!("Validation error: {msg}"),
        }
    }
}

fn contains_secret_hint(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("password")
        || lower.contains("secret")
        || lower.contains("token")
        || lower.contains("key")
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("Request error: {}", self.log_safe());

        let (status, error_message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Error::InvalidIdentifier(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "Upstream provider error".to_string(),
            ),
            Error::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Serialization error".to_string(),
            ),
            Error::LineCount(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Line count failed".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_variant() {
        let err = Error::NotFound("octo/hello".to_string()).context("get_repo");
        assert!(matches!(&err, Error::NotFound(msg) if msg == "get_repo: octo/hello"));

        let err = Error::Upstream("HTTP 500".to_string()).context("list commits");
        assert!(matches!(&err, Error::Upstream(msg) if msg == "list commits: HTTP 500"));
    }

    #[test]
    fn test_log_safe_redacts_tokens() {
        let err = Error::Upstream("bad token ghp_123".to_string());
        assert_eq!(err.log_safe(), "Upstream request failed (details redacted)");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (Error::InvalidIdentifier("x".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::Upstream("x".into()), StatusCode::BAD_GATEWAY),
            (Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
