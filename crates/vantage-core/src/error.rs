//! Error types module
//!
//! All errors raised inside the gateway are unified under the `AppError`
//! enum. The variants mirror the failure taxonomy of the video access
//! gateway: signing input validation, edge upload transport, persisted-state
//! invariants, playlist session validation, and upstream provider fetches.

use std::io;

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like upstream hiccups
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "SESSION_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    /// Malformed storage resource path rejected before signing. Local and
    /// non-retryable: the caller built a path with a scheme, query,
    /// fragment, port, or userinfo component.
    #[error("Malformed resource path: {0}")]
    PathFormat(String),

    /// Transport failure talking to the edge-messaging broker. Retryable;
    /// no gateway state is mutated when this is raised.
    #[error("Upload request failed: {0}")]
    UploadRequest(String),

    /// A persisted clip record violates its invariants (e.g. a stream name
    /// without an expiration). Fatal for the request; never auto-repaired.
    #[error("Inconsistent clip state: {0}")]
    InconsistentClipState(String),

    /// Unknown or expired playlist session token.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Non-2xx from the streaming provider when fetching a playlist or
    /// fragment list.
    #[error("Upstream fetch failed ({status:?}): {message}")]
    UpstreamFetch { status: Option<u16>, message: String },

    /// Session cache (Redis or in-memory) failure.
    #[error("Session cache error: {0}")]
    Cache(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

// Error conversion implementations following Rust best practices
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// Reduces duplication in ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::PathFormat(_) => (
            400,
            "PATH_FORMAT_ERROR",
            false,
            Some("Use a bare object key with no scheme, query, or fragment"),
            false,
            LogLevel::Debug,
        ),
        AppError::UploadRequest(_) => (
            503,
            "UPLOAD_REQUEST_ERROR",
            true,
            Some("Retry the playback request"),
            false,
            LogLevel::Warn,
        ),
        AppError::InconsistentClipState(_) => (
            500,
            "INCONSISTENT_CLIP_STATE",
            false,
            Some("Contact support; the clip record needs operator attention"),
            true,
            LogLevel::Error,
        ),
        AppError::SessionNotFound(_) => (
            400,
            "SESSION_NOT_FOUND",
            false,
            Some("Request a fresh playback URL"),
            false,
            LogLevel::Debug,
        ),
        AppError::UpstreamFetch { .. } => (
            502,
            "UPSTREAM_FETCH_ERROR",
            true,
            Some("Retry the whole playback attempt"),
            false,
            LogLevel::Warn,
        ),
        AppError::Cache(_) => (
            500,
            "CACHE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::PathFormat(_) => "PathFormat",
            AppError::UploadRequest(_) => "UploadRequest",
            AppError::InconsistentClipState(_) => "InconsistentClipState",
            AppError::SessionNotFound(_) => "SessionNotFound",
            AppError::UpstreamFetch { .. } => "UpstreamFetch",
            AppError::Cache(_) => "Cache",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        // Add source error chain
        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::PathFormat(ref msg) => format!("Malformed resource path: {}", msg),
            AppError::UploadRequest(_) => "Failed to request upload from the edge device".to_string(),
            AppError::InconsistentClipState(_) => "Clip record is in an inconsistent state".to_string(),
            AppError::SessionNotFound(_) => "Unknown or expired playback session".to_string(),
            AppError::UpstreamFetch { status, .. } => match status {
                Some(code) => format!("Streaming provider returned status {}", code),
                None => "Streaming provider is unreachable".to_string(),
            },
            AppError::Cache(_) => "Failed to access session cache".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_session_not_found() {
        let err = AppError::SessionNotFound("abc-stream".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "SESSION_NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_upload_request_is_retryable() {
        let err = AppError::UploadRequest("broker timeout".to_string());
        assert_eq!(err.http_status_code(), 503);
        assert_eq!(err.error_code(), "UPLOAD_REQUEST_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_upstream_fetch_status_in_message() {
        let err = AppError::UpstreamFetch {
            status: Some(503),
            message: "service unavailable".to_string(),
        };
        assert_eq!(err.http_status_code(), 502);
        assert!(err.client_message().contains("503"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_metadata_inconsistent_state_is_sensitive() {
        let err = AppError::InconsistentClipState("stream set but no expiration".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_path_format() {
        let err = AppError::PathFormat("contains '?'".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "PATH_FORMAT_ERROR");
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains("contains '?'"));
    }
}
