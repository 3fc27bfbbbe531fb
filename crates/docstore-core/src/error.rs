//! Error types module
//!
//! All errors are unified under the `AppError` enum which can represent
//! database, storage, validation, and workflow errors. Each variant knows
//! its HTTP status code and machine-readable error code so the API layer
//! can render responses without matching on variants itself.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors like validation failures
    Debug,
    /// Recoverable or security-relevant issues worth surfacing
    Warn,
    /// Unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Absent, malformed, expired, or mode-mismatched transfer token.
    /// Collapsed into one signal so responses never leak which check failed.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Step already acted: {0}")]
    AlreadyActed(String),

    #[error("Document validation already finished: {0}")]
    DocumentTerminal(String),

    #[error("Validation workflow not enabled for document {0}")]
    WorkflowDisabled(String),

    #[error("Storage key escapes storage root: {0}")]
    PathTraversal(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code to return for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Forbidden(_) => 403,
            AppError::InvalidToken => 400,
            AppError::AlreadyActed(_) => 400,
            AppError::DocumentTerminal(_) => 400,
            AppError::WorkflowDisabled(_) => 400,
            AppError::PathTraversal(_) => 400,
            AppError::Storage(_) => 500,
            AppError::Database(_) => 500,
            AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code (e.g. "invalid-or-expired-token").
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation-error",
            AppError::NotFound(_) => "not-found",
            AppError::Forbidden(_) => "forbidden",
            AppError::InvalidToken => "invalid-or-expired-token",
            AppError::AlreadyActed(_) => "step-already-acted",
            AppError::DocumentTerminal(_) => "document-already-finalized",
            AppError::WorkflowDisabled(_) => "validation-not-enabled",
            AppError::PathTraversal(_) => "invalid-storage-key",
            AppError::Storage(_) => "storage-error",
            AppError::Database(_) => "database-error",
            AppError::Internal(_) => "internal-error",
        }
    }

    /// Client-facing message. Internal errors are not echoed back verbatim.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::InvalidToken
            | AppError::AlreadyActed(_)
            | AppError::DocumentTerminal(_)
            | AppError::WorkflowDisabled(_) => LogLevel::Debug,
            AppError::Forbidden(_) | AppError::PathTraversal(_) => LogLevel::Warn,
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::NotFound("doc".into()).http_status_code(), 404);
        assert_eq!(AppError::Forbidden("actor".into()).http_status_code(), 403);
        assert_eq!(AppError::InvalidToken.http_status_code(), 400);
        assert_eq!(AppError::PathTraversal("..".into()).http_status_code(), 400);
        assert_eq!(AppError::Database("down".into()).http_status_code(), 500);
    }

    #[test]
    fn internal_details_are_not_echoed() {
        let err = AppError::Database("connection refused at 10.0.0.1".into());
        assert_eq!(err.client_message(), "Internal server error");
        let err = AppError::AlreadyActed("step 3".into());
        assert!(err.client_message().contains("step 3"));
    }
}
