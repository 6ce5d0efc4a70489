use thiserror::Error;

use crate::enrich::EnrichError;
use crate::llm::InferenceError;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Classification of a [`ServiceError`], used by the HTTP layer and analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Validation,
    Upstream,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Validation => "validation",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Error returned by every service and by the message orchestrator.
///
/// Client-facing variants carry a message that is safe to show to the user.
/// `Upstream` and `Internal` carry diagnostics that must only be logged.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Validation(String),

    #[error("{dependency} failed: {message}")]
    Upstream {
        dependency: &'static str,
        message: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Upstream { .. } => ErrorKind::Upstream,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the message may be surfaced verbatim to the caller.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::Validation
        )
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn denied(message: impl Into<String>) -> Self {
        ServiceError::PermissionDenied(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound("entity not found".to_string()),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<InferenceError> for ServiceError {
    fn from(err: InferenceError) -> Self {
        ServiceError::Upstream {
            dependency: "inference gateway",
            message: err.to_string(),
        }
    }
}

impl From<EnrichError> for ServiceError {
    fn from(err: EnrichError) -> Self {
        let dependency = match &err {
            EnrichError::Transport { service, .. }
            | EnrichError::Timeout { service, .. }
            | EnrichError::Status { service, .. }
            | EnrichError::InvalidResponse { service, .. } => *service,
        };
        ServiceError::Upstream {
            dependency,
            message: err.to_string(),
        }
    }
}
