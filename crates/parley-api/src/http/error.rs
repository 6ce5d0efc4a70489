//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Client-facing service errors keep their message. Upstream and internal
//! failures are replaced by one generic message; the cause is logged once,
//! by the message pipeline or here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use parley_types::error::{ErrorKind, ServiceError};

use super::response::ApiResponse;

/// Message shown to clients for every upstream or internal failure.
pub const GENERIC_FAILURE: &str = "Internal server error, please try again later";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the account, catalog, chat and shortcut services.
    Service(ServiceError),
    /// Errors from the message pipeline, which already logged them with their stage.
    Pipeline(ServiceError),
    /// Malformed request input rejected at the boundary.
    Validation(String),
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        AppError::Service(e)
    }
}

impl AppError {
    /// Level at which the cause of a server-side failure is logged here.
    fn failure_level(&self) -> Option<tracing::Level> {
        match self {
            AppError::Service(err) if !err.is_client_error() => Some(tracing::Level::ERROR),
            AppError::Pipeline(err) if !err.is_client_error() => Some(tracing::Level::DEBUG),
            _ => None,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Service(err) | AppError::Pipeline(err) => match err.kind() {
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
                ErrorKind::PermissionDenied => {
                    (StatusCode::FORBIDDEN, "PERMISSION_DENIED", err.to_string())
                }
                ErrorKind::Validation => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
                }
                ErrorKind::Upstream | ErrorKind::Internal => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    GENERIC_FAILURE.to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Service(err) | AppError::Pipeline(err) = &self {
            match self.failure_level() {
                Some(tracing::Level::ERROR) => {
                    tracing::error!(kind = err.kind().as_str(), error = %err, "request failed")
                }
                Some(_) => {
                    tracing::debug!(kind = err.kind().as_str(), error = %err, "request failed")
                }
                None => {}
            }
        }

        let (status, code, message) = self.parts();
        let request_id = uuid::Uuid::now_v7().to_string();
        let body = ApiResponse::error(code, &message, request_id, 0);

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::from(ServiceError::denied("You have run out of free questions"));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, "PERMISSION_DENIED");
        assert_eq!(message, "You have run out of free questions");
    }

    #[test]
    fn test_upstream_cause_is_not_leaked() {
        let err = AppError::from(ServiceError::Upstream {
            dependency: "ocr",
            message: "connection refused 10.0.0.7:8000".to_string(),
        });
        let (status, _, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, GENERIC_FAILURE);
    }

    #[test]
    fn test_pipeline_failure_is_not_logged_twice() {
        let upstream = || ServiceError::Upstream {
            dependency: "inference gateway",
            message: "status 503".to_string(),
        };

        let pipeline = AppError::Pipeline(upstream());
        assert_eq!(pipeline.failure_level(), Some(tracing::Level::DEBUG));
        let (status, _, message) = pipeline.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, GENERIC_FAILURE);

        assert_eq!(AppError::from(upstream()).failure_level(), Some(tracing::Level::ERROR));
        assert_eq!(
            AppError::Pipeline(ServiceError::not_found("chat")).failure_level(),
            None
        );
    }

    #[test]
    fn test_not_found_and_validation_statuses() {
        let (status, _, _) = AppError::from(ServiceError::not_found("chat")).parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = AppError::Validation("bad base64".to_string()).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
