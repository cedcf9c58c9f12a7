//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the single error type handlers return.
//! Domain errors (`AuthError`, `TaskError`, `StoreError`) convert into it with
//! `?`, and `AppError` implements `actix_web::error::ResponseError` so each
//! variant becomes the right status code with a JSON body.
//!
//! Internal detail is never leaked: every authentication failure renders the
//! same generic body, and storage failures are logged here and reported as a
//! plain 500.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;

use crate::auth::AuthError;
use crate::services::tasks::{TaskError, ValidationKind};
use crate::store::StoreError;

/// Represents all possible errors that can surface from an HTTP handler.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or was missing (HTTP 401).
    Unauthorized(AuthError),
    /// The request body could not be parsed (HTTP 400).
    BadRequest(String),
    /// Input was parsed but rejected by a field rule (HTTP 400).
    Validation(ValidationKind),
    /// The requested resource does not exist or is no longer active (HTTP 404).
    NotFound(String),
    /// The authenticated subject may not act on the resource (HTTP 403).
    Forbidden,
    /// Any lower-layer failure (HTTP 500).
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(kind) => write!(f, "Unauthorized: {}", kind),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Validation(kind) => write!(f, "Validation Error: {}", kind),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Unauthorized(_) => json!({ "error": "unauthorized" }),
            AppError::BadRequest(msg) => json!({ "error": msg }),
            AppError::Validation(kind) => json!({
                "error": kind.to_string(),
                "field": kind.field(),
            }),
            AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::Forbidden => json!({ "error": "forbidden" }),
            AppError::Internal(_) => json!({ "error": "internal server error" }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            // A credential lookup that failed underneath is a server fault,
            // not a bad login.
            AuthError::Storage(msg) => {
                log::error!("credential store failure: {}", msg);
                AppError::Internal(msg)
            }
            AuthError::Internal(msg) => {
                log::error!("auth internal failure: {}", msg);
                AppError::Internal(msg)
            }
            other => {
                log::debug!("rejecting request: {}", other);
                AppError::Unauthorized(other)
            }
        }
    }
}

impl From<TaskError> for AppError {
    fn from(error: TaskError) -> AppError {
        match error {
            TaskError::Validation(kind) => AppError::Validation(kind),
            TaskError::NotFound(id) => AppError::NotFound(format!("task {} not found", id)),
            TaskError::Forbidden(id) => {
                log::warn!("ownership check rejected mutation of task {}", id);
                AppError::Forbidden
            }
            TaskError::Storage(err) => err.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        log::error!("storage failure: {}", error);
        AppError::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_error_responses() {
        let error = AppError::Unauthorized(AuthError::Expired);
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::BadRequest("Invalid JSON".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::Validation(ValidationKind::EmptyTitle);
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::NotFound("Resource not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::Forbidden;
        assert_eq!(error.error_response().status(), 403);

        let error = AppError::Internal("Server error".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[actix_rt::test]
    async fn test_auth_failures_share_a_generic_body() {
        for kind in [
            AuthError::MissingToken,
            AuthError::InvalidSignature,
            AuthError::UnexpectedAlgorithm,
            AuthError::InvalidCredentials,
        ] {
            let response = AppError::from(kind).error_response();
            let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json, json!({ "error": "unauthorized" }));
        }
    }

    #[actix_rt::test]
    async fn test_validation_body_is_field_keyed() {
        let response = AppError::from(TaskError::Validation(ValidationKind::InvalidStatus))
            .error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["field"], "status");
    }

    #[actix_rt::test]
    async fn test_auth_faults_are_server_errors() {
        for kind in [
            AuthError::Internal("hashing thread panicked".into()),
            AuthError::Storage("connection refused".into()),
        ] {
            let response = AppError::from(kind).error_response();
            assert_eq!(response.status(), 500);
            let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json, json!({ "error": "internal server error" }));
        }
    }

    #[test]
    fn test_storage_errors_become_internal() {
        let error: AppError = StoreError::Timeout.into();
        assert!(matches!(error, AppError::Internal(_)));
    }
}
