use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{pass_workflow::PassWorkflowError, qr_generator::QrGenerationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::Validation("Referenced record does not exist".to_string())
            }
            _ => AppError::Database(e),
        }
    }
}

impl From<PassWorkflowError> for AppError {
    fn from(e: PassWorkflowError) -> Self {
        match e {
            PassWorkflowError::DatabaseError(e) => e.into(),
            PassWorkflowError::PassNotFound => AppError::NotFound("Pass not found".to_string()),
            PassWorkflowError::AlreadyResolved(state) => {
                AppError::Conflict(format!("Pass already resolved as {:?}", state))
            }
            e @ (PassWorkflowError::OriginChanged
            | PassWorkflowError::DestinationUnavailable) => AppError::Conflict(e.to_string()),
        }
    }
}

impl From<QrGenerationError> for AppError {
    fn from(e: QrGenerationError) -> Self {
        AppError::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_debug = format!("{:?}", self);

        let (status, error_message) = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_debug,
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pass::PassAuthorization;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Database(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_pass_workflow_mapping() {
        let resolved: AppError =
            PassWorkflowError::AlreadyResolved(PassAuthorization::Rejected).into();
        assert!(matches!(resolved, AppError::Conflict(_)));

        let missing: AppError = PassWorkflowError::PassNotFound.into();
        assert!(matches!(missing, AppError::NotFound(_)));

        let moved: AppError = PassWorkflowError::OriginChanged.into();
        assert!(matches!(moved, AppError::Conflict(_)));

        let closed: AppError = PassWorkflowError::DestinationUnavailable.into();
        assert!(matches!(closed, AppError::Conflict(_)));
    }
}
