//! Mapping of ledger errors onto HTTP responses

use crate::response::{ApiResponse, ErrorInfo};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rentbook_core::LedgerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Malformed request body, path or query string
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Ledger(err) => err.code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ledger(err) => match err {
                LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
                LedgerError::Conflict(_) => StatusCode::CONFLICT,
                LedgerError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
                LedgerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                LedgerError::Storage(_) | LedgerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ApiResponse::<()>::error(ErrorInfo::new(self.error_code(), message));
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentbook_storage::StorageError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(LedgerError::not_found("Lease", "1")), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ApiError::from(LedgerError::conflict("taken")), StatusCode::CONFLICT, "CONFLICT"),
            (ApiError::from(LedgerError::invalid_amount("neg")), StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            (
                ApiError::from(LedgerError::validation("phone")),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (
                ApiError::from(LedgerError::from(StorageError::LockPoisoned)),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
            ),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::from(LedgerError::conflict("taken")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
