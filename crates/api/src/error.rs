//! API error types with HTTP response mapping.

use analytics::AnalyticsError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use ledger::{ErrorKind, LedgerError};
use store::StoreError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Malformed path or query input.
    #[error("{0}")]
    BadRequest(String),

    /// Order ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Analytics failure.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Catalog or directory failure outside the ledger.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Product or review input rejected.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Classifies the error with the same kinds the ledger reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::BadRequest(_) | ApiError::Domain(_) => ErrorKind::Validation,
            ApiError::Ledger(err) => err.kind(),
            ApiError::Analytics(AnalyticsError::InvalidWindow(_)) => ErrorKind::Validation,
            ApiError::Analytics(AnalyticsError::Store(err)) | ApiError::Store(err) => {
                store_error_kind(err)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InsufficientStock | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn store_error_kind(err: &StoreError) -> ErrorKind {
    match err {
        StoreError::ProductNotFound(_) | StoreError::OrderNotFound(_) => ErrorKind::NotFound,
        StoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
        StoreError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
        StoreError::Product(_) => ErrorKind::Validation,
        _ => ErrorKind::Storage,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, kind = %kind, "internal server error");
        } else {
            tracing::debug!(error = %message, kind = %kind, "request rejected");
        }

        let body = serde_json::json!({
            "error": {
                "kind": kind.as_str(),
                "message": message,
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
