use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use stockflow_core::ledger::LedgerError;
use stockflow_transfer::TransferError;

#[derive(Debug)]
pub enum AppError {
    Transfer(TransferError),
    AuthenticationError(String),
    InternalServerError(String),
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        AppError::Transfer(err)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Transfer(TransferError::Ledger(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Transfer(err) => transfer_response(err),
            AppError::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": msg }))
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Map the transfer taxonomy to status codes, keeping the per-line
/// detail (violations, shortages) in the body so callers learn exactly
/// which precondition failed.
fn transfer_response(err: TransferError) -> (StatusCode, serde_json::Value) {
    match err {
        TransferError::Validation(validation) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": validation.to_string(),
                "violations": validation.violations,
            }),
        ),
        TransferError::Ledger(LedgerError::InsufficientStock { ref shortages, .. }) => (
            StatusCode::CONFLICT,
            json!({
                "error": err.to_string(),
                "shortages": shortages,
            }),
        ),
        TransferError::InvalidApprovedQuantity { .. }
        | TransferError::UnknownOverride(_)
        | TransferError::Ledger(LedgerError::InvalidQuantity(_)) => {
            (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
        }
        TransferError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": err.to_string() })),
        TransferError::IllegalTransition { .. } => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        TransferError::Forbidden(_) => (StatusCode::FORBIDDEN, json!({ "error": err.to_string() })),
        TransferError::Ledger(LedgerError::Storage(ref msg)) | TransferError::Storage(ref msg) => {
            tracing::error!("Storage error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error" }),
            )
        }
    }
}
