use serde::Serialize;
use uuid::Uuid;

use crate::machine::Trigger;
use stockflow_core::ledger::LedgerError;
use stockflow_shared::models::transfer::TransferStatus;

fn describe_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Creation-time rejection carrying every offending line
#[derive(Debug, thiserror::Error)]
#[error("transfer request validation failed: {}", describe_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Serialize, thiserror::Error, PartialEq, Eq)]
pub enum Violation {
    #[error("source and destination warehouse must differ")]
    SameWarehouse,

    #[error("a transfer request needs at least one line item")]
    NoLineItems,

    #[error("line {line}: quantity {quantity} for product {product_id} must be positive")]
    NonPositiveQuantity {
        line: usize,
        product_id: Uuid,
        quantity: i32,
    },

    #[error("line {line}: requested {requested} of product {product_id} but only {available} available at the source")]
    InsufficientAvailability {
        line: usize,
        product_id: Uuid,
        requested: i32,
        available: i32,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("transfer request not found: {0}")]
    NotFound(Uuid),

    #[error("{trigger} is not allowed while the request is {from}")]
    IllegalTransition {
        from: TransferStatus,
        trigger: Trigger,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("approved quantity {approved} for product {product_id} must be positive and at most the requested {requested}")]
    InvalidApprovedQuantity {
        product_id: Uuid,
        approved: i32,
        requested: i32,
    },

    #[error("approval override references product {0}, which is not on the request")]
    UnknownOverride(Uuid),

    #[error("principal {0} is not authorized to approve or reject transfers")]
    Forbidden(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("transfer storage error: {0}")]
    Storage(String),
}

impl TransferError {
    pub(crate) fn storage(err: stockflow_core::BoxError) -> Self {
        TransferError::Storage(err.to_string())
    }
}
