use std::fmt;

use crate::error::TransferError;
use stockflow_shared::models::transfer::TransferStatus;

/// Operations that drive a transfer request through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Approve,
    Reject,
    StartShipping,
    CompleteDelivery,
    Cancel,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Approve => "approve",
            Trigger::Reject => "reject",
            Trigger::StartShipping => "start_shipping",
            Trigger::CompleteDelivery => "complete_delivery",
            Trigger::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The whole lifecycle in one table. Legality checks and handlers read
/// this instead of re-testing statuses inline.
const TRANSITIONS: &[(TransferStatus, Trigger, TransferStatus)] = &[
    (TransferStatus::Pending, Trigger::Approve, TransferStatus::Approved),
    (TransferStatus::Pending, Trigger::Reject, TransferStatus::Rejected),
    (TransferStatus::Pending, Trigger::Cancel, TransferStatus::Cancelled),
    (TransferStatus::Approved, Trigger::StartShipping, TransferStatus::Shipping),
    (TransferStatus::Approved, Trigger::Cancel, TransferStatus::Cancelled),
    (TransferStatus::Shipping, Trigger::CompleteDelivery, TransferStatus::Delivered),
];

/// Next status for `(from, trigger)`, or None when the transition is not
/// in the lifecycle graph
pub fn next_status(from: TransferStatus, trigger: Trigger) -> Option<TransferStatus> {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == trigger)
        .map(|(_, _, to)| *to)
}

/// Next status for `(from, trigger)`, or `IllegalTransition`
pub fn ensure(from: TransferStatus, trigger: Trigger) -> Result<TransferStatus, TransferError> {
    next_status(from, trigger).ok_or(TransferError::IllegalTransition { from, trigger })
}

/// Triggers currently legal for a request in `status`
pub fn triggers_from(status: TransferStatus) -> Vec<Trigger> {
    TRANSITIONS
        .iter()
        .filter(|(f, _, _)| *f == status)
        .map(|(_, t, _)| *t)
        .collect()
}
