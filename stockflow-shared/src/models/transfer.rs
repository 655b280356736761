use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Status of a transfer request in its lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Approved,
    Shipping,
    Delivered,
    Rejected,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Approved => "APPROVED",
            TransferStatus::Shipping => "SHIPPING",
            TransferStatus::Delivered => "DELIVERED",
            TransferStatus::Rejected => "REJECTED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal statuses admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Delivered | TransferStatus::Rejected | TransferStatus::Cancelled
        )
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransferStatus::Pending),
            "APPROVED" => Ok(TransferStatus::Approved),
            "SHIPPING" => Ok(TransferStatus::Shipping),
            "DELIVERED" => Ok(TransferStatus::Delivered),
            "REJECTED" => Ok(TransferStatus::Rejected),
            "CANCELLED" => Ok(TransferStatus::Cancelled),
            other => Err(format!("unknown transfer status: {other}")),
        }
    }
}

/// One product/quantity pair within a transfer request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferLineItem {
    pub product_id: Uuid,
    pub requested_quantity: i32,
    /// Fixed once at approval; never exceeds `requested_quantity`
    pub approved_quantity: Option<i32>,
}

impl TransferLineItem {
    pub fn new(product_id: Uuid, requested_quantity: i32) -> Self {
        Self {
            product_id,
            requested_quantity,
            approved_quantity: None,
        }
    }
}

/// A request to move product quantities from a source warehouse to a
/// destination warehouse. Line items are append-only: the only write
/// after creation is the single approval-time `approved_quantity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub status: TransferStatus,
    pub items: Vec<TransferLineItem>,
    pub requester_id: String,
    pub approver_id: Option<String>,
    pub request_note: Option<String>,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransferRequest {
    pub fn new(
        destination_warehouse_id: Uuid,
        source_warehouse_id: Uuid,
        requester_id: String,
        items: Vec<TransferLineItem>,
        request_note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            destination_warehouse_id,
            source_warehouse_id,
            status: TransferStatus::Pending,
            items,
            requester_id,
            approver_id: None,
            request_note,
            admin_note: None,
            created_at: Utc::now(),
            approved_at: None,
            completed_at: None,
        }
    }

    pub fn total_requested(&self) -> i32 {
        self.items.iter().map(|line| line.requested_quantity).sum()
    }

    /// Sum of approved quantities over lines that have one
    pub fn total_approved(&self) -> i32 {
        self.items
            .iter()
            .filter_map(|line| line.approved_quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            TransferStatus::Pending,
            TransferStatus::Approved,
            TransferStatus::Shipping,
            TransferStatus::Delivered,
            TransferStatus::Rejected,
            TransferStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<TransferStatus>(), Ok(status));
        }
        assert!("IN_TRANSIT".parse::<TransferStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TransferStatus::Delivered.is_terminal());
        assert!(TransferStatus::Rejected.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Approved.is_terminal());
        assert!(!TransferStatus::Shipping.is_terminal());
    }

    #[test]
    fn test_totals() {
        let mut request = TransferRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "staff-1".to_string(),
            vec![
                TransferLineItem::new(Uuid::new_v4(), 10),
                TransferLineItem::new(Uuid::new_v4(), 5),
            ],
            None,
        );

        assert_eq!(request.total_requested(), 15);
        assert_eq!(request.total_approved(), 0);

        request.items[0].approved_quantity = Some(8);
        assert_eq!(request.total_approved(), 8);
    }
}
