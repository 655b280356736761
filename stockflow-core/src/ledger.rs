use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// One product movement inside an atomic transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl StockMovement {
    pub fn new(product_id: Uuid, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A line the source warehouse could not cover, measured at the instant
/// of the authoritative check
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Shortage {
    pub product_id: Uuid,
    pub requested: i32,
    pub available: i32,
}

fn describe_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(|s| {
            format!(
                "product {} requested {} available {}",
                s.product_id, s.requested, s.available
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient stock at warehouse {warehouse_id}: {}", describe_shortages(.shortages))]
    InsufficientStock {
        warehouse_id: Uuid,
        shortages: Vec<Shortage>,
    },

    #[error("invalid stock quantity {0}: counts must be non-negative")]
    InvalidQuantity(i32),

    #[error("stock storage error: {0}")]
    Storage(String),
}

/// Authoritative per-(warehouse, product) available-quantity store.
///
/// The ledger is the single owner of quantity truth: every mutation goes
/// through these operations, and `available_quantity >= 0` holds under
/// all concurrent access. A key with no entry reads as zero.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Read-only availability; blocks writers no longer than one mutation.
    async fn available(&self, warehouse_id: Uuid, product_id: Uuid) -> Result<i32, LedgerError>;

    /// Atomically verify `available(source, product) >= quantity` for every
    /// movement, then decrement the source and increment the destination in
    /// one logically indivisible step. All-or-nothing across movements: if
    /// any line cannot be satisfied, none are applied and the error lists
    /// every lacking line.
    async fn reserve_and_transfer(
        &self,
        source_warehouse_id: Uuid,
        destination_warehouse_id: Uuid,
        movements: &[StockMovement],
    ) -> Result<(), LedgerError>;

    /// Seed or correct an availability count (admin surface). Rejects
    /// negative quantities.
    async fn set_available(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), LedgerError>;
}
