use async_trait::async_trait;
use stockflow_shared::models::transfer::{TransferRequest, TransferStatus};
use uuid::Uuid;

use crate::BoxError;

/// Repository trait for transfer request persistence.
///
/// Records are scoped to one request id; `update_if_status` is the
/// compare-and-swap every state transition commits through, so a record
/// only advances when its stored status still matches the expected
/// "from" status.
#[async_trait]
pub trait TransferRepository: Send + Sync {
    async fn create(&self, request: &TransferRequest) -> Result<(), BoxError>;

    async fn get(&self, id: Uuid) -> Result<Option<TransferRequest>, BoxError>;

    /// All requests touching the warehouse as source or destination,
    /// optionally narrowed to one status, newest first.
    async fn list(
        &self,
        warehouse_id: Uuid,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, BoxError>;

    /// Persist `updated` only if the stored status still equals
    /// `expected`. Returns false (and writes nothing) when another
    /// transition got there first.
    async fn update_if_status(
        &self,
        expected: TransferStatus,
        updated: &TransferRequest,
    ) -> Result<bool, BoxError>;
}
