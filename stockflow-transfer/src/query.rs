use std::sync::Arc;
use uuid::Uuid;

use crate::error::TransferError;
use stockflow_core::repository::TransferRepository;
use stockflow_shared::models::transfer::{TransferRequest, TransferStatus};

/// Read-only projections over the request store for list views and
/// detail pages. No side effects; reflects the latest committed state.
pub struct TransferQueryService {
    repo: Arc<dyn TransferRepository>,
}

impl TransferQueryService {
    pub fn new(repo: Arc<dyn TransferRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_request(&self, id: Uuid) -> Result<TransferRequest, TransferError> {
        self.repo
            .get(id)
            .await
            .map_err(TransferError::storage)?
            .ok_or(TransferError::NotFound(id))
    }

    /// Requests where the warehouse is source or destination, newest
    /// first, optionally narrowed to one status
    pub async fn list_requests(
        &self,
        warehouse_id: Uuid,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, TransferError> {
        self.repo
            .list(warehouse_id, status)
            .await
            .map_err(TransferError::storage)
    }
}
