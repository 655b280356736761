use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use stockflow_core::repository::TransferRepository;
use stockflow_core::BoxError;
use stockflow_shared::models::transfer::{TransferRequest, TransferStatus};

/// In-memory request store for tests and dev wiring. `DashMap` entry
/// guards make `update_if_status` a true compare-and-swap: the status
/// check and the overwrite happen under one shard lock.
pub struct InMemoryTransferStore {
    requests: DashMap<Uuid, TransferRequest>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }
}

impl Default for InMemoryTransferStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferRepository for InMemoryTransferStore {
    async fn create(&self, request: &TransferRequest) -> Result<(), BoxError> {
        self.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<TransferRequest>, BoxError> {
        Ok(self.requests.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(
        &self,
        warehouse_id: Uuid,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, BoxError> {
        let mut matches: Vec<TransferRequest> = self
            .requests
            .iter()
            .filter(|entry| {
                entry.source_warehouse_id == warehouse_id
                    || entry.destination_warehouse_id == warehouse_id
            })
            .filter(|entry| status.map_or(true, |s| entry.status == s))
            .map(|entry| entry.value().clone())
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn update_if_status(
        &self,
        expected: TransferStatus,
        updated: &TransferRequest,
    ) -> Result<bool, BoxError> {
        match self.requests.get_mut(&updated.id) {
            Some(mut entry) if entry.status == expected => {
                *entry = updated.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
