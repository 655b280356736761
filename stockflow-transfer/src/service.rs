use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::builder::{self, NewTransferRequest};
use crate::error::TransferError;
use crate::machine::{self, Trigger};
use stockflow_core::identity::ApproverDirectory;
use stockflow_core::ledger::{StockLedger, StockMovement};
use stockflow_core::repository::TransferRepository;
use stockflow_shared::models::transfer::{TransferRequest, TransferStatus};

/// Per-line approval override, keyed by product
#[derive(Debug, Clone)]
pub struct LineOverride {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Drives transfer requests through the lifecycle graph and applies the
/// stock side effects that accompany each transition.
///
/// Transitions on one request are serialized through a per-id lock, and
/// every transition commits through the repository's status
/// compare-and-swap, so a racing writer elsewhere surfaces as
/// `IllegalTransition` instead of a double-applied transition.
pub struct TransferService {
    repo: Arc<dyn TransferRepository>,
    ledger: Arc<dyn StockLedger>,
    approvers: Arc<dyn ApproverDirectory>,
    // Terminal ids keep their (tiny) slot; the table is per-process.
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl TransferService {
    pub fn new(
        repo: Arc<dyn TransferRepository>,
        ledger: Arc<dyn StockLedger>,
        approvers: Arc<dyn ApproverDirectory>,
    ) -> Self {
        Self {
            repo,
            ledger,
            approvers,
            locks: DashMap::new(),
        }
    }

    /// Validate caller input and persist a new PENDING request
    pub async fn create(&self, input: NewTransferRequest) -> Result<TransferRequest, TransferError> {
        let request = builder::build(input, self.ledger.as_ref()).await?;
        self.repo
            .create(&request)
            .await
            .map_err(TransferError::storage)?;

        tracing::info!(
            request_id = %request.id,
            source = %request.source_warehouse_id,
            destination = %request.destination_warehouse_id,
            lines = request.items.len(),
            "transfer request created"
        );
        Ok(request)
    }

    /// PENDING -> APPROVED: fix per-line approved quantities (defaulting
    /// to the requested amount) and record the approver
    pub async fn approve(
        &self,
        id: Uuid,
        approver_id: &str,
        overrides: &[LineOverride],
        note: Option<String>,
    ) -> Result<TransferRequest, TransferError> {
        self.ensure_approver(approver_id).await?;

        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut request = self.load(id).await?;
        let expected = request.status;
        let next = machine::ensure(expected, Trigger::Approve)?;

        for over in overrides {
            let line = request
                .items
                .iter_mut()
                .find(|line| line.product_id == over.product_id)
                .ok_or(TransferError::UnknownOverride(over.product_id))?;
            if over.quantity <= 0 || over.quantity > line.requested_quantity {
                return Err(TransferError::InvalidApprovedQuantity {
                    product_id: over.product_id,
                    approved: over.quantity,
                    requested: line.requested_quantity,
                });
            }
            line.approved_quantity = Some(over.quantity);
        }
        for line in &mut request.items {
            if line.approved_quantity.is_none() {
                line.approved_quantity = Some(line.requested_quantity);
            }
        }

        request.status = next;
        request.approver_id = Some(approver_id.to_string());
        request.approved_at = Some(Utc::now());
        if note.is_some() {
            request.admin_note = note;
        }

        let committed = self.commit(expected, Trigger::Approve, request).await?;
        tracing::info!(
            request_id = %id,
            approver = %approver_id,
            approved_units = committed.total_approved(),
            "transfer request approved"
        );
        Ok(committed)
    }

    /// PENDING -> REJECTED: record who declined; no stock effect
    pub async fn reject(
        &self,
        id: Uuid,
        approver_id: &str,
        note: Option<String>,
    ) -> Result<TransferRequest, TransferError> {
        self.ensure_approver(approver_id).await?;

        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut request = self.load(id).await?;
        let expected = request.status;
        request.status = machine::ensure(expected, Trigger::Reject)?;
        request.approver_id = Some(approver_id.to_string());
        if note.is_some() {
            request.admin_note = note;
        }

        let committed = self.commit(expected, Trigger::Reject, request).await?;
        tracing::info!(request_id = %id, approver = %approver_id, "transfer request rejected");
        Ok(committed)
    }

    /// APPROVED -> SHIPPING: status flip only. Stock is not held while
    /// goods are on the road; the authoritative check runs at delivery.
    pub async fn start_shipping(&self, id: Uuid) -> Result<TransferRequest, TransferError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut request = self.load(id).await?;
        let expected = request.status;
        request.status = machine::ensure(expected, Trigger::StartShipping)?;

        let committed = self.commit(expected, Trigger::StartShipping, request).await?;
        tracing::info!(request_id = %id, "transfer request shipping");
        Ok(committed)
    }

    /// SHIPPING -> DELIVERED: move stock for every line atomically, then
    /// flip the status. On `InsufficientStock` nothing is applied and the
    /// request stays SHIPPING for the operator to reconcile and retry.
    pub async fn complete_delivery(&self, id: Uuid) -> Result<TransferRequest, TransferError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut request = self.load(id).await?;
        let expected = request.status;
        let next = machine::ensure(expected, Trigger::CompleteDelivery)?;

        let movements: Vec<StockMovement> = request
            .items
            .iter()
            .map(|line| {
                StockMovement::new(
                    line.product_id,
                    line.approved_quantity.unwrap_or(line.requested_quantity),
                )
            })
            .collect();

        self.ledger
            .reserve_and_transfer(
                request.source_warehouse_id,
                request.destination_warehouse_id,
                &movements,
            )
            .await?;

        request.status = next;
        request.completed_at = Some(Utc::now());

        match self.commit(expected, Trigger::CompleteDelivery, request).await {
            Ok(committed) => {
                tracing::info!(
                    request_id = %id,
                    units_moved = committed.total_approved(),
                    "transfer request delivered"
                );
                Ok(committed)
            }
            Err(err) => {
                // Stock has already moved; only an out-of-band writer can
                // lose this CAS. Surface the conflict for reconciliation
                // rather than re-running the mutation.
                tracing::error!(
                    request_id = %id,
                    error = %err,
                    "stock applied but delivery status flip lost a race"
                );
                Err(err)
            }
        }
    }

    /// PENDING/APPROVED -> CANCELLED: status flip only; delivery has not
    /// consumed stock yet
    pub async fn cancel(&self, id: Uuid) -> Result<TransferRequest, TransferError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut request = self.load(id).await?;
        let expected = request.status;
        request.status = machine::ensure(expected, Trigger::Cancel)?;

        let committed = self.commit(expected, Trigger::Cancel, request).await?;
        tracing::info!(request_id = %id, "transfer request cancelled");
        Ok(committed)
    }

    async fn ensure_approver(&self, principal_id: &str) -> Result<(), TransferError> {
        let authorized = self
            .approvers
            .is_authorized_approver(principal_id)
            .await
            .map_err(TransferError::storage)?;
        if authorized {
            Ok(())
        } else {
            Err(TransferError::Forbidden(principal_id.to_string()))
        }
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load(&self, id: Uuid) -> Result<TransferRequest, TransferError> {
        self.repo
            .get(id)
            .await
            .map_err(TransferError::storage)?
            .ok_or(TransferError::NotFound(id))
    }

    /// Commit through the repository CAS. A false swap means another
    /// writer transitioned the record first; re-read and report the
    /// trigger as illegal from the status that is actually stored.
    async fn commit(
        &self,
        expected: TransferStatus,
        trigger: Trigger,
        updated: TransferRequest,
    ) -> Result<TransferRequest, TransferError> {
        let swapped = self
            .repo
            .update_if_status(expected, &updated)
            .await
            .map_err(TransferError::storage)?;
        if swapped {
            return Ok(updated);
        }

        let current = self.load(updated.id).await?;
        Err(TransferError::IllegalTransition {
            from: current.status,
            trigger,
        })
    }
}
