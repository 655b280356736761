use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stockflow_core::repository::TransferRepository;
use stockflow_core::BoxError;
use stockflow_shared::models::transfer::{TransferLineItem, TransferRequest, TransferStatus};

pub struct PgTransferRepository {
    pool: PgPool,
}

impl PgTransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lines_for(&self, request_id: Uuid) -> Result<Vec<TransferLineItem>, BoxError> {
        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT product_id, requested_quantity, approved_quantity \
             FROM transfer_line_items WHERE request_id = $1 ORDER BY position",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TransferLineItem {
                product_id: row.product_id,
                requested_quantity: row.requested_quantity,
                approved_quantity: row.approved_quantity,
            })
            .collect())
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    destination_warehouse_id: Uuid,
    source_warehouse_id: Uuid,
    status: String,
    requester_id: String,
    approver_id: Option<String>,
    request_note: Option<String>,
    admin_note: Option<String>,
    created_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct LineRow {
    product_id: Uuid,
    requested_quantity: i32,
    approved_quantity: Option<i32>,
}

impl RequestRow {
    fn into_request(self, items: Vec<TransferLineItem>) -> Result<TransferRequest, BoxError> {
        let status: TransferStatus = self.status.parse().map_err(BoxError::from)?;
        Ok(TransferRequest {
            id: self.id,
            destination_warehouse_id: self.destination_warehouse_id,
            source_warehouse_id: self.source_warehouse_id,
            status,
            items,
            requester_id: self.requester_id,
            approver_id: self.approver_id,
            request_note: self.request_note,
            admin_note: self.admin_note,
            created_at: self.created_at,
            approved_at: self.approved_at,
            completed_at: self.completed_at,
        })
    }
}

const SELECT_REQUEST: &str = "SELECT id, destination_warehouse_id, source_warehouse_id, status, \
     requester_id, approver_id, request_note, admin_note, created_at, approved_at, completed_at \
     FROM transfer_requests";

#[async_trait]
impl TransferRepository for PgTransferRepository {
    async fn create(&self, request: &TransferRequest) -> Result<(), BoxError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO transfer_requests \
             (id, destination_warehouse_id, source_warehouse_id, status, requester_id, \
              approver_id, request_note, admin_note, created_at, approved_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(request.id)
        .bind(request.destination_warehouse_id)
        .bind(request.source_warehouse_id)
        .bind(request.status.as_str())
        .bind(&request.requester_id)
        .bind(request.approver_id.as_deref())
        .bind(request.request_note.as_deref())
        .bind(request.admin_note.as_deref())
        .bind(request.created_at)
        .bind(request.approved_at)
        .bind(request.completed_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in request.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO transfer_line_items \
                 (request_id, position, product_id, requested_quantity, approved_quantity) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(request.id)
            .bind(position as i32)
            .bind(line.product_id)
            .bind(line.requested_quantity)
            .bind(line.approved_quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<TransferRequest>, BoxError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!("{SELECT_REQUEST} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.lines_for(id).await?;
                Ok(Some(row.into_request(items)?))
            }
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        warehouse_id: Uuid,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, BoxError> {
        let rows: Vec<RequestRow> = match status {
            Some(status) => {
                sqlx::query_as::<_, RequestRow>(&format!(
                    "{SELECT_REQUEST} \
                     WHERE (source_warehouse_id = $1 OR destination_warehouse_id = $1) \
                     AND status = $2 ORDER BY created_at DESC"
                ))
                .bind(warehouse_id)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, RequestRow>(&format!(
                    "{SELECT_REQUEST} \
                     WHERE (source_warehouse_id = $1 OR destination_warehouse_id = $1) \
                     ORDER BY created_at DESC"
                ))
                .bind(warehouse_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut requests = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.lines_for(row.id).await?;
            requests.push(row.into_request(items)?);
        }
        Ok(requests)
    }

    async fn update_if_status(
        &self,
        expected: TransferStatus,
        updated: &TransferRequest,
    ) -> Result<bool, BoxError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE transfer_requests \
             SET status = $1, approver_id = $2, admin_note = $3, approved_at = $4, completed_at = $5 \
             WHERE id = $6 AND status = $7",
        )
        .bind(updated.status.as_str())
        .bind(updated.approver_id.as_deref())
        .bind(updated.admin_note.as_deref())
        .bind(updated.approved_at)
        .bind(updated.completed_at)
        .bind(updated.id)
        .bind(expected.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for (position, line) in updated.items.iter().enumerate() {
            sqlx::query(
                "UPDATE transfer_line_items SET approved_quantity = $1 \
                 WHERE request_id = $2 AND position = $3",
            )
            .bind(line.approved_quantity)
            .bind(updated.id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
