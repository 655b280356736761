use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use stockflow_core::ledger::{LedgerError, Shortage, StockLedger, StockMovement};

/// Postgres stock ledger. Each transfer runs in one transaction that
/// takes `SELECT ... FOR UPDATE` row locks on every involved
/// `(warehouse, product)` key in sorted key order, so concurrent
/// transfers serialize per key without deadlocking.
pub struct PgStockLedger {
    pool: PgPool,
}

impl PgStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(err: sqlx::Error) -> LedgerError {
    LedgerError::Storage(err.to_string())
}

#[async_trait]
impl StockLedger for PgStockLedger {
    async fn available(&self, warehouse_id: Uuid, product_id: Uuid) -> Result<i32, LedgerError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT available_quantity FROM stock_ledger \
             WHERE warehouse_id = $1 AND product_id = $2",
        )
        .bind(warehouse_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(quantity.unwrap_or(0))
    }

    async fn reserve_and_transfer(
        &self,
        source_warehouse_id: Uuid,
        destination_warehouse_id: Uuid,
        movements: &[StockMovement],
    ) -> Result<(), LedgerError> {
        // Net delta per key; a product repeated across lines aggregates.
        let mut deltas: BTreeMap<(Uuid, Uuid), i32> = BTreeMap::new();
        for movement in movements {
            if movement.quantity <= 0 {
                return Err(LedgerError::InvalidQuantity(movement.quantity));
            }
            *deltas
                .entry((source_warehouse_id, movement.product_id))
                .or_insert(0) -= movement.quantity;
            *deltas
                .entry((destination_warehouse_id, movement.product_id))
                .or_insert(0) += movement.quantity;
        }

        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Lock every key in sorted order, recording what is on hand.
        let mut on_hand: BTreeMap<(Uuid, Uuid), i32> = BTreeMap::new();
        for key in deltas.keys() {
            let quantity = sqlx::query_scalar::<_, i32>(
                "SELECT available_quantity FROM stock_ledger \
                 WHERE warehouse_id = $1 AND product_id = $2 FOR UPDATE",
            )
            .bind(key.0)
            .bind(key.1)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;
            on_hand.insert(*key, quantity.unwrap_or(0));
        }

        let shortages: Vec<Shortage> = deltas
            .iter()
            .filter(|(key, delta)| **delta < 0 && on_hand[*key] + **delta < 0)
            .map(|(key, delta)| Shortage {
                product_id: key.1,
                requested: -delta,
                available: on_hand[key],
            })
            .collect();

        if !shortages.is_empty() {
            // Dropping the transaction rolls it back; nothing applied.
            return Err(LedgerError::InsufficientStock {
                warehouse_id: source_warehouse_id,
                shortages,
            });
        }

        for (key, delta) in &deltas {
            sqlx::query(
                "INSERT INTO stock_ledger (warehouse_id, product_id, available_quantity) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (warehouse_id, product_id) \
                 DO UPDATE SET available_quantity = stock_ledger.available_quantity + EXCLUDED.available_quantity",
            )
            .bind(key.0)
            .bind(key.1)
            .bind(*delta)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn set_available(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), LedgerError> {
        if quantity < 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }

        sqlx::query(
            "INSERT INTO stock_ledger (warehouse_id, product_id, available_quantity) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (warehouse_id, product_id) \
             DO UPDATE SET available_quantity = EXCLUDED.available_quantity",
        )
        .bind(warehouse_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }
}
