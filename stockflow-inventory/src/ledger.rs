use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use stockflow_core::ledger::{LedgerError, Shortage, StockLedger, StockMovement};

type StockKey = (Uuid, Uuid); // (warehouse_id, product_id)

/// In-memory stock ledger with a per-key lock table.
///
/// Each `(warehouse, product)` counter sits behind its own mutex so
/// unrelated warehouses never contend. Multi-key operations acquire
/// locks in globally sorted key order, which keeps concurrent transfers
/// deadlock-free.
pub struct InMemoryStockLedger {
    entries: DashMap<StockKey, Arc<Mutex<i32>>>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    fn entry(&self, key: StockKey) -> Arc<Mutex<i32>> {
        self.entries
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(0)))
            .clone()
    }

    fn lock(cell: &Mutex<i32>) -> MutexGuard<'_, i32> {
        // Counter arithmetic cannot panic mid-update; tolerate poisoning.
        cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryStockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn available(&self, warehouse_id: Uuid, product_id: Uuid) -> Result<i32, LedgerError> {
        Ok(self
            .entries
            .get(&(warehouse_id, product_id))
            .map(|cell| *Self::lock(cell.value()))
            .unwrap_or(0))
    }

    async fn reserve_and_transfer(
        &self,
        source_warehouse_id: Uuid,
        destination_warehouse_id: Uuid,
        movements: &[StockMovement],
    ) -> Result<(), LedgerError> {
        // Net delta per key; a product repeated across lines aggregates.
        let mut deltas: BTreeMap<StockKey, i32> = BTreeMap::new();
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

        // BTreeMap iteration gives the sorted acquisition order.
        let cells: Vec<(StockKey, i32, Arc<Mutex<i32>>)> = deltas
            .iter()
            .map(|(key, delta)| (*key, *delta, self.entry(*key)))
            .collect();
        let mut guards: Vec<(StockKey, i32, MutexGuard<'_, i32>)> = cells
            .iter()
            .map(|(key, delta, cell)| (*key, *delta, Self::lock(cell)))
            .collect();

        // Verify every outgoing key before touching any counter.
        let shortages: Vec<Shortage> = guards
            .iter()
            .filter(|(_, delta, guard)| *delta < 0 && **guard + delta < 0)
            .map(|((_, product_id), delta, guard)| Shortage {
                product_id: *product_id,
                requested: -delta,
                available: **guard,
            })
            .collect();

        if !shortages.is_empty() {
            return Err(LedgerError::InsufficientStock {
                warehouse_id: source_warehouse_id,
                shortages,
            });
        }

        for (_, delta, guard) in guards.iter_mut() {
            **guard += *delta;
        }

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

        let cell = self.entry((warehouse_id, product_id));
        *Self::lock(&cell) = quantity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transfer_lifecycle() {
        let ledger = InMemoryStockLedger::new();
        let warehouse_a = Uuid::new_v4();
        let warehouse_b = Uuid::new_v4();
        let product = Uuid::new_v4();

        ledger.set_available(warehouse_a, product, 50).await.unwrap();
        assert_eq!(ledger.available(warehouse_a, product).await.unwrap(), 50);
        assert_eq!(ledger.available(warehouse_b, product).await.unwrap(), 0);

        ledger
            .reserve_and_transfer(warehouse_a, warehouse_b, &[StockMovement::new(product, 30)])
            .await
            .unwrap();

        assert_eq!(ledger.available(warehouse_a, product).await.unwrap(), 20);
        assert_eq!(ledger.available(warehouse_b, product).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_insufficient_stock_reports_shortage() {
        let ledger = InMemoryStockLedger::new();
        let warehouse_a = Uuid::new_v4();
        let warehouse_b = Uuid::new_v4();
        let product = Uuid::new_v4();

        ledger.set_available(warehouse_a, product, 20).await.unwrap();

        let err = ledger
            .reserve_and_transfer(warehouse_a, warehouse_b, &[StockMovement::new(product, 25)])
            .await
            .unwrap_err();

        match err {
            LedgerError::InsufficientStock {
                warehouse_id,
                shortages,
            } => {
                assert_eq!(warehouse_id, warehouse_a);
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].product_id, product);
                assert_eq!(shortages[0].requested, 25);
                assert_eq!(shortages[0].available, 20);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Nothing moved.
        assert_eq!(ledger.available(warehouse_a, product).await.unwrap(), 20);
        assert_eq!(ledger.available(warehouse_b, product).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multi_line_all_or_nothing() {
        let ledger = InMemoryStockLedger::new();
        let warehouse_a = Uuid::new_v4();
        let warehouse_b = Uuid::new_v4();
        let plentiful = Uuid::new_v4();
        let scarce = Uuid::new_v4();

        ledger
            .set_available(warehouse_a, plentiful, 100)
            .await
            .unwrap();
        ledger.set_available(warehouse_a, scarce, 1).await.unwrap();

        let err = ledger
            .reserve_and_transfer(
                warehouse_a,
                warehouse_b,
                &[
                    StockMovement::new(plentiful, 10),
                    StockMovement::new(scarce, 5),
                ],
            )
            .await
            .unwrap_err();

        match err {
            LedgerError::InsufficientStock { shortages, .. } => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].product_id, scarce);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // The satisfiable line must not have been applied either.
        assert_eq!(ledger.available(warehouse_a, plentiful).await.unwrap(), 100);
        assert_eq!(ledger.available(warehouse_b, plentiful).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_movement() {
        let ledger = InMemoryStockLedger::new();
        let warehouse_a = Uuid::new_v4();
        let warehouse_b = Uuid::new_v4();
        let product = Uuid::new_v4();

        let err = ledger
            .reserve_and_transfer(warehouse_a, warehouse_b, &[StockMovement::new(product, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidQuantity(0)));

        let err = ledger.set_available(warehouse_a, product, -5).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidQuantity(-5)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_transfers_exactly_one_wins() {
        let ledger = Arc::new(InMemoryStockLedger::new());
        let warehouse_a = Uuid::new_v4();
        let warehouse_b = Uuid::new_v4();
        let warehouse_c = Uuid::new_v4();
        let product = Uuid::new_v4();

        ledger
            .set_available(warehouse_a, product, 100)
            .await
            .unwrap();

        // Two transfers each draw 80 of the same 100 units.
        let first = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .reserve_and_transfer(
                        warehouse_a,
                        warehouse_b,
                        &[StockMovement::new(product, 80)],
                    )
                    .await
            })
        };
        let second = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .reserve_and_transfer(
                        warehouse_a,
                        warehouse_c,
                        &[StockMovement::new(product, 80)],
                    )
                    .await
            })
        };

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        let successes = outcomes.iter().filter(|o| o.is_ok()).count();
        assert_eq!(successes, 1, "exactly one racing transfer may win");

        let remaining = ledger.available(warehouse_a, product).await.unwrap();
        assert_eq!(remaining, 20);
        assert!(remaining >= 0);

        let delivered = ledger.available(warehouse_b, product).await.unwrap()
            + ledger.available(warehouse_c, product).await.unwrap();
        assert_eq!(delivered, 80);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_burst_conserves_stock() {
        let ledger = Arc::new(InMemoryStockLedger::new());
        let warehouse_a = Uuid::new_v4();
        let warehouse_b = Uuid::new_v4();
        let product = Uuid::new_v4();

        ledger
            .set_available(warehouse_a, product, 100)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .reserve_and_transfer(
                        warehouse_a,
                        warehouse_b,
                        &[StockMovement::new(product, 10)],
                    )
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.available(warehouse_a, product).await.unwrap(), 0);
        assert_eq!(ledger.available(warehouse_b, product).await.unwrap(), 100);
    }
}
