use uuid::Uuid;

use crate::error::{TransferError, ValidationError, Violation};
use stockflow_core::ledger::StockLedger;
use stockflow_shared::models::transfer::{TransferLineItem, TransferRequest};

#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Caller input for a new transfer request
#[derive(Debug, Clone)]
pub struct NewTransferRequest {
    pub destination_warehouse_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub requester_id: String,
    pub items: Vec<NewLineItem>,
    pub note: Option<String>,
}

/// Validate caller input against the ledger and produce a PENDING
/// request. Collects every violation rather than stopping at the first,
/// so the caller can fix the whole submission in one pass.
///
/// The stock check here is advisory: stock can move between validation
/// and delivery, and the authoritative check runs again inside
/// `reserve_and_transfer` when the delivery completes.
pub async fn build(
    input: NewTransferRequest,
    ledger: &dyn StockLedger,
) -> Result<TransferRequest, TransferError> {
    let mut violations = Vec::new();

    if input.destination_warehouse_id == input.source_warehouse_id {
        violations.push(Violation::SameWarehouse);
    }

    if input.items.is_empty() {
        violations.push(Violation::NoLineItems);
    }

    for (index, line) in input.items.iter().enumerate() {
        if line.quantity <= 0 {
            violations.push(Violation::NonPositiveQuantity {
                line: index,
                product_id: line.product_id,
                quantity: line.quantity,
            });
            continue;
        }

        let available = ledger
            .available(input.source_warehouse_id, line.product_id)
            .await?;
        if line.quantity > available {
            violations.push(Violation::InsufficientAvailability {
                line: index,
                product_id: line.product_id,
                requested: line.quantity,
                available,
            });
        }
    }

    if !violations.is_empty() {
        return Err(ValidationError { violations }.into());
    }

    let items = input
        .items
        .into_iter()
        .map(|line| TransferLineItem::new(line.product_id, line.quantity))
        .collect();

    Ok(TransferRequest::new(
        input.destination_warehouse_id,
        input.source_warehouse_id,
        input.requester_id,
        items,
        input.note,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockflow_core::ledger::StockLedger;
    use stockflow_inventory::InMemoryStockLedger;
    use stockflow_shared::models::transfer::TransferStatus;

    fn input(
        destination: Uuid,
        source: Uuid,
        items: Vec<NewLineItem>,
    ) -> NewTransferRequest {
        NewTransferRequest {
            destination_warehouse_id: destination,
            source_warehouse_id: source,
            requester_id: "staff-1".to_string(),
            items,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_builds_pending_request() {
        let ledger = InMemoryStockLedger::new();
        let source = Uuid::new_v4();
        let destination = Uuid::new_v4();
        let product = Uuid::new_v4();
        ledger.set_available(source, product, 50).await.unwrap();

        let request = build(
            input(
                destination,
                source,
                vec![NewLineItem {
                    product_id: product,
                    quantity: 30,
                }],
            ),
            &ledger,
        )
        .await
        .unwrap();

        assert_eq!(request.status, TransferStatus::Pending);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].requested_quantity, 30);
        assert_eq!(request.items[0].approved_quantity, None);
        assert!(request.approved_at.is_none());
    }

    #[tokio::test]
    async fn test_collects_every_violation() {
        let ledger = InMemoryStockLedger::new();
        let warehouse = Uuid::new_v4();
        let product_a = Uuid::new_v4();
        let product_b = Uuid::new_v4();
        ledger.set_available(warehouse, product_b, 5).await.unwrap();

        let err = build(
            input(
                warehouse,
                warehouse,
                vec![
                    NewLineItem {
                        product_id: product_a,
                        quantity: 0,
                    },
                    NewLineItem {
                        product_id: product_b,
                        quantity: 10,
                    },
                ],
            ),
            &ledger,
        )
        .await
        .unwrap_err();

        let TransferError::Validation(validation) = err else {
            panic!("expected validation error");
        };
        assert_eq!(validation.violations.len(), 3);
        assert!(validation.violations.contains(&Violation::SameWarehouse));
        assert!(validation.violations.contains(&Violation::NonPositiveQuantity {
            line: 0,
            product_id: product_a,
            quantity: 0,
        }));
        assert!(validation
            .violations
            .contains(&Violation::InsufficientAvailability {
                line: 1,
                product_id: product_b,
                requested: 10,
                available: 5,
            }));
    }

    #[tokio::test]
    async fn test_rejects_empty_items() {
        let ledger = InMemoryStockLedger::new();
        let err = build(input(Uuid::new_v4(), Uuid::new_v4(), vec![]), &ledger)
            .await
            .unwrap_err();

        let TransferError::Validation(validation) = err else {
            panic!("expected validation error");
        };
        assert_eq!(validation.violations, vec![Violation::NoLineItems]);
    }

    #[tokio::test]
    async fn test_unseeded_stock_reads_as_zero() {
        let ledger = InMemoryStockLedger::new();
        let source = Uuid::new_v4();
        let product = Uuid::new_v4();

        let err = build(
            input(
                Uuid::new_v4(),
                source,
                vec![NewLineItem {
                    product_id: product,
                    quantity: 1,
                }],
            ),
            &ledger,
        )
        .await
        .unwrap_err();

        let TransferError::Validation(validation) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            validation.violations,
            vec![Violation::InsufficientAvailability {
                line: 0,
                product_id: product,
                requested: 1,
                available: 0,
            }]
        );
    }
}
