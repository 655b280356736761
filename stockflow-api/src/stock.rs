use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::{is_stock_admin, StaffClaims};
use crate::state::AppState;
use stockflow_transfer::TransferError;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub available_quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetStockBody {
    pub available_quantity: i32,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/stock/:warehouse_id/:product_id
/// Current availability, straight off the ledger
pub async fn get_available(
    State(state): State<AppState>,
    Path((warehouse_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<StockResponse>, AppError> {
    let available_quantity = state.ledger.available(warehouse_id, product_id).await?;

    Ok(Json(StockResponse {
        warehouse_id,
        product_id,
        available_quantity,
    }))
}

/// PUT /v1/stock/:warehouse_id/:product_id
/// Seed or correct a count (management tier only)
pub async fn set_stock(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    Path((warehouse_id, product_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<SetStockBody>,
) -> Result<Json<StockResponse>, AppError> {
    if !is_stock_admin(&claims) {
        return Err(AppError::Transfer(TransferError::Forbidden(claims.sub)));
    }

    state
        .ledger
        .set_available(warehouse_id, product_id, body.available_quantity)
        .await?;

    tracing::info!(
        warehouse_id = %warehouse_id,
        product_id = %product_id,
        quantity = body.available_quantity,
        actor = %claims.sub,
        "stock count set"
    );

    Ok(Json(StockResponse {
        warehouse_id,
        product_id,
        available_quantity: body.available_quantity,
    }))
}
