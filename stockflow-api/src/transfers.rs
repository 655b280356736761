use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit;
use crate::error::AppError;
use crate::middleware::auth::StaffClaims;
use crate::state::AppState;
use stockflow_shared::models::events::{
    TransferApprovedEvent, TransferCancelledEvent, TransferDeliveredEvent, TransferRejectedEvent,
    TransferRequestedEvent, TransferShippedEvent,
};
use stockflow_shared::models::transfer::{TransferRequest, TransferStatus};
use stockflow_transfer::{machine, LineOverride, NewLineItem, NewTransferRequest};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTransferBody {
    pub destination_warehouse_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub items: Vec<CreateTransferLine>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransferLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct ApproveTransferBody {
    #[serde(default)]
    pub overrides: Vec<ApproveLineOverride>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveLineOverride {
    pub product_id: Uuid,
    pub approved_quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct RejectTransferBody {
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTransfersQuery {
    pub warehouse_id: Uuid,
    pub status: Option<TransferStatus>,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub status: TransferStatus,
    pub items: Vec<TransferLineResponse>,
    pub requester_id: String,
    pub approver_id: Option<String>,
    pub request_note: Option<String>,
    pub admin_note: Option<String>,
    /// Operations currently legal for this request; the admin console
    /// renders its buttons off this list
    pub available_actions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TransferLineResponse {
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub product_image_url: Option<String>,
    pub requested_quantity: i32,
    pub approved_quantity: Option<i32>,
}

impl TransferResponse {
    fn from_request(request: TransferRequest) -> Self {
        let available_actions = machine::triggers_from(request.status)
            .iter()
            .map(|trigger| trigger.as_str().to_string())
            .collect();

        Self {
            id: request.id,
            destination_warehouse_id: request.destination_warehouse_id,
            source_warehouse_id: request.source_warehouse_id,
            status: request.status,
            items: request
                .items
                .into_iter()
                .map(|line| TransferLineResponse {
                    product_id: line.product_id,
                    product_name: None,
                    product_image_url: None,
                    requested_quantity: line.requested_quantity,
                    approved_quantity: line.approved_quantity,
                })
                .collect(),
            requester_id: request.requester_id,
            approver_id: request.approver_id,
            request_note: request.request_note,
            admin_note: request.admin_note,
            available_actions,
            created_at: request.created_at,
            approved_at: request.approved_at,
            completed_at: request.completed_at,
        }
    }

    /// Attach catalog name/image to each line. Display-only: a catalog
    /// miss or failure never blocks the response.
    async fn enriched(request: TransferRequest, state: &AppState) -> Self {
        let mut response = Self::from_request(request);
        for line in &mut response.items {
            if let Ok(Some(summary)) = state.catalog.product_summary(line.product_id).await {
                line.product_name = Some(summary.name);
                line.product_image_url = summary.image_url;
            }
        }
        response
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/transfers
/// Submit a new transfer request; the acting staffer is the requester
pub async fn create_transfer(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    Json(body): Json<CreateTransferBody>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    let input = NewTransferRequest {
        destination_warehouse_id: body.destination_warehouse_id,
        source_warehouse_id: body.source_warehouse_id,
        requester_id: claims.sub,
        items: body
            .items
            .into_iter()
            .map(|line| NewLineItem {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect(),
        note: body.note,
    };

    let request = state.transfers.create(input).await?;

    audit::record(
        "transfer_requested",
        &TransferRequestedEvent {
            request_id: request.id,
            source_warehouse_id: request.source_warehouse_id,
            destination_warehouse_id: request.destination_warehouse_id,
            requester_id: request.requester_id.clone(),
            line_count: request.items.len(),
            total_requested: request.total_requested(),
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse::from_request(request)),
    ))
}

/// GET /v1/transfers/:id
/// Retrieve one request with product-enriched line items
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransferResponse>, AppError> {
    let request = state.queries.get_request(id).await?;
    Ok(Json(TransferResponse::enriched(request, &state).await))
}

/// GET /v1/transfers?warehouse_id=&status=
/// List requests touching a warehouse, newest first
pub async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<ListTransfersQuery>,
) -> Result<Json<Vec<TransferResponse>>, AppError> {
    let requests = state
        .queries
        .list_requests(query.warehouse_id, query.status)
        .await?;

    Ok(Json(
        requests
            .into_iter()
            .map(TransferResponse::from_request)
            .collect(),
    ))
}

/// POST /v1/transfers/:id/approve
pub async fn approve_transfer(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    Path(id): Path<Uuid>,
    Json(body): Json<ApproveTransferBody>,
) -> Result<Json<TransferResponse>, AppError> {
    let overrides: Vec<LineOverride> = body
        .overrides
        .iter()
        .map(|over| LineOverride {
            product_id: over.product_id,
            quantity: over.approved_quantity,
        })
        .collect();

    let request = state
        .transfers
        .approve(id, &claims.sub, &overrides, body.note)
        .await?;

    audit::record(
        "transfer_approved",
        &TransferApprovedEvent {
            request_id: id,
            approver_id: claims.sub,
            total_approved: request.total_approved(),
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(Json(TransferResponse::from_request(request)))
}

/// POST /v1/transfers/:id/reject
pub async fn reject_transfer(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectTransferBody>,
) -> Result<Json<TransferResponse>, AppError> {
    let request = state.transfers.reject(id, &claims.sub, body.note).await?;

    audit::record(
        "transfer_rejected",
        &TransferRejectedEvent {
            request_id: id,
            approver_id: claims.sub,
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(Json(TransferResponse::from_request(request)))
}

/// POST /v1/transfers/:id/ship
/// Goods leave the source warehouse; stock is still not held
pub async fn ship_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransferResponse>, AppError> {
    let request = state.transfers.start_shipping(id).await?;

    audit::record(
        "transfer_shipped",
        &TransferShippedEvent {
            request_id: id,
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(Json(TransferResponse::from_request(request)))
}

/// POST /v1/transfers/:id/deliver
/// Authoritative stock movement happens here, all lines or none
pub async fn deliver_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransferResponse>, AppError> {
    let request = state.transfers.complete_delivery(id).await?;

    audit::record(
        "transfer_delivered",
        &TransferDeliveredEvent {
            request_id: id,
            source_warehouse_id: request.source_warehouse_id,
            destination_warehouse_id: request.destination_warehouse_id,
            units_moved: request.total_approved(),
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(Json(TransferResponse::from_request(request)))
}

/// POST /v1/transfers/:id/cancel
pub async fn cancel_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransferResponse>, AppError> {
    let request = state.transfers.cancel(id).await?;

    audit::record(
        "transfer_cancelled",
        &TransferCancelledEvent {
            request_id: id,
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(Json(TransferResponse::from_request(request)))
}
