use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TransferRequestedEvent {
    pub request_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub requester_id: String,
    pub line_count: usize,
    pub total_requested: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TransferApprovedEvent {
    pub request_id: Uuid,
    pub approver_id: String,
    pub total_approved: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TransferRejectedEvent {
    pub request_id: Uuid,
    pub approver_id: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TransferShippedEvent {
    pub request_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TransferDeliveredEvent {
    pub request_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub units_moved: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TransferCancelledEvent {
    pub request_id: Uuid,
    pub timestamp: i64,
}
