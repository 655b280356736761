use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BoxError;

/// Read-only product metadata attached to request line items for
/// display. Never consulted for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
}

/// Catalog lookup consumed from the product subsystem
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product_summary(&self, product_id: Uuid) -> Result<Option<ProductSummary>, BoxError>;
}
