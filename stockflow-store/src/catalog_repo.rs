use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stockflow_core::catalog::{ProductCatalog, ProductSummary};
use stockflow_core::BoxError;

/// Read-only view into the catalog subsystem's products table, used to
/// attach name/image to transfer line items for display.
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    image_url: Option<String>,
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn product_summary(&self, product_id: Uuid) -> Result<Option<ProductSummary>, BoxError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, image_url FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ProductSummary {
            product_id: row.id,
            name: row.name,
            image_url: row.image_url,
        }))
    }
}
