use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use stockflow_core::catalog::{ProductCatalog, ProductSummary};
use stockflow_core::BoxError;

/// In-memory product directory used by tests and dev wiring. The real
/// catalog lives in the product subsystem; the transfer core only ever
/// reads id/name/image from it.
pub struct StaticProductCatalog {
    products: HashMap<Uuid, ProductSummary>,
}

impl StaticProductCatalog {
    pub fn new() -> Self {
        Self {
            products: HashMap::new(),
        }
    }

    pub fn insert(&mut self, summary: ProductSummary) {
        self.products.insert(summary.product_id, summary);
    }
}

impl Default for StaticProductCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductCatalog for StaticProductCatalog {
    async fn product_summary(&self, product_id: Uuid) -> Result<Option<ProductSummary>, BoxError> {
        Ok(self.products.get(&product_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup() {
        let mut catalog = StaticProductCatalog::new();
        let product_id = Uuid::new_v4();
        catalog.insert(ProductSummary {
            product_id,
            name: "Canvas Tote".to_string(),
            image_url: Some("https://cdn.example.com/tote.jpg".to_string()),
        });

        let summary = catalog.product_summary(product_id).await.unwrap();
        assert_eq!(summary.map(|s| s.name).as_deref(), Some("Canvas Tote"));

        assert!(catalog
            .product_summary(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
