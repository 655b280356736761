use std::sync::Arc;

use stockflow_core::catalog::ProductCatalog;
use stockflow_core::ledger::StockLedger;
use stockflow_transfer::{TransferQueryService, TransferService};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub transfers: Arc<TransferService>,
    pub queries: Arc<TransferQueryService>,
    pub ledger: Arc<dyn StockLedger>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub auth: AuthConfig,
}
