pub mod ledger;
pub mod product;

pub use ledger::InMemoryStockLedger;
pub use product::StaticProductCatalog;
