pub mod builder;
pub mod error;
pub mod machine;
pub mod query;
pub mod service;
pub mod store;

pub use builder::{NewLineItem, NewTransferRequest};
pub use error::{TransferError, ValidationError, Violation};
pub use machine::Trigger;
pub use query::TransferQueryService;
pub use service::{LineOverride, TransferService};
pub use store::InMemoryTransferStore;

pub use stockflow_shared::models::transfer::{TransferLineItem, TransferRequest, TransferStatus};
