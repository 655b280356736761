pub mod models;

pub use models::transfer::{TransferLineItem, TransferRequest, TransferStatus};
