pub mod catalog;
pub mod identity;
pub mod ledger;
pub mod repository;

/// Error form returned by pluggable storage backends
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
