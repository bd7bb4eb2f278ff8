//! Ports - interfaces between the engines and storage.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! domain and the outside world. Adapters implement these ports.
//!
//! - `LedgerStore` - atomic commit boundary for accounts and audit events
//! - `CatalogRepository` - catalog item lookup and listing

mod catalog_repository;
mod ledger_store;

pub use catalog_repository::{CatalogRepository, VersionedItem};
pub use ledger_store::{LedgerStore, VersionedAccount};
