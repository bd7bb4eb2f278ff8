//! Catalog repository port (read side, plus administrative seeding).
//!
//! The Redemption Engine reads items here and writes them back through
//! `LedgerStore::commit_redemption`, which is the only core mutation path.

use crate::domain::catalog::CatalogItem;
use crate::domain::foundation::{CatalogItemId, DomainError, Timestamp};
use async_trait::async_trait;

/// A catalog item together with the storage version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedItem {
    pub item: CatalogItem,
    pub version: u64,
}

/// Repository port for reward catalog items.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Finds an item with its current version. Returns `None` if unknown.
    async fn find_item(&self, id: &CatalogItemId) -> Result<Option<VersionedItem>, DomainError>;

    /// Lists items currently available for redemption: Active, unexpired at
    /// `now`, with inventory remaining.
    async fn list_available(&self, now: Timestamp) -> Result<Vec<CatalogItem>, DomainError>;

    /// Inserts a new item and returns its initial version.
    ///
    /// Administrative seeding only; item lifecycle management is handled
    /// outside this core.
    async fn insert_item(&self, item: &CatalogItem) -> Result<u64, DomainError>;
}
