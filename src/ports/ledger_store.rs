//! Ledger store port - the transactional boundary of the core.
//!
//! Every mutating operation commits through this port as a single atomic
//! unit: the account write, the catalog write (for redemptions), and the
//! audit event land together or not at all. Concurrency control is
//! optimistic: commits carry the version observed at read time and fail
//! with `VersionConflict` when a concurrent request won the race.

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::catalog::CatalogItem;
use crate::domain::ledger::{EventKind, LedgerAccount, LedgerEvent};
use async_trait::async_trait;

/// A ledger account together with the storage version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedAccount {
    pub account: LedgerAccount,
    pub version: u64,
}

/// Store port for ledger accounts and the append-only audit trail.
///
/// Implementations must guarantee:
/// - serializability per account (version-guarded commits)
/// - serializability per catalog item for joint redemption commits
/// - the audit event is persisted in the same atomic unit as the balance
///   change, never separately
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Finds an account with its current version. Returns `None` if the
    /// user has never been written.
    async fn find_account(&self, user_id: &UserId) -> Result<Option<VersionedAccount>, DomainError>;

    /// Inserts a freshly opened account and returns its initial version.
    ///
    /// # Errors
    ///
    /// - `AccountAlreadyExists` if another request created it first
    /// - `DatabaseError` on persistence failure
    async fn insert_account(&self, account: &LedgerAccount) -> Result<u64, DomainError>;

    /// Commits an accrual: updated account plus its audit event.
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if the account changed since `expected_version`
    /// - `DuplicateReference` if an accrual event with the same
    ///   `(user_id, kind, reference)` already exists (non-empty references
    ///   only)
    /// - `DatabaseError` on persistence failure
    async fn commit_accrual(
        &self,
        account: &LedgerAccount,
        expected_version: u64,
        event: &LedgerEvent,
    ) -> Result<(), DomainError>;

    /// Commits a redemption: updated account, updated catalog item, and the
    /// audit event, all in one atomic unit.
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if either the account or the item changed since
    ///   the observed versions
    /// - `DatabaseError` on persistence failure
    async fn commit_redemption(
        &self,
        account: &LedgerAccount,
        expected_version: u64,
        item: &CatalogItem,
        expected_item_version: u64,
        event: &LedgerEvent,
    ) -> Result<(), DomainError>;

    /// Looks up an accrual event by its idempotency key.
    async fn find_accrual_by_reference(
        &self,
        user_id: &UserId,
        kind: EventKind,
        reference: &str,
    ) -> Result<Option<LedgerEvent>, DomainError>;

    /// Pages through a user's events, most recent first. `page` is
    /// zero-based.
    async fn history(
        &self,
        user_id: &UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<LedgerEvent>, DomainError>;

    /// Returns all of a user's events in chronological order, for
    /// reconciliation replays.
    async fn events_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEvent>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn LedgerStore) {}
    }
}
