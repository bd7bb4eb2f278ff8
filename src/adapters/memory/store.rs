//! In-memory implementation of the ledger and catalog ports.
//!
//! Commits take a single write lock over the whole store, which makes every
//! commit an atomic unit and gives deterministic behavior for tests. Version
//! counters per record mirror the optimistic-concurrency contract of the
//! postgres adapter, so conflict paths are exercised identically against
//! both.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::catalog::CatalogItem;
use crate::domain::foundation::{CatalogItemId, DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::ledger::{AccountStatus, EventKind, LedgerAccount, LedgerEvent};
use crate::ports::{CatalogRepository, LedgerStore, VersionedAccount, VersionedItem};

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, (LedgerAccount, u64)>,
    items: HashMap<CatalogItemId, (CatalogItem, u64)>,
    /// Append-only, in commit order.
    events: Vec<LedgerEvent>,
    /// Idempotency keys of committed accrual events.
    accrual_refs: HashSet<(String, EventKind, String)>,
}

/// In-memory loyalty store implementing both storage ports.
pub struct InMemoryLoyaltyStore {
    inner: RwLock<Inner>,
}

impl InMemoryLoyaltyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Overrides an account's status. Test support for exercising
    /// suspended/cancelled paths; production status changes go through an
    /// administrative surface outside this core.
    pub fn set_account_status(&self, user_id: &UserId, status: AccountStatus) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if let Some((account, version)) = inner.accounts.get_mut(user_id.as_str()) {
            account.status = status;
            *version += 1;
        }
    }

    /// Total number of committed events, across all users.
    pub fn event_count(&self) -> usize {
        self.inner.read().expect("store lock poisoned").events.len()
    }
}

impl Default for InMemoryLoyaltyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLoyaltyStore {
    async fn find_account(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VersionedAccount>, DomainError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .accounts
            .get(user_id.as_str())
            .map(|(account, version)| VersionedAccount {
                account: account.clone(),
                version: *version,
            }))
    }

    async fn insert_account(&self, account: &LedgerAccount) -> Result<u64, DomainError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let key = account.user_id.as_str().to_string();
        if inner.accounts.contains_key(&key) {
            return Err(DomainError::new(
                ErrorCode::AccountAlreadyExists,
                format!("Account already exists for user {}", account.user_id),
            ));
        }
        inner.accounts.insert(key, (account.clone(), 1));
        Ok(1)
    }

    async fn commit_accrual(
        &self,
        account: &LedgerAccount,
        expected_version: u64,
        event: &LedgerEvent,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().expect("store lock poisoned");

        let key = account.user_id.as_str().to_string();
        let current_version = match inner.accounts.get(&key) {
            Some((_, version)) => *version,
            None => {
                return Err(DomainError::new(
                    ErrorCode::AccountNotFound,
                    format!("No account for user {}", account.user_id),
                ))
            }
        };
        if current_version != expected_version {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                format!(
                    "Account {} moved from version {} to {}",
                    account.user_id, expected_version, current_version
                ),
            ));
        }

        if !event.reference.is_empty() {
            let dedup_key = (key.clone(), event.kind, event.reference.clone());
            if inner.accrual_refs.contains(&dedup_key) {
                return Err(DomainError::new(
                    ErrorCode::DuplicateReference,
                    format!(
                        "Accrual already recorded for reference '{}'",
                        event.reference
                    ),
                ));
            }
            inner.accrual_refs.insert(dedup_key);
        }

        inner
            .accounts
            .insert(key, (account.clone(), expected_version + 1));
        inner.events.push(event.clone());
        Ok(())
    }

    async fn commit_redemption(
        &self,
        account: &LedgerAccount,
        expected_version: u64,
        item: &CatalogItem,
        expected_item_version: u64,
        event: &LedgerEvent,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().expect("store lock poisoned");

        let key = account.user_id.as_str().to_string();
        let account_version = inner
            .accounts
            .get(&key)
            .map(|(_, version)| *version)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::AccountNotFound,
                    format!("No account for user {}", account.user_id),
                )
            })?;
        let item_version = inner
            .items
            .get(&item.id)
            .map(|(_, version)| *version)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ItemNotFound,
                    format!("No catalog item {}", item.id),
                )
            })?;

        // Both versions must still match; otherwise the caller raced and
        // must retry from a fresh snapshot.
        if account_version != expected_version || item_version != expected_item_version {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                "Account or catalog item changed since read",
            ));
        }

        inner
            .accounts
            .insert(key, (account.clone(), expected_version + 1));
        inner
            .items
            .insert(item.id, (item.clone(), expected_item_version + 1));
        inner.events.push(event.clone());
        Ok(())
    }

    async fn find_accrual_by_reference(
        &self,
        user_id: &UserId,
        kind: EventKind,
        reference: &str,
    ) -> Result<Option<LedgerEvent>, DomainError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .events
            .iter()
            .find(|event| {
                event.user_id == *user_id
                    && event.kind == kind
                    && event.reference == reference
            })
            .cloned())
    }

    async fn history(
        &self,
        user_id: &UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<LedgerEvent>, DomainError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .events
            .iter()
            .rev()
            .filter(|event| event.user_id == *user_id)
            .skip(page as usize * page_size as usize)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn events_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEvent>, DomainError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .events
            .iter()
            .filter(|event| event.user_id == *user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryLoyaltyStore {
    async fn find_item(&self, id: &CatalogItemId) -> Result<Option<VersionedItem>, DomainError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.items.get(id).map(|(item, version)| VersionedItem {
            item: item.clone(),
            version: *version,
        }))
    }

    async fn list_available(&self, now: Timestamp) -> Result<Vec<CatalogItem>, DomainError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .items
            .values()
            .filter(|(item, _)| item.availability(now).is_ok())
            .map(|(item, _)| item.clone())
            .collect())
    }

    async fn insert_item(&self, item: &CatalogItem) -> Result<u64, DomainError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if inner.items.contains_key(&item.id) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Catalog item {} already exists", item.id),
            ));
        }
        inner.items.insert(item.id, (item.clone(), 1));
        Ok(1)
    }
}
