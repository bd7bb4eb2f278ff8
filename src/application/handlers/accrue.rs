//! AccrueHandler - command handler for crediting loyalty points.

use std::sync::Arc;

use crate::config::LoyaltyConfig;
use crate::domain::foundation::{ErrorCode, Timestamp, UserId};
use crate::domain::ledger::{
    EventKind, LedgerAccount, LedgerEvent, LoyaltyError, LoyaltyTier,
};
use crate::ports::{LedgerStore, VersionedAccount};

/// Command to credit points to a user's account.
#[derive(Debug, Clone)]
pub struct AccrueCommand {
    pub user_id: UserId,
    pub amount: i64,
    pub kind: EventKind,

    /// Caller-supplied correlation id (order id, referral id). Non-empty
    /// references deduplicate retried accruals.
    pub reference: String,

    pub description: String,
}

/// Result of a successful (or deduplicated) accrual.
#[derive(Debug, Clone, PartialEq)]
pub struct AccrualResult {
    pub new_balance: i64,
    pub tier: LoyaltyTier,

    /// True when this accrual crossed a tier band; the caller surfaces the
    /// promotion to the user.
    pub tier_changed: bool,

    /// True when an accrual with the same `(user_id, kind, reference)` was
    /// already committed; no state changed on this call.
    pub already_recorded: bool,
}

/// Handler for the Accrue operation.
///
/// Commits are version-guarded; since accruals commute, lost races are
/// retried internally up to the configured bound before surfacing
/// `ConcurrentConflict`.
pub struct AccrueHandler {
    store: Arc<dyn LedgerStore>,
    config: LoyaltyConfig,
}

impl AccrueHandler {
    pub fn new(store: Arc<dyn LedgerStore>, config: LoyaltyConfig) -> Self {
        Self { store, config }
    }

    pub async fn handle(&self, cmd: AccrueCommand) -> Result<AccrualResult, LoyaltyError> {
        // Validation errors reject synchronously, before any store access.
        if cmd.amount <= 0 {
            return Err(LoyaltyError::invalid_amount(cmd.amount));
        }
        if !cmd.kind.is_credit() {
            return Err(LoyaltyError::invalid_event_kind(cmd.kind.as_str()));
        }

        // Fast-path dedup before attempting a commit.
        if !cmd.reference.is_empty() {
            let existing = self
                .store
                .find_accrual_by_reference(&cmd.user_id, cmd.kind, &cmd.reference)
                .await?;
            if existing.is_some() {
                return self.already_recorded(&cmd.user_id).await;
            }
        }

        let mut attempts = 0;
        loop {
            let VersionedAccount { mut account, version } =
                self.load_or_open(&cmd.user_id).await?;

            let outcome = account.accrue(cmd.amount)?;
            let event = LedgerEvent::record(
                cmd.user_id.clone(),
                cmd.kind,
                cmd.amount,
                outcome.balance_before,
                cmd.reference.clone(),
                cmd.description.clone(),
                Timestamp::now(),
            );

            match self.store.commit_accrual(&account, version, &event).await {
                Ok(()) => {
                    if outcome.tier_changed {
                        tracing::info!(
                            user_id = %account.user_id,
                            tier = %account.tier,
                            lifetime_accrued = account.lifetime_accrued,
                            "tier promoted"
                        );
                    }
                    return Ok(AccrualResult {
                        new_balance: outcome.balance_after,
                        tier: account.tier,
                        tier_changed: outcome.tier_changed,
                        already_recorded: false,
                    });
                }
                Err(err) if err.code == ErrorCode::VersionConflict => {
                    attempts += 1;
                    if attempts > self.config.accrual_commit_retries {
                        return Err(LoyaltyError::ConcurrentConflict);
                    }
                    tracing::debug!(
                        user_id = %cmd.user_id,
                        attempt = attempts,
                        "accrual commit lost a race, retrying"
                    );
                }
                Err(err) if err.code == ErrorCode::DuplicateReference => {
                    // A concurrent retry of the same accrual won; answer
                    // idempotently.
                    return self.already_recorded(&cmd.user_id).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Loads the account, lazily opening it on first accrual.
    async fn load_or_open(&self, user_id: &UserId) -> Result<VersionedAccount, LoyaltyError> {
        if let Some(versioned) = self.store.find_account(user_id).await? {
            return Ok(versioned);
        }

        let account = LedgerAccount::open(user_id.clone());
        match self.store.insert_account(&account).await {
            Ok(version) => Ok(VersionedAccount { account, version }),
            Err(err) if err.code == ErrorCode::AccountAlreadyExists => self
                .store
                .find_account(user_id)
                .await?
                .ok_or_else(|| {
                    LoyaltyError::Infrastructure(
                        "account missing after insert race".to_string(),
                    )
                }),
            Err(err) => Err(err.into()),
        }
    }

    async fn already_recorded(&self, user_id: &UserId) -> Result<AccrualResult, LoyaltyError> {
        let versioned = self.store.find_account(user_id).await?.ok_or_else(|| {
            LoyaltyError::Infrastructure("accrual event exists without account".to_string())
        })?;
        Ok(AccrualResult {
            new_balance: versioned.account.current_balance,
            tier: versioned.account.tier,
            tier_changed: false,
            already_recorded: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLoyaltyStore;
    use crate::domain::ledger::AccountStatus;

    fn handler(store: Arc<InMemoryLoyaltyStore>) -> AccrueHandler {
        AccrueHandler::new(store, LoyaltyConfig::default())
    }

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    fn purchase(amount: i64, reference: &str) -> AccrueCommand {
        AccrueCommand {
            user_id: user(),
            amount,
            kind: EventKind::Purchase,
            reference: reference.to_string(),
            description: "points for completed order".to_string(),
        }
    }

    #[tokio::test]
    async fn first_accrual_opens_account_lazily() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let result = handler(store.clone()).handle(purchase(100, "order-1")).await.unwrap();

        assert_eq!(result.new_balance, 100);
        assert_eq!(result.tier, LoyaltyTier::Bronze);
        assert!(!result.tier_changed);
        assert!(!result.already_recorded);

        let account = store.find_account(&user()).await.unwrap().unwrap().account;
        assert_eq!(account.lifetime_accrued, 100);
    }

    #[tokio::test]
    async fn accrual_crossing_band_signals_tier_change() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let result = handler(store).handle(purchase(600, "order-1")).await.unwrap();

        assert_eq!(result.new_balance, 600);
        assert_eq!(result.tier, LoyaltyTier::Silver);
        assert!(result.tier_changed);
    }

    #[tokio::test]
    async fn accrual_appends_audit_event_with_balances() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let h = handler(store.clone());
        h.handle(purchase(100, "order-1")).await.unwrap();
        h.handle(purchase(50, "order-2")).await.unwrap();

        let events = store.events_for_user(&user()).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].balance_before, 0);
        assert_eq!(events[0].balance_after, 100);
        assert_eq!(events[1].balance_before, 100);
        assert_eq!(events[1].balance_after, 150);
    }

    #[tokio::test]
    async fn zero_amount_is_rejected_without_state_change() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let err = handler(store.clone()).handle(purchase(0, "order-1")).await.unwrap_err();

        assert!(matches!(err, LoyaltyError::InvalidAmount { amount: 0 }));
        assert!(store.find_account(&user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn redemption_kind_is_rejected() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let cmd = AccrueCommand {
            kind: EventKind::Redemption,
            ..purchase(100, "order-1")
        };
        let err = handler(store).handle(cmd).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::InvalidEventKind { .. }));
    }

    #[tokio::test]
    async fn suspended_account_is_not_eligible() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let h = handler(store.clone());
        h.handle(purchase(100, "order-1")).await.unwrap();
        store.set_account_status(&user(), AccountStatus::Suspended);

        let err = h.handle(purchase(100, "order-2")).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::AccountNotEligible { .. }));
    }

    #[tokio::test]
    async fn duplicate_reference_is_idempotent() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let h = handler(store.clone());
        h.handle(purchase(100, "order-1")).await.unwrap();
        let result = h.handle(purchase(100, "order-1")).await.unwrap();

        assert!(result.already_recorded);
        assert_eq!(result.new_balance, 100);
        assert!(!result.tier_changed);
        assert_eq!(store.events_for_user(&user()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_reference_is_never_deduplicated() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let h = handler(store.clone());
        h.handle(purchase(25, "")).await.unwrap();
        let result = h.handle(purchase(25, "")).await.unwrap();

        assert!(!result.already_recorded);
        assert_eq!(result.new_balance, 50);
        assert_eq!(store.events_for_user(&user()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn same_reference_different_kind_is_not_a_duplicate() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let h = handler(store.clone());
        h.handle(purchase(100, "ref-1")).await.unwrap();

        let cmd = AccrueCommand {
            kind: EventKind::Bonus,
            ..purchase(30, "ref-1")
        };
        let result = h.handle(cmd).await.unwrap();
        assert!(!result.already_recorded);
        assert_eq!(result.new_balance, 130);
    }
}
