//! GetBalanceHandler - query handler for the balance snapshot.

use std::sync::Arc;

use crate::domain::foundation::{ErrorCode, UserId};
use crate::domain::ledger::{
    next_tier_info, AccountStatus, Coupon, LedgerAccount, LoyaltyError, LoyaltyTier, NextTierInfo,
    TierBenefits,
};
use crate::ports::LedgerStore;
use serde::Serialize;

/// Snapshot of a user's loyalty standing.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    pub current_balance: i64,
    pub lifetime_accrued: i64,
    pub lifetime_redeemed: i64,
    pub tier: LoyaltyTier,
    pub benefits: TierBenefits,
    pub status: AccountStatus,

    /// None once the user reaches the top tier.
    pub next_tier: Option<NextTierInfo>,

    pub active_coupons: Vec<Coupon>,
}

/// Handler for the GetBalance operation.
///
/// Accounts are created lazily on first balance query, same as on first
/// accrual, so collaborators always get a well-formed snapshot.
pub struct GetBalanceHandler {
    store: Arc<dyn LedgerStore>,
}

impl GetBalanceHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, user_id: &UserId) -> Result<BalanceView, LoyaltyError> {
        let account = match self.store.find_account(user_id).await? {
            Some(versioned) => versioned.account,
            None => self.open_account(user_id).await?,
        };

        Ok(BalanceView {
            current_balance: account.current_balance,
            lifetime_accrued: account.lifetime_accrued,
            lifetime_redeemed: account.lifetime_redeemed,
            tier: account.tier,
            benefits: account.benefits,
            status: account.status,
            next_tier: next_tier_info(account.lifetime_accrued),
            active_coupons: account.active_coupons,
        })
    }

    async fn open_account(&self, user_id: &UserId) -> Result<LedgerAccount, LoyaltyError> {
        let account = LedgerAccount::open(user_id.clone());
        match self.store.insert_account(&account).await {
            Ok(_) => Ok(account),
            Err(err) if err.code == ErrorCode::AccountAlreadyExists => self
                .store
                .find_account(user_id)
                .await?
                .map(|versioned| versioned.account)
                .ok_or_else(|| {
                    LoyaltyError::Infrastructure(
                        "account missing after insert race".to_string(),
                    )
                }),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLoyaltyStore;
    use crate::application::handlers::{AccrueCommand, AccrueHandler};
    use crate::config::LoyaltyConfig;
    use crate::domain::ledger::EventKind;

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    #[tokio::test]
    async fn unknown_user_gets_fresh_bronze_snapshot() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let view = GetBalanceHandler::new(store.clone()).handle(&user()).await.unwrap();

        assert_eq!(view.current_balance, 0);
        assert_eq!(view.tier, LoyaltyTier::Bronze);
        assert_eq!(view.benefits, LoyaltyTier::Bronze.benefits());
        assert_eq!(view.next_tier.unwrap().tier, LoyaltyTier::Silver);
        assert!(view.active_coupons.is_empty());

        // The query persisted the lazily created account.
        assert!(store.find_account(&user()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn snapshot_reflects_accrued_state() {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        AccrueHandler::new(store.clone(), LoyaltyConfig::default())
            .handle(AccrueCommand {
                user_id: user(),
                amount: 1500,
                kind: EventKind::Purchase,
                reference: "order-1".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        let view = GetBalanceHandler::new(store).handle(&user()).await.unwrap();
        assert_eq!(view.current_balance, 1500);
        assert_eq!(view.lifetime_accrued, 1500);
        assert_eq!(view.tier, LoyaltyTier::Gold);
        assert_eq!(view.benefits, LoyaltyTier::Gold.benefits());
        let next = view.next_tier.unwrap();
        assert_eq!(next.tier, LoyaltyTier::Platinum);
        assert_eq!(next.points_remaining, 1500);
    }
}
