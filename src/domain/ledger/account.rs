//! LedgerAccount aggregate entity.
//!
//! One account per user, created lazily on first accrual or balance query
//! and never deleted. The aggregate is the single place where the balance
//! identity and tier monotonicity are enforced.
//!
//! # Invariants
//!
//! - `current_balance == lifetime_accrued - lifetime_redeemed` at all times
//! - `lifetime_accrued` and `lifetime_redeemed` never decrease
//! - `current_balance` never goes negative
//! - `tier` never regresses; it is a function of lifetime accrued only

use crate::domain::foundation::{Timestamp, UserId};
use serde::{Deserialize, Serialize};

use super::{AccountStatus, Coupon, LoyaltyError, LoyaltyTier, TierBenefits};

/// Per-user loyalty ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub user_id: UserId,

    /// Spendable points; always `lifetime_accrued - lifetime_redeemed`.
    pub current_balance: i64,

    /// Monotonically non-decreasing; drives tier progression.
    pub lifetime_accrued: i64,

    /// Monotonically non-decreasing.
    pub lifetime_redeemed: i64,

    pub tier: LoyaltyTier,

    /// Benefit snapshot for the current tier, recomputed only on tier change.
    pub benefits: TierBenefits,

    pub status: AccountStatus,

    /// Issued-but-not-consumed coupons, ordered by issuance.
    pub active_coupons: Vec<Coupon>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Result of applying an accrual to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccrualOutcome {
    pub balance_before: i64,
    pub balance_after: i64,
    pub tier_changed: bool,
}

/// Result of applying a redemption debit to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedemptionOutcome {
    pub balance_before: i64,
    pub balance_after: i64,
}

impl LedgerAccount {
    /// Creates a fresh account: Bronze tier, zero balances, Active.
    pub fn open(user_id: UserId) -> Self {
        let now = Timestamp::now();
        let tier = LoyaltyTier::default();
        Self {
            user_id,
            current_balance: 0,
            lifetime_accrued: 0,
            lifetime_redeemed: 0,
            tier,
            benefits: tier.benefits(),
            status: AccountStatus::Active,
            active_coupons: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Credits points and recomputes the tier from the new lifetime total.
    ///
    /// The benefit snapshot is refreshed only when the tier actually
    /// changes. Returns the before/after balances and a tier-up signal for
    /// the caller to surface to the user.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`, or if crediting it would overflow
    ///   the balance or lifetime totals
    /// - `AccountNotEligible` if the account is suspended or cancelled
    pub fn accrue(&mut self, amount: i64) -> Result<AccrualOutcome, LoyaltyError> {
        if amount <= 0 {
            return Err(LoyaltyError::invalid_amount(amount));
        }
        self.ensure_eligible()?;

        // Check both additions before mutating anything, so an overflowing
        // amount cannot leave the aggregate half-updated.
        let new_balance = self
            .current_balance
            .checked_add(amount)
            .ok_or(LoyaltyError::InvalidAmount { amount })?;
        let new_lifetime = self
            .lifetime_accrued
            .checked_add(amount)
            .ok_or(LoyaltyError::InvalidAmount { amount })?;

        let balance_before = self.current_balance;
        self.current_balance = new_balance;
        self.lifetime_accrued = new_lifetime;

        let new_tier = LoyaltyTier::for_lifetime_accrued(self.lifetime_accrued);
        // Tier is monotonic; for_lifetime_accrued can only move up here
        // because lifetime_accrued only grows.
        let tier_changed = new_tier != self.tier;
        if tier_changed {
            self.tier = new_tier;
            self.benefits = new_tier.benefits();
        }
        self.updated_at = Timestamp::now();

        Ok(AccrualOutcome {
            balance_before,
            balance_after: self.current_balance,
            tier_changed,
        })
    }

    /// Debits points for a redemption. Tier is never recomputed here.
    ///
    /// # Errors
    ///
    /// - `AccountNotEligible` if the account is suspended or cancelled
    /// - `InsufficientBalance` with required vs. available amounts
    pub fn redeem(&mut self, points_cost: i64) -> Result<RedemptionOutcome, LoyaltyError> {
        self.ensure_eligible()?;
        if self.current_balance < points_cost {
            return Err(LoyaltyError::insufficient_balance(
                points_cost,
                self.current_balance,
            ));
        }

        let balance_before = self.current_balance;
        self.current_balance -= points_cost;
        self.lifetime_redeemed += points_cost;
        self.updated_at = Timestamp::now();

        Ok(RedemptionOutcome {
            balance_before,
            balance_after: self.current_balance,
        })
    }

    /// Appends a freshly issued coupon to the account.
    pub fn grant_coupon(&mut self, coupon: Coupon) {
        self.active_coupons.push(coupon);
        self.updated_at = Timestamp::now();
    }

    /// Checks the balance identity invariant. Used by reconciliation and
    /// tests; a false return indicates corrupted state.
    pub fn is_consistent(&self) -> bool {
        self.current_balance == self.lifetime_accrued - self.lifetime_redeemed
            && self.current_balance >= 0
    }

    fn ensure_eligible(&self) -> Result<(), LoyaltyError> {
        if !self.status.is_eligible() {
            return Err(LoyaltyError::account_not_eligible(
                self.user_id.clone(),
                self.status,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> LedgerAccount {
        LedgerAccount::open(UserId::new("u1").unwrap())
    }

    // Construction

    #[test]
    fn open_starts_bronze_active_with_zero_balances() {
        let account = account();
        assert_eq!(account.tier, LoyaltyTier::Bronze);
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.current_balance, 0);
        assert_eq!(account.lifetime_accrued, 0);
        assert_eq!(account.lifetime_redeemed, 0);
        assert!(account.active_coupons.is_empty());
        assert!(account.is_consistent());
    }

    // Accrual

    #[test]
    fn accrue_updates_balance_and_lifetime() {
        let mut account = account();
        let outcome = account.accrue(600).unwrap();

        assert_eq!(outcome.balance_before, 0);
        assert_eq!(outcome.balance_after, 600);
        assert_eq!(account.lifetime_accrued, 600);
        assert!(account.is_consistent());
    }

    #[test]
    fn accrue_crossing_band_promotes_tier_and_snapshots_benefits() {
        let mut account = account();
        let outcome = account.accrue(600).unwrap();

        assert!(outcome.tier_changed);
        assert_eq!(account.tier, LoyaltyTier::Silver);
        assert_eq!(account.benefits, LoyaltyTier::Silver.benefits());
    }

    #[test]
    fn accrue_within_band_does_not_change_tier() {
        let mut account = account();
        account.accrue(100).unwrap();
        let outcome = account.accrue(100).unwrap();

        assert!(!outcome.tier_changed);
        assert_eq!(account.tier, LoyaltyTier::Bronze);
    }

    #[test]
    fn accrue_rejects_zero_and_negative_amounts() {
        let mut account = account();
        assert!(matches!(
            account.accrue(0),
            Err(LoyaltyError::InvalidAmount { amount: 0 })
        ));
        assert!(matches!(
            account.accrue(-50),
            Err(LoyaltyError::InvalidAmount { amount: -50 })
        ));
        assert_eq!(account.current_balance, 0);
    }

    #[test]
    fn accrue_rejects_amount_that_would_overflow() {
        let mut account = account();
        account.accrue(i64::MAX).unwrap();

        let err = account.accrue(1).unwrap_err();
        assert!(matches!(err, LoyaltyError::InvalidAmount { amount: 1 }));
        assert_eq!(account.current_balance, i64::MAX);
        assert_eq!(account.lifetime_accrued, i64::MAX);
        assert!(account.is_consistent());
    }

    #[test]
    fn suspended_account_cannot_accrue() {
        let mut account = account();
        account.status = AccountStatus::Suspended;
        assert!(matches!(
            account.accrue(100),
            Err(LoyaltyError::AccountNotEligible { .. })
        ));
    }

    #[test]
    fn successive_accruals_cross_multiple_bands() {
        let mut account = account();
        account.accrue(500).unwrap();
        assert_eq!(account.tier, LoyaltyTier::Silver);

        let outcome = account.accrue(1000).unwrap();
        assert!(outcome.tier_changed);
        assert_eq!(account.tier, LoyaltyTier::Gold);
        assert_eq!(account.benefits, LoyaltyTier::Gold.benefits());
    }

    // Redemption

    #[test]
    fn redeem_debits_balance_and_bumps_lifetime_redeemed() {
        let mut account = account();
        account.accrue(200).unwrap();

        let outcome = account.redeem(150).unwrap();
        assert_eq!(outcome.balance_before, 200);
        assert_eq!(outcome.balance_after, 50);
        assert_eq!(account.lifetime_redeemed, 150);
        assert!(account.is_consistent());
    }

    #[test]
    fn redeem_rejects_insufficient_balance_with_detail() {
        let mut account = account();
        account.accrue(50).unwrap();

        let err = account.redeem(80).unwrap_err();
        assert_eq!(
            err,
            LoyaltyError::InsufficientBalance {
                required: 80,
                available: 50
            }
        );
        assert_eq!(account.current_balance, 50);
    }

    #[test]
    fn redeem_never_recomputes_tier() {
        let mut account = account();
        account.accrue(600).unwrap();
        assert_eq!(account.tier, LoyaltyTier::Silver);

        account.redeem(550).unwrap();
        assert_eq!(account.current_balance, 50);
        // Spending down does not regress the tier.
        assert_eq!(account.tier, LoyaltyTier::Silver);
    }

    #[test]
    fn cancelled_account_cannot_redeem() {
        let mut account = account();
        account.accrue(100).unwrap();
        account.status = AccountStatus::Cancelled;
        assert!(matches!(
            account.redeem(50),
            Err(LoyaltyError::AccountNotEligible { .. })
        ));
    }

    // Coupons

    #[test]
    fn grant_coupon_appends_in_order() {
        use crate::domain::catalog::RewardKind;
        use crate::domain::foundation::CatalogItemId;

        let mut account = account();
        let first = Coupon::issue(CatalogItemId::new(), RewardKind::Discount, 10.0, Timestamp::now(), 30);
        let second = Coupon::issue(CatalogItemId::new(), RewardKind::FreeItem, 5.0, Timestamp::now(), 30);
        account.grant_coupon(first.clone());
        account.grant_coupon(second.clone());

        assert_eq!(account.active_coupons, vec![first, second]);
    }

    // Invariant

    #[test]
    fn balance_identity_holds_across_mixed_operations() {
        let mut account = account();
        account.accrue(1000).unwrap();
        account.redeem(300).unwrap();
        account.accrue(50).unwrap();
        account.redeem(750).unwrap();

        assert_eq!(account.current_balance, 0);
        assert_eq!(account.lifetime_accrued, 1050);
        assert_eq!(account.lifetime_redeemed, 1050);
        assert!(account.is_consistent());
    }
}
