//! RedeemHandler - command handler for exchanging points for catalog items.
//!
//! The one place that must guarantee exactly-once, no-double-spend
//! semantics: the balance debit, the inventory decrement, the coupon
//! issuance, and the audit event commit together or not at all.

use std::sync::Arc;

use crate::config::LoyaltyConfig;
use crate::domain::foundation::{CatalogItemId, ErrorCode, Timestamp, UserId};
use crate::domain::ledger::{
    Coupon, EventKind, ItemUnavailableReason, LedgerEvent, LoyaltyError,
};
use crate::ports::{CatalogRepository, LedgerStore, VersionedAccount, VersionedItem};

/// Command to redeem a catalog item for a user.
#[derive(Debug, Clone)]
pub struct RedeemCommand {
    pub user_id: UserId,
    pub catalog_item_id: CatalogItemId,
}

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionResult {
    pub coupon: Coupon,
    pub new_balance: i64,
}

/// Handler for the Redeem operation.
///
/// Preconditions are checked against the snapshot read at the start of the
/// operation; the commit re-validates both the account version and the item
/// version, so a losing concurrent request gets `ConcurrentConflict` instead
/// of silently spending stale balance or inventory. Unlike accruals,
/// redemptions are never retried internally; the caller must re-read state
/// and retry the whole operation.
pub struct RedeemHandler {
    store: Arc<dyn LedgerStore>,
    catalog: Arc<dyn CatalogRepository>,
    config: LoyaltyConfig,
}

impl RedeemHandler {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        catalog: Arc<dyn CatalogRepository>,
        config: LoyaltyConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    pub async fn handle(&self, cmd: RedeemCommand) -> Result<RedemptionResult, LoyaltyError> {
        let now = Timestamp::now();

        let VersionedItem {
            mut item,
            version: item_version,
        } = self
            .catalog
            .find_item(&cmd.catalog_item_id)
            .await?
            .ok_or_else(|| {
                LoyaltyError::item_not_available(cmd.catalog_item_id, ItemUnavailableReason::NotFound)
            })?;

        item.availability(now)
            .map_err(|reason| LoyaltyError::item_not_available(item.id, reason))?;

        // A user who never accrued has nothing to spend.
        let Some(VersionedAccount { mut account, version }) =
            self.store.find_account(&cmd.user_id).await?
        else {
            return Err(LoyaltyError::insufficient_balance(item.points_cost, 0));
        };

        let outcome = account.redeem(item.points_cost)?;
        item.consume_one(now)
            .map_err(|reason| LoyaltyError::item_not_available(item.id, reason))?;

        let coupon = Coupon::issue(
            item.id,
            item.kind,
            item.value,
            now,
            self.config.coupon_validity_days,
        );
        account.grant_coupon(coupon.clone());

        let event = LedgerEvent::record(
            cmd.user_id.clone(),
            EventKind::Redemption,
            -item.points_cost,
            outcome.balance_before,
            item.id.to_string(),
            format!("Redeemed '{}'", item.name),
            now,
        );

        match self
            .store
            .commit_redemption(&account, version, &item, item_version, &event)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    user_id = %cmd.user_id,
                    item_id = %item.id,
                    points_cost = item.points_cost,
                    new_balance = outcome.balance_after,
                    "redemption committed"
                );
                Ok(RedemptionResult {
                    coupon,
                    new_balance: outcome.balance_after,
                })
            }
            Err(err) if err.code == ErrorCode::VersionConflict => {
                tracing::warn!(
                    user_id = %cmd.user_id,
                    item_id = %item.id,
                    "redemption lost a concurrent race"
                );
                Err(LoyaltyError::ConcurrentConflict)
            }
            Err(err) => Err(err.into()),
        }
    }
}
