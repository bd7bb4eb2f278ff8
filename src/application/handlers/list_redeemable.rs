//! ListRedeemableHandler - query handler for the annotated catalog.

use std::sync::Arc;

use crate::domain::catalog::RedeemableItem;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::ledger::LoyaltyError;
use crate::ports::{CatalogRepository, LedgerStore};

/// Handler for the ListRedeemable operation.
///
/// Returns every currently available item annotated with affordability, so
/// UIs can render "almost there" items the user cannot yet afford.
pub struct ListRedeemableHandler {
    store: Arc<dyn LedgerStore>,
    catalog: Arc<dyn CatalogRepository>,
}

impl ListRedeemableHandler {
    pub fn new(store: Arc<dyn LedgerStore>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { store, catalog }
    }

    pub async fn handle(&self, user_id: &UserId) -> Result<Vec<RedeemableItem>, LoyaltyError> {
        let balance = self
            .store
            .find_account(user_id)
            .await?
            .map(|versioned| versioned.account.current_balance)
            .unwrap_or(0);

        let items = self.catalog.list_available(Timestamp::now()).await?;
        Ok(items
            .into_iter()
            .map(|item| RedeemableItem {
                affordable: item.points_cost <= balance,
                item,
            })
            .collect())
    }
}
