//! GetHistoryHandler - query handler for the paginated audit trail.

use std::sync::Arc;

use crate::config::LoyaltyConfig;
use crate::domain::foundation::UserId;
use crate::domain::ledger::{LedgerEvent, LoyaltyError};
use crate::ports::LedgerStore;

/// Handler for the History operation. Events come back most recent first.
pub struct GetHistoryHandler {
    store: Arc<dyn LedgerStore>,
    config: LoyaltyConfig,
}

impl GetHistoryHandler {
    pub fn new(store: Arc<dyn LedgerStore>, config: LoyaltyConfig) -> Self {
        Self { store, config }
    }

    /// `page` is zero-based; `page_size` of zero selects the configured
    /// default, larger requests are clamped to the configured maximum.
    pub async fn handle(
        &self,
        user_id: &UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<LedgerEvent>, LoyaltyError> {
        let page_size = self.config.clamp_page_size(page_size);
        Ok(self.store.history(user_id, page, page_size).await?)
    }
}
