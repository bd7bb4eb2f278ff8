//! End-to-end loyalty flows through the command and query handlers, backed
//! by the in-memory store.

use std::sync::Arc;

use loyalty_ledger::adapters::memory::InMemoryLoyaltyStore;
use loyalty_ledger::application::handlers::{
    AccrueCommand, AccrueHandler, GetBalanceHandler, GetHistoryHandler, ListRedeemableHandler,
    RedeemCommand, RedeemHandler,
};
use loyalty_ledger::config::LoyaltyConfig;
use loyalty_ledger::domain::catalog::{CatalogItem, RewardKind};
use loyalty_ledger::domain::foundation::UserId;
use loyalty_ledger::domain::ledger::{
    verify_event_chain, EventKind, LoyaltyError, LoyaltyTier,
};
use loyalty_ledger::ports::{CatalogRepository, LedgerStore};

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

struct Harness {
    store: Arc<InMemoryLoyaltyStore>,
    accrue: AccrueHandler,
    redeem: RedeemHandler,
    balance: GetBalanceHandler,
    history: GetHistoryHandler,
    redeemable: ListRedeemableHandler,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryLoyaltyStore::new());
        let config = LoyaltyConfig::default();
        Self {
            accrue: AccrueHandler::new(store.clone(), config.clone()),
            redeem: RedeemHandler::new(store.clone(), store.clone(), config.clone()),
            balance: GetBalanceHandler::new(store.clone()),
            history: GetHistoryHandler::new(store.clone(), config),
            redeemable: ListRedeemableHandler::new(store.clone(), store.clone()),
            store,
        }
    }

    async fn seed_item(&self, name: &str, cost: i64) -> CatalogItem {
        let item = CatalogItem::new(name, cost, RewardKind::Discount, 15.0).unwrap();
        self.store.insert_item(&item).await.unwrap();
        item
    }
}

#[tokio::test]
async fn new_user_accrual_promotes_bronze_to_silver() {
    let h = Harness::new();

    let result = h.accrue.handle(purchase(600, "order-1")).await.unwrap();
    assert_eq!(result.new_balance, 600);
    assert_eq!(result.tier, LoyaltyTier::Silver);
    assert!(result.tier_changed);

    let view = h.balance.handle(&user()).await.unwrap();
    assert_eq!(view.lifetime_accrued, 600);
    assert_eq!(view.tier, LoyaltyTier::Silver);
}

#[tokio::test]
async fn underfunded_redemption_fails_without_state_change() {
    let h = Harness::new();
    h.accrue.handle(purchase(50, "order-1")).await.unwrap();
    let item = h.seed_item("Big discount", 80).await;

    let err = h
        .redeem
        .handle(RedeemCommand {
            user_id: user(),
            catalog_item_id: item.id,
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoyaltyError::InsufficientBalance {
            required: 80,
            available: 50
        }
    );
    let view = h.balance.handle(&user()).await.unwrap();
    assert_eq!(view.current_balance, 50);
    assert_eq!(view.lifetime_redeemed, 0);
    assert!(view.active_coupons.is_empty());
}

#[tokio::test]
async fn redemption_debits_issues_coupon_and_appends_event() {
    let h = Harness::new();
    h.accrue.handle(purchase(200, "order-1")).await.unwrap();
    let item = h.seed_item("Discount", 150).await;

    let result = h
        .redeem
        .handle(RedeemCommand {
            user_id: user(),
            catalog_item_id: item.id,
        })
        .await
        .unwrap();

    assert_eq!(result.new_balance, 50);
    let window = result
        .coupon
        .expires_at
        .duration_since(&result.coupon.issued_at)
        .num_days();
    assert_eq!(window, 30);

    let view = h.balance.handle(&user()).await.unwrap();
    assert_eq!(view.current_balance, 50);
    assert_eq!(view.lifetime_redeemed, 150);
    assert_eq!(view.active_coupons.len(), 1);

    let events = h.store.events_for_user(&user()).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].kind, EventKind::Redemption);
    assert_eq!(events[1].amount, -150);
    assert!(verify_event_chain(&events).is_ok());
}

#[tokio::test]
async fn successive_accruals_cross_silver_to_gold() {
    let h = Harness::new();
    h.accrue.handle(purchase(500, "order-1")).await.unwrap();
    let result = h.accrue.handle(purchase(1000, "order-2")).await.unwrap();

    assert_eq!(result.tier, LoyaltyTier::Gold);
    assert!(result.tier_changed);

    let view = h.balance.handle(&user()).await.unwrap();
    assert_eq!(view.benefits, LoyaltyTier::Gold.benefits());
    let next = view.next_tier.unwrap();
    assert_eq!(next.tier, LoyaltyTier::Platinum);
    assert_eq!(next.points_remaining, 1500);
}

#[tokio::test]
async fn retried_accrual_with_same_reference_credits_once() {
    let h = Harness::new();
    h.accrue.handle(purchase(100, "order-1")).await.unwrap();
    let retry = h.accrue.handle(purchase(100, "order-1")).await.unwrap();

    assert!(retry.already_recorded);
    assert_eq!(retry.new_balance, 100);
    assert_eq!(h.store.events_for_user(&user()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn catalog_listing_tracks_balance_changes() {
    let h = Harness::new();
    let cheap = h.seed_item("Cheap", 50).await;
    h.seed_item("Pricey", 500).await;

    h.accrue.handle(purchase(100, "order-1")).await.unwrap();

    let mut items = h.redeemable.handle(&user()).await.unwrap();
    items.sort_by_key(|entry| entry.item.points_cost);
    assert!(items[0].affordable);
    assert!(!items[1].affordable);

    h.redeem
        .handle(RedeemCommand {
            user_id: user(),
            catalog_item_id: cheap.id,
        })
        .await
        .unwrap();

    // 50 points left; nothing is affordable any more.
    let items = h.redeemable.handle(&user()).await.unwrap();
    assert!(items.iter().all(|entry| !entry.affordable));
}

#[tokio::test]
async fn history_pages_through_mixed_activity() {
    let h = Harness::new();
    for i in 0..4 {
        h.accrue
            .handle(purchase(100, &format!("order-{}", i)))
            .await
            .unwrap();
    }
    let item = h.seed_item("Discount", 150).await;
    h.redeem
        .handle(RedeemCommand {
            user_id: user(),
            catalog_item_id: item.id,
        })
        .await
        .unwrap();

    let first = h.history.handle(&user(), 0, 3).await.unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0].kind, EventKind::Redemption);

    let second = h.history.handle(&user(), 1, 3).await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].reference, "order-0");
}
