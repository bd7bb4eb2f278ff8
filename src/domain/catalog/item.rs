//! Catalog item entity and inventory rules.

use crate::domain::foundation::{CatalogItemId, Timestamp, ValidationError};
use crate::domain::ledger::ItemUnavailableReason;
use serde::{Deserialize, Serialize};

/// Minimum allowed points cost for any catalog item.
pub const MIN_POINTS_COST: i64 = 10;

/// What a redeemed coupon grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Discount,
    FreeItem,
    FreeShipping,
    PointsBonus,
    PremiumAccess,
}

impl RewardKind {
    /// Stable string form used by persistence adapters.
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Discount => "discount",
            RewardKind::FreeItem => "free_item",
            RewardKind::FreeShipping => "free_shipping",
            RewardKind::PointsBonus => "points_bonus",
            RewardKind::PremiumAccess => "premium_access",
        }
    }
}

/// Lifecycle state of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Active,
    Inactive,
    Exhausted,
}

/// Redeemable item in the reward catalog.
///
/// # Invariants
///
/// - `points_cost >= MIN_POINTS_COST`
/// - `inventory_consumed <= inventory_cap` when capped; reaching the cap
///   transitions the state to Exhausted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    pub points_cost: i64,
    pub kind: RewardKind,

    /// Reward magnitude; interpretation depends on `kind` (percentage for
    /// discounts, monetary value for free items).
    pub value: f64,

    /// Merchant categories the reward applies to; empty means all.
    pub applicable_categories: Vec<String>,

    /// None means unlimited inventory.
    pub inventory_cap: Option<u32>,
    pub inventory_consumed: u32,

    /// None means the item never expires.
    pub expires_at: Option<Timestamp>,

    pub state: ItemState,
}

/// Catalog item annotated with affordability for a specific user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemableItem {
    pub item: CatalogItem,
    pub affordable: bool,
}

impl CatalogItem {
    /// Creates a new active catalog item.
    ///
    /// # Errors
    ///
    /// Rejects empty names and costs below [`MIN_POINTS_COST`].
    pub fn new(
        name: impl Into<String>,
        points_cost: i64,
        kind: RewardKind,
        value: f64,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if points_cost < MIN_POINTS_COST {
            return Err(ValidationError::below_minimum(
                "points_cost",
                MIN_POINTS_COST,
                points_cost,
            ));
        }
        Ok(Self {
            id: CatalogItemId::new(),
            name,
            points_cost,
            kind,
            value,
            applicable_categories: Vec::new(),
            inventory_cap: None,
            inventory_consumed: 0,
            expires_at: None,
            state: ItemState::Active,
        })
    }

    /// Sets a finite inventory cap.
    pub fn with_inventory_cap(mut self, cap: u32) -> Self {
        self.inventory_cap = Some(cap);
        self
    }

    /// Sets an expiry deadline.
    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Restricts the reward to specific merchant categories.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.applicable_categories = categories;
        self
    }

    /// Units still available, or None for unlimited inventory.
    pub fn remaining_inventory(&self) -> Option<u32> {
        self.inventory_cap
            .map(|cap| cap.saturating_sub(self.inventory_consumed))
    }

    /// Checks whether the item can currently be redeemed.
    pub fn availability(&self, now: Timestamp) -> Result<(), ItemUnavailableReason> {
        match self.state {
            ItemState::Inactive => return Err(ItemUnavailableReason::Inactive),
            ItemState::Exhausted => return Err(ItemUnavailableReason::Exhausted),
            ItemState::Active => {}
        }
        if let Some(expires_at) = self.expires_at {
            if now.is_after(&expires_at) {
                return Err(ItemUnavailableReason::Expired);
            }
        }
        if self.remaining_inventory() == Some(0) {
            return Err(ItemUnavailableReason::Exhausted);
        }
        Ok(())
    }

    /// Consumes one unit of inventory as part of a redemption.
    ///
    /// Transitions the state to Exhausted when a cap is reached. Unlimited
    /// items only track the consumed counter.
    pub fn consume_one(&mut self, now: Timestamp) -> Result<(), ItemUnavailableReason> {
        self.availability(now)?;
        self.inventory_consumed += 1;
        if self.remaining_inventory() == Some(0) {
            self.state = ItemState::Exhausted;
        }
        Ok(())
    }
}
