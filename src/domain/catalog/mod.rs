//! Reward catalog domain module.
//!
//! Catalog items are created and retired administratively; the only core
//! mutation is the Redemption Engine's inventory decrement.

mod item;

pub use item::{CatalogItem, ItemState, RedeemableItem, RewardKind, MIN_POINTS_COST};
