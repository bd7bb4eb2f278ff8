//! Domain layer - entities, value objects, and business rules.
//!
//! - `foundation` - shared value objects (ids, timestamps, errors)
//! - `ledger` - LedgerAccount aggregate, tiers, coupons, audit events
//! - `catalog` - reward catalog items and inventory rules

pub mod catalog;
pub mod foundation;
pub mod ledger;
