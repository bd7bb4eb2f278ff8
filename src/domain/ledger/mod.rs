//! Ledger domain module.
//!
//! The loyalty ledger pairs a current-state account record with an immutable
//! event history. Accruals credit the balance and drive tier progression;
//! redemptions debit it and issue coupons.
//!
//! # Module Structure
//!
//! - `account` - LedgerAccount aggregate entity
//! - `status` - AccountStatus state machine
//! - `tier` - LoyaltyTier bands and benefit tables (pure, no I/O)
//! - `coupon` - issued single-use coupon artifact
//! - `event` - append-only audit events and replay helpers
//! - `errors` - LoyaltyError taxonomy

mod account;
mod coupon;
mod errors;
mod event;
mod status;
mod tier;

pub use account::{AccrualOutcome, LedgerAccount, RedemptionOutcome};
pub use coupon::Coupon;
pub use errors::{ItemUnavailableReason, LoyaltyError};
pub use event::{replay_balance, verify_event_chain, ChainViolation, EventKind, LedgerEvent};
pub use status::AccountStatus;
pub use tier::{next_tier_info, LoyaltyTier, NextTierInfo, TierBenefits};
