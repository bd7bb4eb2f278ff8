//! Operation handlers, one per external entry point.
//!
//! Mutating operations:
//! - `AccrueHandler` - credit points, drive tier progression
//! - `RedeemHandler` - exchange points for a catalog item, issue a coupon
//!
//! Read operations:
//! - `GetBalanceHandler` - balance, tier, benefits, coupons
//! - `ListRedeemableHandler` - catalog annotated with affordability
//! - `GetHistoryHandler` - paginated audit trail

mod accrue;
mod get_balance;
mod get_history;
mod list_redeemable;
mod redeem;

pub use accrue::{AccrualResult, AccrueCommand, AccrueHandler};
pub use get_balance::{BalanceView, GetBalanceHandler};
pub use get_history::GetHistoryHandler;
pub use list_redeemable::ListRedeemableHandler;
pub use redeem::{RedeemCommand, RedeemHandler, RedemptionResult};
