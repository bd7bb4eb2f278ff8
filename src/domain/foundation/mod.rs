//! Foundation value objects shared across domain modules.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CatalogItemId, CouponId, EventId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
