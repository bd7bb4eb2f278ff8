//! In-memory store adapter.

mod store;

pub use store::InMemoryLoyaltyStore;
