//! Adapters - implementations of the storage ports.
//!
//! - `memory` - in-process store for tests and embedded deployments
//! - `postgres` - sqlx-backed store with optimistic versioning

pub mod memory;
pub mod postgres;
