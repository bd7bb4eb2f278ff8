//! PostgreSQL store adapters.
//!
//! Optimistic concurrency is implemented with per-row `version` columns:
//! commits run `UPDATE ... WHERE version = $expected` inside a transaction
//! and report `VersionConflict` when no row matched. Accrual idempotency is
//! enforced by a partial unique index over `(user_id, kind, reference)` on
//! the events table.

mod catalog_repository;
mod ledger_store;

pub use catalog_repository::PostgresCatalogRepository;
pub use ledger_store::PostgresLedgerStore;
