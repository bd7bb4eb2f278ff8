//! Loyalty Ledger - Points Accrual and Redemption Engine
//!
//! Maintains per-user loyalty balances derived from an append-only audit
//! trail, enforces monotonic tier progression, and performs atomic
//! redemptions against a finite, shared reward catalog.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
