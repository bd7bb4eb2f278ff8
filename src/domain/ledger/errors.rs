//! Loyalty operation error taxonomy.
//!
//! Three categories with distinct caller contracts:
//! - validation errors are rejected synchronously with no state mutation
//! - business-rule errors carry structured detail for precise messaging
//! - concurrency conflicts are retryable; callers re-read state and retry
//!   the whole operation

use crate::domain::foundation::{CatalogItemId, DomainError, UserId};

use super::AccountStatus;

/// Why a catalog item cannot currently be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUnavailableReason {
    NotFound,
    Inactive,
    Exhausted,
    Expired,
}

impl std::fmt::Display for ItemUnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemUnavailableReason::NotFound => "not found",
            ItemUnavailableReason::Inactive => "inactive",
            ItemUnavailableReason::Exhausted => "exhausted",
            ItemUnavailableReason::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}

/// Errors surfaced by the accrual and redemption engines.
#[derive(Debug, Clone, PartialEq)]
pub enum LoyaltyError {
    /// Accrual amount was zero or negative, or too large to credit.
    InvalidAmount { amount: i64 },

    /// Accrual was requested with a non-credit event kind.
    InvalidEventKind { kind: String },

    /// Account is suspended or cancelled.
    AccountNotEligible {
        user_id: UserId,
        status: AccountStatus,
    },

    /// Catalog item cannot be redeemed right now.
    ItemNotAvailable {
        item_id: CatalogItemId,
        reason: ItemUnavailableReason,
    },

    /// Balance does not cover the points cost.
    InsufficientBalance { required: i64, available: i64 },

    /// A concurrent request won the race; re-read state and retry.
    ConcurrentConflict,

    /// Storage or other infrastructure failure.
    Infrastructure(String),
}

impl LoyaltyError {
    pub fn invalid_amount(amount: i64) -> Self {
        LoyaltyError::InvalidAmount { amount }
    }

    pub fn invalid_event_kind(kind: impl Into<String>) -> Self {
        LoyaltyError::InvalidEventKind { kind: kind.into() }
    }

    pub fn account_not_eligible(user_id: UserId, status: AccountStatus) -> Self {
        LoyaltyError::AccountNotEligible { user_id, status }
    }

    pub fn item_not_available(item_id: CatalogItemId, reason: ItemUnavailableReason) -> Self {
        LoyaltyError::ItemNotAvailable { item_id, reason }
    }

    pub fn insufficient_balance(required: i64, available: i64) -> Self {
        LoyaltyError::InsufficientBalance { required, available }
    }

    /// Returns true if the caller should retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoyaltyError::ConcurrentConflict)
    }
}

impl std::fmt::Display for LoyaltyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoyaltyError::InvalidAmount { amount } => {
                write!(f, "Accrual amount must be positive, got {}", amount)
            }
            LoyaltyError::InvalidEventKind { kind } => {
                write!(f, "Event kind '{}' cannot be accrued", kind)
            }
            LoyaltyError::AccountNotEligible { user_id, status } => {
                write!(f, "Account {} is not eligible (status {:?})", user_id, status)
            }
            LoyaltyError::ItemNotAvailable { item_id, reason } => {
                write!(f, "Catalog item {} is not available: {}", item_id, reason)
            }
            LoyaltyError::InsufficientBalance { required, available } => {
                write!(
                    f,
                    "Insufficient balance: required {}, available {}",
                    required, available
                )
            }
            LoyaltyError::ConcurrentConflict => {
                write!(f, "Concurrent modification detected; retry the operation")
            }
            LoyaltyError::Infrastructure(message) => {
                write!(f, "Infrastructure error: {}", message)
            }
        }
    }
}

impl std::error::Error for LoyaltyError {}

impl From<DomainError> for LoyaltyError {
    fn from(err: DomainError) -> Self {
        use crate::domain::foundation::ErrorCode;
        match err.code {
            ErrorCode::VersionConflict => LoyaltyError::ConcurrentConflict,
            _ => LoyaltyError::Infrastructure(err.to_string()),
        }
    }
}
