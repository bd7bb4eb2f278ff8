//! Account status state machine.
//!
//! Accounts are never deleted; soft states gate further accrual and
//! redemption while preserving history.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a ledger account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Normal state. Accrual and redemption allowed.
    Active,

    /// Temporarily blocked (e.g. under dispute review). History preserved;
    /// no balance-affecting operations until reinstated.
    Suspended,

    /// Terminal state. History preserved; no further operations.
    Cancelled,
}

impl AccountStatus {
    /// Returns true if this status allows balance-affecting operations.
    pub fn is_eligible(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl StateMachine for AccountStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AccountStatus::*;
        matches!(
            (self, target),
            (Active, Suspended) | (Active, Cancelled) | (Suspended, Active) | (Suspended, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AccountStatus::*;
        match self {
            Active => vec![Suspended, Cancelled],
            Suspended => vec![Active, Cancelled],
            Cancelled => vec![],
        }
    }
}
