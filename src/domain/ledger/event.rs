//! Append-only audit trail events.
//!
//! Every balance-affecting operation appends exactly one LedgerEvent inside
//! the same atomic unit that commits the balance change. Events are never
//! mutated or deleted; replaying a user's events from zero must reproduce
//! the stored balance exactly.

use crate::domain::foundation::{EventId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Kind of balance-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Purchase,
    Referral,
    Review,
    Redemption,
    Bonus,
    Adjustment,
}

impl EventKind {
    /// Returns true for kinds that credit the balance via `Accrue`.
    ///
    /// Redemption events are produced only by the Redemption Engine.
    pub fn is_credit(&self) -> bool {
        !matches!(self, EventKind::Redemption)
    }

    /// Stable string form used by persistence adapters.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Purchase => "purchase",
            EventKind::Referral => "referral",
            EventKind::Review => "review",
            EventKind::Redemption => "redemption",
            EventKind::Bonus => "bonus",
            EventKind::Adjustment => "adjustment",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable audit record of one balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: EventId,
    pub user_id: UserId,
    pub kind: EventKind,

    /// Signed amount; negative for redemptions.
    pub amount: i64,

    pub balance_before: i64,
    pub balance_after: i64,

    /// Opaque correlation id supplied by the caller (order id, catalog item
    /// id). Accrual events with a non-empty reference are deduplicated on
    /// `(user_id, kind, reference)`.
    pub reference: String,

    pub description: String,
    pub occurred_at: Timestamp,
}

impl LedgerEvent {
    /// Creates a new event recording a balance change.
    pub fn record(
        user_id: UserId,
        kind: EventKind,
        amount: i64,
        balance_before: i64,
        reference: impl Into<String>,
        description: impl Into<String>,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            id: EventId::new(),
            user_id,
            kind,
            amount,
            balance_before,
            balance_after: balance_before + amount,
            reference: reference.into(),
            description: description.into(),
            occurred_at,
        }
    }
}

/// Violation found while verifying an event chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainViolation {
    /// Index of the offending event within the chronological sequence.
    pub index: usize,
    pub expected_balance_before: i64,
    pub actual_balance_before: i64,
}

/// Replays chronologically ordered events from zero and returns the final
/// balance.
pub fn replay_balance(events: &[LedgerEvent]) -> i64 {
    events.iter().map(|e| e.amount).sum()
}

/// Verifies the reconstructability invariant: each event's `balance_after`
/// must equal the next event's `balance_before`, starting from zero.
pub fn verify_event_chain(events: &[LedgerEvent]) -> Result<(), ChainViolation> {
    let mut running = 0;
    for (index, event) in events.iter().enumerate() {
        if event.balance_before != running {
            return Err(ChainViolation {
                index,
                expected_balance_before: running,
                actual_balance_before: event.balance_before,
            });
        }
        running = event.balance_after;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    #[test]
    fn record_computes_balance_after() {
        let event = LedgerEvent::record(
            user(),
            EventKind::Purchase,
            100,
            50,
            "order-1",
            "points for order",
            Timestamp::now(),
        );
        assert_eq!(event.balance_after, 150);
    }

    #[test]
    fn redemption_is_not_a_credit_kind() {
        assert!(!EventKind::Redemption.is_credit());
        assert!(EventKind::Purchase.is_credit());
        assert!(EventKind::Bonus.is_credit());
    }

    #[test]
    fn replay_sums_signed_amounts() {
        let now = Timestamp::now();
        let events = vec![
            LedgerEvent::record(user(), EventKind::Purchase, 200, 0, "o1", "", now),
            LedgerEvent::record(user(), EventKind::Redemption, -150, 200, "item", "", now),
            LedgerEvent::record(user(), EventKind::Bonus, 25, 50, "", "", now),
        ];
        assert_eq!(replay_balance(&events), 75);
    }

    #[test]
    fn verify_chain_accepts_contiguous_events() {
        let now = Timestamp::now();
        let events = vec![
            LedgerEvent::record(user(), EventKind::Purchase, 200, 0, "o1", "", now),
            LedgerEvent::record(user(), EventKind::Redemption, -150, 200, "item", "", now),
        ];
        assert!(verify_event_chain(&events).is_ok());
    }

    #[test]
    fn verify_chain_detects_gap() {
        let now = Timestamp::now();
        let events = vec![
            LedgerEvent::record(user(), EventKind::Purchase, 200, 0, "o1", "", now),
            // balance_before of 100 does not match the previous balance_after of 200
            LedgerEvent::record(user(), EventKind::Redemption, -50, 100, "item", "", now),
        ];
        let violation = verify_event_chain(&events).unwrap_err();
        assert_eq!(violation.index, 1);
        assert_eq!(violation.expected_balance_before, 200);
        assert_eq!(violation.actual_balance_before, 100);
    }

    #[test]
    fn event_kind_round_trips_through_str() {
        let json = serde_json::to_string(&EventKind::Redemption).unwrap();
        assert_eq!(json, "\"redemption\"");
        let kind: EventKind = serde_json::from_str("\"purchase\"").unwrap();
        assert_eq!(kind, EventKind::Purchase);
    }
}
