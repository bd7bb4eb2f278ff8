//! Coupon issued artifact.
//!
//! A coupon is created by a successful redemption and consumed exactly once
//! by the external apply-to-order collaborator. Expired or unused coupons
//! stay on the account for audit.

use crate::domain::catalog::RewardKind;
use crate::domain::foundation::{CatalogItemId, CouponId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};

/// Time-boxed, single-use artifact issued by a redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Globally unique, generated at issuance.
    pub id: CouponId,

    /// Catalog item this coupon was redeemed from.
    pub catalog_item_id: CatalogItemId,

    /// Reward kind copied from the catalog item at issuance.
    pub kind: RewardKind,

    /// Reward value copied from the catalog item at issuance.
    pub value: f64,

    /// When the coupon was issued.
    pub issued_at: Timestamp,

    /// End of the validity window.
    pub expires_at: Timestamp,

    /// Whether the coupon has been applied to an order.
    pub redeemed: bool,
}

impl Coupon {
    /// Issues a fresh coupon for a catalog item with the given validity window.
    pub fn issue(
        catalog_item_id: CatalogItemId,
        kind: RewardKind,
        value: f64,
        issued_at: Timestamp,
        validity_days: i64,
    ) -> Self {
        Self {
            id: CouponId::new(),
            catalog_item_id,
            kind,
            value,
            issued_at,
            expires_at: issued_at.add_days(validity_days),
            redeemed: false,
        }
    }

    /// Returns true if the validity window has passed.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.is_after(&self.expires_at)
    }

    /// Returns true if the coupon can still be applied to an order.
    pub fn is_usable(&self, now: Timestamp) -> bool {
        !self.redeemed && !self.is_expired(now)
    }

    /// Marks the coupon as applied to an order.
    ///
    /// # Errors
    ///
    /// Rejects coupons that were already consumed or have expired.
    pub fn consume(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        if self.redeemed {
            return Err(ValidationError::invalid_format(
                "coupon",
                "coupon has already been redeemed",
            ));
        }
        if self.is_expired(now) {
            return Err(ValidationError::invalid_format("coupon", "coupon has expired"));
        }
        self.redeemed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_coupon() -> Coupon {
        Coupon::issue(
            CatalogItemId::new(),
            RewardKind::Discount,
            15.0,
            Timestamp::now(),
            30,
        )
    }

    #[test]
    fn issue_sets_expiry_from_validity_window() {
        let coupon = test_coupon();
        let days = coupon.expires_at.duration_since(&coupon.issued_at).num_days();
        assert_eq!(days, 30);
        assert!(!coupon.redeemed);
    }

    #[test]
    fn fresh_coupon_is_usable() {
        let coupon = test_coupon();
        assert!(coupon.is_usable(Timestamp::now()));
    }

    #[test]
    fn consume_flips_redeemed_exactly_once() {
        let mut coupon = test_coupon();
        assert!(coupon.consume(Timestamp::now()).is_ok());
        assert!(coupon.redeemed);
        assert!(coupon.consume(Timestamp::now()).is_err());
    }

    #[test]
    fn expired_coupon_cannot_be_consumed() {
        let mut coupon = test_coupon();
        let after_expiry = coupon.expires_at.add_days(1);
        assert!(coupon.is_expired(after_expiry));
        assert!(coupon.consume(after_expiry).is_err());
        assert!(!coupon.redeemed);
    }

    #[test]
    fn coupon_ids_are_unique_per_issuance() {
        assert_ne!(test_coupon().id, test_coupon().id);
    }
}
