//! Loyalty tier bands and benefit tables.
//!
//! The Tier Engine is pure and deterministic: tier is a function of lifetime
//! accrued points only, so spending points never causes tier regression.

use serde::{Deserialize, Serialize};

/// Loyalty rank derived from lifetime accrued points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

/// Benefit snapshot granted by a tier.
///
/// Consumed by upstream order-pricing collaborators; the ledger core only
/// stores the snapshot and keeps it in sync with the tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBenefits {
    /// Percentage discount applied to purchases.
    pub purchase_discount_pct: u8,

    /// Multiplier applied to points earned on purchases.
    pub points_multiplier: f64,
}

/// Progress information toward the next tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NextTierInfo {
    /// The next tier up from the current one.
    pub tier: LoyaltyTier,

    /// Lifetime points still needed to reach it.
    pub points_remaining: i64,
}

impl LoyaltyTier {
    /// All tiers in ascending order.
    pub const ALL: [LoyaltyTier; 5] = [
        LoyaltyTier::Bronze,
        LoyaltyTier::Silver,
        LoyaltyTier::Gold,
        LoyaltyTier::Platinum,
        LoyaltyTier::Diamond,
    ];

    /// Maps lifetime accrued points to a tier using fixed ascending bands.
    pub fn for_lifetime_accrued(lifetime_accrued: i64) -> Self {
        match lifetime_accrued {
            i64::MIN..=499 => LoyaltyTier::Bronze,
            500..=1499 => LoyaltyTier::Silver,
            1500..=2999 => LoyaltyTier::Gold,
            3000..=4999 => LoyaltyTier::Platinum,
            _ => LoyaltyTier::Diamond,
        }
    }

    /// Lifetime points required to enter this tier.
    pub fn threshold(&self) -> i64 {
        match self {
            LoyaltyTier::Bronze => 0,
            LoyaltyTier::Silver => 500,
            LoyaltyTier::Gold => 1500,
            LoyaltyTier::Platinum => 3000,
            LoyaltyTier::Diamond => 5000,
        }
    }

    /// Static benefit table, one entry per tier.
    pub fn benefits(&self) -> TierBenefits {
        match self {
            LoyaltyTier::Bronze => TierBenefits {
                purchase_discount_pct: 0,
                points_multiplier: 1.0,
            },
            LoyaltyTier::Silver => TierBenefits {
                purchase_discount_pct: 5,
                points_multiplier: 1.2,
            },
            LoyaltyTier::Gold => TierBenefits {
                purchase_discount_pct: 10,
                points_multiplier: 1.5,
            },
            LoyaltyTier::Platinum => TierBenefits {
                purchase_discount_pct: 15,
                points_multiplier: 1.75,
            },
            LoyaltyTier::Diamond => TierBenefits {
                purchase_discount_pct: 20,
                points_multiplier: 2.0,
            },
        }
    }

    /// Returns the numeric rank of this tier for comparison.
    ///
    /// Higher rank = more benefits. Used to enforce monotonic progression.
    pub fn rank(&self) -> u8 {
        match self {
            LoyaltyTier::Bronze => 0,
            LoyaltyTier::Silver => 1,
            LoyaltyTier::Gold => 2,
            LoyaltyTier::Platinum => 3,
            LoyaltyTier::Diamond => 4,
        }
    }

    /// Returns the next tier up, or None at Diamond.
    pub fn next(&self) -> Option<LoyaltyTier> {
        match self {
            LoyaltyTier::Bronze => Some(LoyaltyTier::Silver),
            LoyaltyTier::Silver => Some(LoyaltyTier::Gold),
            LoyaltyTier::Gold => Some(LoyaltyTier::Platinum),
            LoyaltyTier::Platinum => Some(LoyaltyTier::Diamond),
            LoyaltyTier::Diamond => None,
        }
    }

    /// Returns the display name for this tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            LoyaltyTier::Bronze => "Bronze",
            LoyaltyTier::Silver => "Silver",
            LoyaltyTier::Gold => "Gold",
            LoyaltyTier::Platinum => "Platinum",
            LoyaltyTier::Diamond => "Diamond",
        }
    }
}

impl std::fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl Default for LoyaltyTier {
    fn default() -> Self {
        LoyaltyTier::Bronze
    }
}

/// Returns the next tier and the points remaining to reach it.
///
/// Returns None when the lifetime total already places the user at Diamond.
pub fn next_tier_info(lifetime_accrued: i64) -> Option<NextTierInfo> {
    let current = LoyaltyTier::for_lifetime_accrued(lifetime_accrued);
    current.next().map(|tier| NextTierInfo {
        tier,
        points_remaining: tier.threshold() - lifetime_accrued,
    })
}
