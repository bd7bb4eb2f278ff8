//! Loyalty policy configuration.

use serde::Deserialize;

use super::error::ConfigValidationError;

/// Policy knobs for the accrual and redemption engines.
#[derive(Debug, Clone, Deserialize)]
pub struct LoyaltyConfig {
    /// Coupon validity window in days, counted from issuance.
    #[serde(default = "default_coupon_validity_days")]
    pub coupon_validity_days: i64,

    /// How many times the accrual engine retries a version conflict before
    /// surfacing it. Accruals are commutative, so internal retries are safe.
    #[serde(default = "default_accrual_commit_retries")]
    pub accrual_commit_retries: u32,

    /// Default history page size when the caller passes zero.
    #[serde(default = "default_history_page_size")]
    pub history_default_page_size: u32,

    /// Upper bound on history page size.
    #[serde(default = "default_history_max_page_size")]
    pub history_max_page_size: u32,
}

impl LoyaltyConfig {
    /// Validate loyalty configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.coupon_validity_days <= 0 {
            return Err(ConfigValidationError::OutOfRange("coupon_validity_days"));
        }
        if self.history_default_page_size == 0
            || self.history_default_page_size > self.history_max_page_size
        {
            return Err(ConfigValidationError::OutOfRange("history_default_page_size"));
        }
        Ok(())
    }

    /// Clamps a caller-supplied page size to the configured bounds.
    pub fn clamp_page_size(&self, requested: u32) -> u32 {
        if requested == 0 {
            self.history_default_page_size
        } else {
            requested.min(self.history_max_page_size)
        }
    }
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            coupon_validity_days: default_coupon_validity_days(),
            accrual_commit_retries: default_accrual_commit_retries(),
            history_default_page_size: default_history_page_size(),
            history_max_page_size: default_history_max_page_size(),
        }
    }
}

fn default_coupon_validity_days() -> i64 {
    30
}

fn default_accrual_commit_retries() -> u32 {
    3
}

fn default_history_page_size() -> u32 {
    20
}

fn default_history_max_page_size() -> u32 {
    100
}
