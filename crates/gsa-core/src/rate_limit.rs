//! GitHub API rate-limit budgets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How often a signed-in session re-reads its rate limits.
pub const RATE_LIMIT_CHECK_INTERVAL_MINUTES: u32 = 5;

/// Usage at or above this percentage is a warning.
const WARNING_PERCENT: u8 = 70;
/// Usage at or above this percentage is critical.
const CRITICAL_PERCENT: u8 = 90;

/// One request budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub used: u64,
    /// Unix time, in seconds, at which the budget refills.
    pub reset_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl RateLimit {
    /// Share of the budget already spent, rounded to the nearest percent.
    /// A zero limit reads as 0%.
    pub fn usage_percentage(&self) -> u8 {
        if self.limit == 0 {
            return 0;
        }
        let percent = (self.used.saturating_mul(100) + self.limit / 2) / self.limit;
        percent.min(100) as u8
    }

    pub fn level(&self) -> UsageLevel {
        match self.usage_percentage() {
            p if p >= CRITICAL_PERCENT => UsageLevel::Critical,
            p if p >= WARNING_PERCENT => UsageLevel::Warning,
            _ => UsageLevel::Normal,
        }
    }

    /// Seconds until the budget refills, `0` once `now` has passed it.
    pub fn seconds_until_reset(&self, now: i64) -> i64 {
        (self.reset_at - now).max(0)
    }
}

/// The budgets GitHub reports for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub core: RateLimit,
    pub search: RateLimit,
    /// Absent on hosts that do not report a GraphQL budget.
    pub graphql: Option<RateLimit>,
}

/// Reads the rate limits of the stored token.
#[async_trait]
pub trait RateLimitSource: Send + Sync {
    /// `Ok(None)` when no token is stored.
    async fn get_rate_limits(&self) -> Result<Option<RateLimits>>;
}
