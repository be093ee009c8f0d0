//! Domain model for a performance bonus policy.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::partner::EntityStatus;

/// Which threshold axis a bonus policy evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BonusKind {
    /// Qualifies when a partner's active-client count reaches the threshold
    ClientCount,
    /// Qualifies when a partner's aggregate revenue reaches the threshold
    RevenueThreshold,
}

impl BonusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusKind::ClientCount => "CLIENT_COUNT",
            BonusKind::RevenueThreshold => "REVENUE_THRESHOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CLIENT_COUNT" => Some(BonusKind::ClientCount),
            "REVENUE_THRESHOLD" => Some(BonusKind::RevenueThreshold),
            _ => None,
        }
    }
}

/// An effective-dated bonus policy.
///
/// Exactly one of `threshold_clients` / `revenue_threshold` is set, matching
/// `kind`; the policy repository rejects writes that violate this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusPolicy {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: BonusKind,
    pub threshold_clients: Option<u32>,
    pub revenue_threshold: Option<Decimal>,
    pub bonus_amount: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BonusPolicy {
    /// Whether the policy is active and its validity window contains the date.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.status == EntityStatus::Active
            && self.effective_from <= date
            && self.effective_to.map_or(true, |to| date <= to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn policy(status: EntityStatus, to: Option<NaiveDate>) -> BonusPolicy {
        BonusPolicy {
            id: "policy-1".to_string(),
            name: "Five clients".to_string(),
            description: None,
            kind: BonusKind::ClientCount,
            threshold_clients: Some(5),
            revenue_threshold: None,
            bonus_amount: dec!(100),
            effective_from: date(2025, 1, 1),
            effective_to: to,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_within_window() {
        let policy = policy(EntityStatus::Active, Some(date(2025, 12, 31)));
        assert!(policy.is_effective_on(date(2025, 6, 1)));
        assert!(policy.is_effective_on(date(2025, 1, 1)));
        assert!(policy.is_effective_on(date(2025, 12, 31)));
        assert!(!policy.is_effective_on(date(2026, 1, 1)));
        assert!(!policy.is_effective_on(date(2024, 12, 31)));
    }

    #[test]
    fn test_inactive_policy_never_effective() {
        let policy = policy(EntityStatus::Inactive, None);
        assert!(!policy.is_effective_on(date(2025, 6, 1)));
    }
}
