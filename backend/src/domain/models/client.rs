//! Domain model for a referred client.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::partner::EntityStatus;

/// Billing category a client falls under; each category has its own
/// commission rule schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientCategory {
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
}

impl ClientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientCategory::Tier1 => "TIER_1",
            ClientCategory::Tier2 => "TIER_2",
            ClientCategory::Tier3 => "TIER_3",
            ClientCategory::Tier4 => "TIER_4",
            ClientCategory::Tier5 => "TIER_5",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TIER_1" => Some(ClientCategory::Tier1),
            "TIER_2" => Some(ClientCategory::Tier2),
            "TIER_3" => Some(ClientCategory::Tier3),
            "TIER_4" => Some(ClientCategory::Tier4),
            "TIER_5" => Some(ClientCategory::Tier5),
            _ => None,
        }
    }
}

/// A client referred by a partner.
///
/// `status` always reflects the final state; `status_effective_from` marks
/// when that state takes or took effect. Only a single pending transition can
/// be represented at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub document: String,
    pub email: String,
    pub phone: Option<String>,
    pub category: ClientCategory,
    pub monthly_billing: Decimal,
    pub status: EntityStatus,
    pub status_effective_from: Option<NaiveDate>,
    pub partner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Whether the client counts as active on the given date.
    ///
    /// An `Active` client is active unless its status change is scheduled
    /// after the date; an `Inactive` client still counts as active when its
    /// deactivation only takes effect after the date.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        match self.status {
            EntityStatus::Active => self
                .status_effective_from
                .map_or(true, |effective| effective <= date),
            EntityStatus::Inactive => self
                .status_effective_from
                .map_or(false, |effective| effective > date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_client(status: EntityStatus, effective_from: Option<NaiveDate>) -> Client {
        Client {
            id: "client-1".to_string(),
            name: "Acme Ltda".to_string(),
            document: "11.222.333/0001-44".to_string(),
            email: "contact@acme.example".to_string(),
            phone: None,
            category: ClientCategory::Tier1,
            monthly_billing: dec!(5000),
            status,
            status_effective_from: effective_from,
            partner_id: "P-001".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_active_client_without_pending_change() {
        let client = test_client(EntityStatus::Active, None);
        assert!(client.is_active_on(date(2025, 3, 1)));
    }

    #[test]
    fn test_active_client_with_past_effective_date() {
        let client = test_client(EntityStatus::Active, Some(date(2025, 1, 15)));
        assert!(client.is_active_on(date(2025, 3, 1)));
        // boundary: effective on the target date itself
        assert!(client.is_active_on(date(2025, 1, 15)));
    }

    #[test]
    fn test_active_client_with_future_effective_date() {
        // Activation only takes effect later; not yet active at the target date
        let client = test_client(EntityStatus::Active, Some(date(2025, 6, 1)));
        assert!(!client.is_active_on(date(2025, 3, 1)));
    }

    #[test]
    fn test_inactive_client_with_future_deactivation() {
        // Deactivation scheduled after the target date; historically still active
        let client = test_client(EntityStatus::Inactive, Some(date(2025, 6, 1)));
        assert!(client.is_active_on(date(2025, 3, 1)));
    }

    #[test]
    fn test_inactive_client_with_past_deactivation() {
        let client = test_client(EntityStatus::Inactive, Some(date(2025, 1, 1)));
        assert!(!client.is_active_on(date(2025, 3, 1)));
        // boundary: deactivation effective exactly on the target date
        assert!(!client.is_active_on(date(2025, 1, 1)));
    }

    #[test]
    fn test_inactive_client_without_effective_date() {
        let client = test_client(EntityStatus::Inactive, None);
        assert!(!client.is_active_on(date(2025, 3, 1)));
    }
}
