//! Domain model for an effective-dated commission rule.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::client::ClientCategory;
use super::partner::EntityStatus;

/// Commission schedule for one client category over a validity window.
///
/// For a given category, active rule windows must not overlap; the rule
/// repository rejects overlapping writes. An absent `effective_to` leaves the
/// window open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: String,
    pub category: ClientCategory,
    pub fixed_amount: Decimal,
    /// Fraction of billing paid as commission, 0–1, four fractional digits
    pub percentage_rate: Option<Decimal>,
    pub min_billing_threshold: Option<Decimal>,
    pub max_billing_threshold: Option<Decimal>,
    pub status: EntityStatus,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommissionRule {
    /// Whether the rule's validity window contains the date.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.map_or(true, |to| date <= to)
    }

    /// Whether this rule's window intersects the given window.
    pub fn overlaps(&self, from: NaiveDate, to: Option<NaiveDate>) -> bool {
        let ends_before_other_starts = self.effective_to.map_or(false, |self_to| self_to < from);
        let other_ends_before_self_starts = to.map_or(false, |other_to| other_to < self.effective_from);
        !(ends_before_other_starts || other_ends_before_self_starts)
    }
}
