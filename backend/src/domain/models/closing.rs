//! Domain models for a monthly closing and its per-client line items.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::client::ClientCategory;
use super::partner::EntityStatus;
use super::reference_month::ReferenceMonth;

/// Maximum accepted length of a reopen justification, in characters.
pub const MAX_JUSTIFICATION_LEN: usize = 1000;

/// Lifecycle status of a monthly closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosingStatus {
    InProgress,
    Completed,
    Reopened,
    /// Terminal; set administratively, never by the closing run itself
    Cancelled,
}

impl ClosingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosingStatus::InProgress => "IN_PROGRESS",
            ClosingStatus::Completed => "COMPLETED",
            ClosingStatus::Reopened => "REOPENED",
            ClosingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN_PROGRESS" => Some(ClosingStatus::InProgress),
            "COMPLETED" => Some(ClosingStatus::Completed),
            "REOPENED" => Some(ClosingStatus::Reopened),
            "CANCELLED" => Some(ClosingStatus::Cancelled),
            _ => None,
        }
    }
}

/// One closing per reference month; totals are only meaningful once the
/// closing has reached `Completed` (or was later `Reopened`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyClosing {
    pub id: String,
    pub reference_month: ReferenceMonth,
    pub status: ClosingStatus,
    pub total_partners: u32,
    pub total_clients: u32,
    pub total_commission: Decimal,
    pub total_bonus: Decimal,
    pub total_payout: Decimal,
    pub justification: Option<String>,
    pub closed_by: Option<String>,
    pub reopened_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyClosing {
    /// Fresh closing record for a month that has never been run.
    pub fn new(reference_month: ReferenceMonth) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            reference_month,
            status: ClosingStatus::InProgress,
            total_partners: 0,
            total_clients: 0,
            total_commission: Decimal::ZERO,
            total_bonus: Decimal::ZERO,
            total_payout: Decimal::ZERO,
            justification: None,
            closed_by: None,
            reopened_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ClosingStatus::Completed
    }

    /// A run is allowed unless the month is already completed.
    pub fn can_be_executed(&self) -> bool {
        self.status != ClosingStatus::Completed
    }

    /// Only a completed closing may be reopened.
    pub fn can_be_reopened(&self) -> bool {
        self.status == ClosingStatus::Completed
    }

    /// Recompute aggregate totals from a detail set.
    pub fn apply_totals(&mut self, details: &[ClosingDetail]) {
        self.total_clients = details.len() as u32;
        self.total_partners = details
            .iter()
            .map(|d| d.partner_id.as_str())
            .collect::<HashSet<_>>()
            .len() as u32;
        self.total_commission = details.iter().map(|d| d.commission_value).sum();
        self.total_bonus = details.iter().map(|d| d.bonus_value).sum();
        self.total_payout = details.iter().map(|d| d.total_value).sum();
    }
}

/// Immutable per-client line item of one closing.
///
/// Owned by its closing via `closing_id`; the whole set for a month is
/// discarded and rebuilt whenever that month is recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingDetail {
    pub id: String,
    pub closing_id: String,
    pub partner_id: String,
    pub client_id: String,
    pub client_name: String,
    pub category: ClientCategory,
    pub client_status: EntityStatus,
    pub client_active_from: Option<NaiveDate>,
    pub client_inactive_from: Option<NaiveDate>,
    pub monthly_revenue: Decimal,
    pub commission_rate: Option<Decimal>,
    pub commission_value: Decimal,
    pub bonus_value: Decimal,
    pub total_value: Decimal,
    pub observations: String,
    pub created_at: DateTime<Utc>,
}
