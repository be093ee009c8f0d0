//! Shared DTO types exchanged between the backend REST API and its clients.
//!
//! These types are serialization-only: the backend maps its internal domain
//! models to and from these structs at the REST boundary. Dates are carried
//! as RFC 3339 strings, reference months as `YYYY-MM` strings, and monetary
//! values as fixed-point decimals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a monthly closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosingStatus {
    InProgress,
    Completed,
    Reopened,
    Cancelled,
}

/// Category a client is billed under; determines which commission rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCategory {
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
}

/// Current status of a client or partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStatus {
    Active,
    Inactive,
}

/// Which threshold axis a bonus policy evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BonusKind {
    ClientCount,
    RevenueThreshold,
}

/// One per-client line item inside a monthly closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingDetailResponse {
    pub id: String,
    pub partner_id: String,
    pub client_id: String,
    pub client_name: String,
    pub category: ClientCategory,
    pub client_status: EntityStatus,
    /// Date the client entered the book, if known (YYYY-MM-DD)
    pub client_active_from: Option<String>,
    /// Scheduled or effective deactivation date, if any (YYYY-MM-DD)
    pub client_inactive_from: Option<String>,
    pub monthly_revenue: Decimal,
    pub commission_rate: Option<Decimal>,
    pub commission_value: Decimal,
    pub bonus_value: Decimal,
    pub total_value: Decimal,
    pub observations: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// A monthly closing with its aggregate totals and line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingResponse {
    pub id: String,
    /// Reference month in `YYYY-MM` form
    pub reference_month: String,
    pub status: ClosingStatus,
    pub total_partners: u32,
    pub total_clients: u32,
    pub total_commission: Decimal,
    pub total_bonus: Decimal,
    pub total_payout: Decimal,
    pub justification: Option<String>,
    pub closed_by: Option<String>,
    pub reopened_by: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
    /// Line items; empty in list responses
    pub details: Vec<ClosingDetailResponse>,
}

/// Per-partner grouping of a closing's line items with sub-totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerClosingSummaryResponse {
    pub partner_id: String,
    pub partner_name: String,
    pub total_clients: u32,
    pub total_commission: Decimal,
    pub total_bonus: Decimal,
    pub total_payout: Decimal,
    pub client_details: Vec<ClosingDetailResponse>,
}

/// Request body for reopening a completed closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReopenClosingRequest {
    pub justification: String,
}

/// One bonus policy that a partner qualified for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusDetailResponse {
    pub policy_name: String,
    pub kind: BonusKind,
    pub bonus_amount: Decimal,
    pub description: String,
}

/// Partner-level bonus calculation for a reference month.
///
/// Every qualifying policy is listed and `total_bonus` is the sum of all of
/// them, not just the highest threshold met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusCalculationResponse {
    pub partner_id: String,
    /// Reference month in `YYYY-MM` form
    pub period: String,
    pub active_clients_count: u32,
    pub total_revenue: Decimal,
    pub total_bonus: Decimal,
    pub bonus_details: Vec<BonusDetailResponse>,
}

/// One immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntryResponse {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor: String,
    pub justification: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// Request body for creating a commission rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRuleRequest {
    pub category: ClientCategory,
    pub fixed_amount: Decimal,
    /// Fraction of billing paid as commission, 0–1 with 4 fractional digits
    pub percentage_rate: Option<Decimal>,
    pub min_billing_threshold: Option<Decimal>,
    pub max_billing_threshold: Option<Decimal>,
    /// First day the rule applies (YYYY-MM-DD)
    pub effective_from: String,
    /// Last day the rule applies, open-ended when absent (YYYY-MM-DD)
    pub effective_to: Option<String>,
}

/// A commission rule as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRuleResponse {
    pub id: String,
    pub category: ClientCategory,
    pub fixed_amount: Decimal,
    pub percentage_rate: Option<Decimal>,
    pub min_billing_threshold: Option<Decimal>,
    pub max_billing_threshold: Option<Decimal>,
    pub status: EntityStatus,
    pub effective_from: String,
    pub effective_to: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a bonus policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusPolicyRequest {
    pub name: String,
    pub description: Option<String>,
    pub kind: BonusKind,
    /// Required when kind is `ClientCount`
    pub threshold_clients: Option<u32>,
    /// Required when kind is `RevenueThreshold`
    pub revenue_threshold: Option<Decimal>,
    pub bonus_amount: Decimal,
    pub effective_from: String,
    pub effective_to: Option<String>,
}

/// A bonus policy as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusPolicyResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: BonusKind,
    pub threshold_clients: Option<u32>,
    pub revenue_threshold: Option<Decimal>,
    pub bonus_amount: Decimal,
    pub effective_from: String,
    pub effective_to: Option<String>,
    pub status: EntityStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Error body returned by the REST API for failed requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code, e.g. `CLOSING_ALREADY_COMPLETED`
    pub code: String,
    pub message: String,
}
