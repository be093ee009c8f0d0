//! Domain-level command and result types.
//!
//! These structs are used by services inside the domain layer and are not
//! exposed over the public API. The REST layer maps the DTOs defined in the
//! `shared` crate to and from these internal types.

pub mod closing {
    use crate::domain::models::{ClosingDetail, MonthlyClosing, ReferenceMonth};
    use rust_decimal::Decimal;

    /// Input for running the closing of one reference month.
    #[derive(Debug, Clone)]
    pub struct RunClosingCommand {
        pub reference_month: ReferenceMonth,
        /// Who triggered the run; recorded as `closed_by`, never evaluated
        pub actor: String,
    }

    /// Input for reopening a completed closing.
    #[derive(Debug, Clone)]
    pub struct ReopenClosingCommand {
        pub reference_month: ReferenceMonth,
        pub justification: String,
        pub actor: String,
    }

    /// A closing together with its line items.
    #[derive(Debug, Clone)]
    pub struct ClosingWithDetails {
        pub closing: MonthlyClosing,
        pub details: Vec<ClosingDetail>,
    }

    /// Per-partner grouping of one closing's line items.
    #[derive(Debug, Clone)]
    pub struct PartnerClosingSummary {
        pub partner_id: String,
        pub partner_name: String,
        pub total_clients: u32,
        pub total_commission: Decimal,
        pub total_bonus: Decimal,
        pub total_payout: Decimal,
        pub details: Vec<ClosingDetail>,
    }
}

pub mod bonus {
    use crate::domain::models::{BonusKind, ReferenceMonth};
    use rust_decimal::Decimal;

    /// One policy a partner qualified for, with a human-readable reason.
    #[derive(Debug, Clone)]
    pub struct QualifiedBonus {
        pub policy_name: String,
        pub kind: BonusKind,
        pub bonus_amount: Decimal,
        pub description: String,
    }

    /// Partner-level bonus evaluation for one month. `total_bonus` stacks
    /// every qualifying policy.
    #[derive(Debug, Clone)]
    pub struct PartnerBonusBreakdown {
        pub partner_id: String,
        pub reference_month: ReferenceMonth,
        pub active_clients_count: u32,
        pub total_revenue: Decimal,
        pub total_bonus: Decimal,
        pub details: Vec<QualifiedBonus>,
    }
}

pub mod rules {
    use crate::domain::models::{BonusKind, ClientCategory};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    /// Input for registering a commission rule.
    #[derive(Debug, Clone)]
    pub struct CreateCommissionRuleCommand {
        pub category: ClientCategory,
        pub fixed_amount: Decimal,
        pub percentage_rate: Option<Decimal>,
        pub min_billing_threshold: Option<Decimal>,
        pub max_billing_threshold: Option<Decimal>,
        pub effective_from: NaiveDate,
        pub effective_to: Option<NaiveDate>,
    }

    /// Input for registering a bonus policy.
    #[derive(Debug, Clone)]
    pub struct CreateBonusPolicyCommand {
        pub name: String,
        pub description: Option<String>,
        pub kind: BonusKind,
        pub threshold_clients: Option<u32>,
        pub revenue_threshold: Option<Decimal>,
        pub bonus_amount: Decimal,
        pub effective_from: NaiveDate,
        pub effective_to: Option<NaiveDate>,
    }
}
