//! Conversions between domain types and the public DTOs in `shared`.

use crate::domain::commands::bonus::PartnerBonusBreakdown;
use crate::domain::commands::closing::{ClosingWithDetails, PartnerClosingSummary};
use crate::domain::models;

pub fn category_to_dto(category: models::ClientCategory) -> shared::ClientCategory {
    match category {
        models::ClientCategory::Tier1 => shared::ClientCategory::Tier1,
        models::ClientCategory::Tier2 => shared::ClientCategory::Tier2,
        models::ClientCategory::Tier3 => shared::ClientCategory::Tier3,
        models::ClientCategory::Tier4 => shared::ClientCategory::Tier4,
        models::ClientCategory::Tier5 => shared::ClientCategory::Tier5,
    }
}

pub fn category_from_dto(category: shared::ClientCategory) -> models::ClientCategory {
    match category {
        shared::ClientCategory::Tier1 => models::ClientCategory::Tier1,
        shared::ClientCategory::Tier2 => models::ClientCategory::Tier2,
        shared::ClientCategory::Tier3 => models::ClientCategory::Tier3,
        shared::ClientCategory::Tier4 => models::ClientCategory::Tier4,
        shared::ClientCategory::Tier5 => models::ClientCategory::Tier5,
    }
}

pub fn status_to_dto(status: models::EntityStatus) -> shared::EntityStatus {
    match status {
        models::EntityStatus::Active => shared::EntityStatus::Active,
        models::EntityStatus::Inactive => shared::EntityStatus::Inactive,
    }
}

pub fn closing_status_to_dto(status: models::ClosingStatus) -> shared::ClosingStatus {
    match status {
        models::ClosingStatus::InProgress => shared::ClosingStatus::InProgress,
        models::ClosingStatus::Completed => shared::ClosingStatus::Completed,
        models::ClosingStatus::Reopened => shared::ClosingStatus::Reopened,
        models::ClosingStatus::Cancelled => shared::ClosingStatus::Cancelled,
    }
}

pub fn bonus_kind_to_dto(kind: models::BonusKind) -> shared::BonusKind {
    match kind {
        models::BonusKind::ClientCount => shared::BonusKind::ClientCount,
        models::BonusKind::RevenueThreshold => shared::BonusKind::RevenueThreshold,
    }
}

pub fn bonus_kind_from_dto(kind: shared::BonusKind) -> models::BonusKind {
    match kind {
        shared::BonusKind::ClientCount => models::BonusKind::ClientCount,
        shared::BonusKind::RevenueThreshold => models::BonusKind::RevenueThreshold,
    }
}

pub fn detail_to_dto(detail: &models::ClosingDetail) -> shared::ClosingDetailResponse {
    shared::ClosingDetailResponse {
        id: detail.id.clone(),
        partner_id: detail.partner_id.clone(),
        client_id: detail.client_id.clone(),
        client_name: detail.client_name.clone(),
        category: category_to_dto(detail.category),
        client_status: status_to_dto(detail.client_status),
        client_active_from: detail.client_active_from.map(|d| d.to_string()),
        client_inactive_from: detail.client_inactive_from.map(|d| d.to_string()),
        monthly_revenue: detail.monthly_revenue,
        commission_rate: detail.commission_rate,
        commission_value: detail.commission_value,
        bonus_value: detail.bonus_value,
        total_value: detail.total_value,
        observations: detail.observations.clone(),
        created_at: detail.created_at.to_rfc3339(),
    }
}

pub fn closing_to_dto(
    closing: &models::MonthlyClosing,
    details: &[models::ClosingDetail],
) -> shared::ClosingResponse {
    shared::ClosingResponse {
        id: closing.id.clone(),
        reference_month: closing.reference_month.to_string(),
        status: closing_status_to_dto(closing.status),
        total_partners: closing.total_partners,
        total_clients: closing.total_clients,
        total_commission: closing.total_commission,
        total_bonus: closing.total_bonus,
        total_payout: closing.total_payout,
        justification: closing.justification.clone(),
        closed_by: closing.closed_by.clone(),
        reopened_by: closing.reopened_by.clone(),
        created_at: closing.created_at.to_rfc3339(),
        updated_at: closing.updated_at.to_rfc3339(),
        details: details.iter().map(detail_to_dto).collect(),
    }
}

pub fn closing_result_to_dto(result: &ClosingWithDetails) -> shared::ClosingResponse {
    closing_to_dto(&result.closing, &result.details)
}

pub fn partner_summary_to_dto(
    summary: &PartnerClosingSummary,
) -> shared::PartnerClosingSummaryResponse {
    shared::PartnerClosingSummaryResponse {
        partner_id: summary.partner_id.clone(),
        partner_name: summary.partner_name.clone(),
        total_clients: summary.total_clients,
        total_commission: summary.total_commission,
        total_bonus: summary.total_bonus,
        total_payout: summary.total_payout,
        client_details: summary.details.iter().map(detail_to_dto).collect(),
    }
}

pub fn bonus_breakdown_to_dto(
    breakdown: &PartnerBonusBreakdown,
) -> shared::BonusCalculationResponse {
    shared::BonusCalculationResponse {
        partner_id: breakdown.partner_id.clone(),
        period: breakdown.reference_month.to_string(),
        active_clients_count: breakdown.active_clients_count,
        total_revenue: breakdown.total_revenue,
        total_bonus: breakdown.total_bonus,
        bonus_details: breakdown
            .details
            .iter()
            .map(|detail| shared::BonusDetailResponse {
                policy_name: detail.policy_name.clone(),
                kind: bonus_kind_to_dto(detail.kind),
                bonus_amount: detail.bonus_amount,
                description: detail.description.clone(),
            })
            .collect(),
    }
}

pub fn audit_entry_to_dto(entry: &models::AuditEntry) -> shared::AuditEntryResponse {
    shared::AuditEntryResponse {
        id: entry.id.clone(),
        entity_type: entry.entity_type.clone(),
        entity_id: entry.entity_id.clone(),
        action: entry.action.as_str().to_string(),
        actor: entry.actor.clone(),
        justification: entry.justification.clone(),
        created_at: entry.created_at.to_rfc3339(),
    }
}

pub fn rule_to_dto(rule: &models::CommissionRule) -> shared::CommissionRuleResponse {
    shared::CommissionRuleResponse {
        id: rule.id.clone(),
        category: category_to_dto(rule.category),
        fixed_amount: rule.fixed_amount,
        percentage_rate: rule.percentage_rate,
        min_billing_threshold: rule.min_billing_threshold,
        max_billing_threshold: rule.max_billing_threshold,
        status: status_to_dto(rule.status),
        effective_from: rule.effective_from.to_string(),
        effective_to: rule.effective_to.map(|d| d.to_string()),
        created_at: rule.created_at.to_rfc3339(),
        updated_at: rule.updated_at.to_rfc3339(),
    }
}

pub fn policy_to_dto(policy: &models::BonusPolicy) -> shared::BonusPolicyResponse {
    shared::BonusPolicyResponse {
        id: policy.id.clone(),
        name: policy.name.clone(),
        description: policy.description.clone(),
        kind: bonus_kind_to_dto(policy.kind),
        threshold_clients: policy.threshold_clients,
        revenue_threshold: policy.revenue_threshold,
        bonus_amount: policy.bonus_amount,
        effective_from: policy.effective_from.to_string(),
        effective_to: policy.effective_to.map(|d| d.to_string()),
        status: status_to_dto(policy.status),
        created_at: policy.created_at.to_rfc3339(),
        updated_at: policy.updated_at.to_rfc3339(),
    }
}
