//! Bonus policy evaluation.
//!
//! Two independent partner-level axes (active-client count and aggregate
//! revenue) plus the flat per-client volume bonus applied inside closing
//! details. Partner-level evaluation stacks: every qualifying policy
//! contributes its full amount.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::commands::bonus::{PartnerBonusBreakdown, QualifiedBonus};
use crate::domain::commands::rules::CreateBonusPolicyCommand;
use crate::domain::errors::EngineError;
use crate::domain::models::{BonusKind, BonusPolicy, EntityStatus, ReferenceMonth};
use crate::storage::{BonusPolicyStorage, ClientStorage, Connection};

/// Billing above this amount earns the flat per-client volume bonus.
pub fn client_volume_bonus_threshold() -> Decimal {
    Decimal::new(10_000, 0)
}

/// Rate applied to billing for the flat per-client volume bonus.
pub fn client_volume_bonus_rate() -> Decimal {
    // 2%
    Decimal::new(2, 2)
}

/// Flat per-client bonus: 2% of billing once billing exceeds the volume
/// threshold. Not driven by `BonusPolicy` rows.
pub fn client_volume_bonus(monthly_billing: Decimal) -> Decimal {
    if monthly_billing > client_volume_bonus_threshold() {
        (monthly_billing * client_volume_bonus_rate()).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

/// Service evaluating partner-level bonus policies.
#[derive(Clone)]
pub struct BonusService<C: Connection> {
    policy_repository: C::BonusPolicyRepository,
    client_repository: C::ClientRepository,
}

impl<C: Connection> BonusService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            policy_repository: connection.create_bonus_policy_repository(),
            client_repository: connection.create_client_repository(),
        }
    }

    /// All active client-count policies valid on the date whose threshold the
    /// count meets.
    pub fn eligible_by_client_count(
        &self,
        date: NaiveDate,
        client_count: u32,
    ) -> Result<Vec<BonusPolicy>, EngineError> {
        Ok(self
            .policy_repository
            .find_eligible_client_count_policies(date, client_count)?)
    }

    /// All active revenue policies valid on the date whose threshold the
    /// revenue meets.
    pub fn eligible_by_revenue(
        &self,
        date: NaiveDate,
        revenue: Decimal,
    ) -> Result<Vec<BonusPolicy>, EngineError> {
        Ok(self
            .policy_repository
            .find_eligible_revenue_policies(date, revenue)?)
    }

    /// Evaluate both axes for one partner on the first day of the reference
    /// month and stack every qualifying policy into the total.
    pub fn calculate_partner_bonus(
        &self,
        partner_id: &str,
        reference_month: ReferenceMonth,
    ) -> Result<PartnerBonusBreakdown, EngineError> {
        let calculation_date = reference_month.month_start();

        let partner_clients = self.client_repository.list_clients_by_partner(partner_id)?;
        let active_clients: Vec<_> = partner_clients
            .iter()
            .filter(|client| client.is_active_on(calculation_date))
            .collect();

        let active_clients_count = active_clients.len() as u32;
        let total_revenue: Decimal = active_clients
            .iter()
            .map(|client| client.monthly_billing)
            .sum();

        let mut details = Vec::new();

        for policy in self.eligible_by_client_count(calculation_date, active_clients_count)? {
            details.push(QualifiedBonus {
                policy_name: policy.name.clone(),
                kind: policy.kind,
                bonus_amount: policy.bonus_amount,
                description: format!(
                    "{} active clients (threshold: {})",
                    active_clients_count,
                    policy.threshold_clients.unwrap_or(0)
                ),
            });
        }

        for policy in self.eligible_by_revenue(calculation_date, total_revenue)? {
            details.push(QualifiedBonus {
                policy_name: policy.name.clone(),
                kind: policy.kind,
                bonus_amount: policy.bonus_amount,
                description: format!(
                    "{} aggregate revenue (threshold: {})",
                    total_revenue,
                    policy.revenue_threshold.unwrap_or(Decimal::ZERO)
                ),
            });
        }

        let total_bonus: Decimal = details.iter().map(|d| d.bonus_amount).sum();

        info!(
            "Partner {} qualifies for {} bonus policies in {} (total: {})",
            partner_id,
            details.len(),
            reference_month,
            total_bonus
        );

        Ok(PartnerBonusBreakdown {
            partner_id: partner_id.to_string(),
            reference_month,
            active_clients_count,
            total_revenue,
            total_bonus,
            details,
        })
    }

    /// Register a new policy after validating its threshold shape.
    pub fn create_policy(
        &self,
        command: CreateBonusPolicyCommand,
    ) -> Result<BonusPolicy, EngineError> {
        match command.kind {
            BonusKind::ClientCount => {
                if command.threshold_clients.is_none() {
                    return Err(EngineError::InvalidBonusPolicy(
                        "threshold_clients is required for CLIENT_COUNT policies".to_string(),
                    ));
                }
                if command.revenue_threshold.is_some() {
                    return Err(EngineError::InvalidBonusPolicy(
                        "revenue_threshold must not be set for CLIENT_COUNT policies".to_string(),
                    ));
                }
            }
            BonusKind::RevenueThreshold => {
                if command.revenue_threshold.is_none() {
                    return Err(EngineError::InvalidBonusPolicy(
                        "revenue_threshold is required for REVENUE_THRESHOLD policies".to_string(),
                    ));
                }
                if command.threshold_clients.is_some() {
                    return Err(EngineError::InvalidBonusPolicy(
                        "threshold_clients must not be set for REVENUE_THRESHOLD policies"
                            .to_string(),
                    ));
                }
            }
        }

        if self
            .policy_repository
            .find_policy_by_name(&command.name)?
            .is_some()
        {
            return Err(EngineError::InvalidBonusPolicy(format!(
                "a bonus policy named '{}' already exists",
                command.name
            )));
        }

        let now = Utc::now();
        let policy = BonusPolicy {
            id: Uuid::new_v4().to_string(),
            name: command.name,
            description: command.description,
            kind: command.kind,
            threshold_clients: command.threshold_clients,
            revenue_threshold: command.revenue_threshold,
            bonus_amount: command.bonus_amount,
            effective_from: command.effective_from,
            effective_to: command.effective_to,
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.policy_repository.store_policy(&policy)?;
        info!("Registered bonus policy '{}'", policy.name);

        Ok(policy)
    }

    /// List every stored policy.
    pub fn list_policies(&self) -> Result<Vec<BonusPolicy>, EngineError> {
        Ok(self.policy_repository.list_policies()?)
    }
}
