//! Commission rule resolution and commission calculation.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::commands::rules::CreateCommissionRuleCommand;
use crate::domain::errors::EngineError;
use crate::domain::models::{Client, ClientCategory, CommissionRule, EntityStatus};
use crate::storage::{CommissionRuleStorage, Connection};

/// Service resolving effective-dated commission rules and computing
/// commission values from them.
#[derive(Clone)]
pub struct CommissionService<C: Connection> {
    rule_repository: C::CommissionRuleRepository,
}

impl<C: Connection> CommissionService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            rule_repository: connection.create_commission_rule_repository(),
        }
    }

    /// Resolve the single commission rule in force for a category on a date.
    ///
    /// Among active rules whose window contains the date, the one with the
    /// latest `effective_from` wins. Overlaps are rejected at write time, so
    /// the tie-break only matters if bad data slipped in.
    pub fn resolve_rule(
        &self,
        category: ClientCategory,
        date: NaiveDate,
    ) -> Result<CommissionRule, EngineError> {
        let candidates = self
            .rule_repository
            .find_active_rules_for_category_on(category, date)?;

        candidates
            .into_iter()
            .max_by_key(|rule| rule.effective_from)
            .ok_or(EngineError::RuleNotFound { category, date })
    }

    /// Commission owed for a client under a rule.
    ///
    /// Billing outside the rule's optional min/max thresholds earns nothing;
    /// otherwise the fixed amount plus the percentage of billing, rounded to
    /// two fractional digits.
    pub fn commission_value(&self, client: &Client, rule: &CommissionRule) -> Decimal {
        let billing = client.monthly_billing;

        if let Some(min) = rule.min_billing_threshold {
            if billing < min {
                return Decimal::ZERO;
            }
        }
        if let Some(max) = rule.max_billing_threshold {
            if billing > max {
                return Decimal::ZERO;
            }
        }

        let rate = rule.percentage_rate.unwrap_or(Decimal::ZERO);
        (rule.fixed_amount + billing * rate).round_dp(2)
    }

    /// Register a new rule, rejecting windows that overlap an existing
    /// active rule for the same category.
    pub fn create_rule(
        &self,
        command: CreateCommissionRuleCommand,
    ) -> Result<CommissionRule, EngineError> {
        if let Some(rate) = command.percentage_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(EngineError::InvalidCommissionRule(format!(
                    "percentage rate must be between 0 and 1, got {}",
                    rate
                )));
            }
        }

        if self.rule_repository.has_overlapping_rule(
            command.category,
            command.effective_from,
            command.effective_to,
        )? {
            return Err(EngineError::OverlappingRule {
                category: command.category,
            });
        }

        let now = Utc::now();
        let rule = CommissionRule {
            id: Uuid::new_v4().to_string(),
            category: command.category,
            fixed_amount: command.fixed_amount,
            percentage_rate: command.percentage_rate.map(|r| r.round_dp(4)),
            min_billing_threshold: command.min_billing_threshold,
            max_billing_threshold: command.max_billing_threshold,
            status: EntityStatus::Active,
            effective_from: command.effective_from,
            effective_to: command.effective_to,
            created_at: now,
            updated_at: now,
        };

        self.rule_repository.store_rule(&rule)?;
        info!(
            "Registered commission rule for {:?} effective from {}",
            rule.category, rule.effective_from
        );

        Ok(rule)
    }

    /// List every stored rule.
    pub fn list_rules(&self) -> Result<Vec<CommissionRule>, EngineError> {
        Ok(self.rule_repository.list_rules()?)
    }
}
