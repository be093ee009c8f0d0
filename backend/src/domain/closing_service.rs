//! Monthly closing orchestration: detail computation, aggregation and the
//! run/complete/reopen lifecycle.

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

use crate::domain::audit_service::AuditService;
use crate::domain::bonus_service::client_volume_bonus;
use crate::domain::commands::closing::{
    ClosingWithDetails, PartnerClosingSummary, ReopenClosingCommand, RunClosingCommand,
};
use crate::domain::commission_service::CommissionService;
use crate::domain::errors::EngineError;
use crate::domain::models::{
    Client, ClosingDetail, ClosingStatus, MonthlyClosing, ReferenceMonth, MAX_JUSTIFICATION_LEN,
};
use crate::storage::{ClientStorage, ClosingStorage, Connection, PartnerStorage};

/// Entity type used when auditing closing transitions.
const CLOSING_ENTITY_TYPE: &str = "MonthlyClosing";

/// Service owning the closing lifecycle for every reference month.
///
/// Runs and reopens of the same month are serialized through a per-month
/// mutex; different months do not contend.
#[derive(Clone)]
pub struct ClosingService<C: Connection> {
    closing_repository: C::ClosingRepository,
    client_repository: C::ClientRepository,
    partner_repository: C::PartnerRepository,
    commission_service: CommissionService<C>,
    audit_service: AuditService<C>,
    month_locks: Arc<Mutex<HashMap<ReferenceMonth, Arc<Mutex<()>>>>>,
}

impl<C: Connection> ClosingService<C> {
    pub fn new(
        connection: Arc<C>,
        commission_service: CommissionService<C>,
        audit_service: AuditService<C>,
    ) -> Self {
        Self {
            closing_repository: connection.create_closing_repository(),
            client_repository: connection.create_client_repository(),
            partner_repository: connection.create_partner_repository(),
            commission_service,
            audit_service,
            month_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run the closing for one month.
    ///
    /// Every detail is computed in memory before anything is written, so a
    /// failed run (a missing commission rule, a storage fault) leaves no
    /// trace. Re-running a reopened month replaces its previous detail set.
    pub fn run_closing(
        &self,
        command: RunClosingCommand,
    ) -> Result<ClosingWithDetails, EngineError> {
        let month = command.reference_month;
        let lock = self.month_lock(month);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        info!("Starting monthly closing run for {}", month);

        let existing = self.closing_repository.get_closing(month)?;
        if let Some(closing) = &existing {
            if !closing.can_be_executed() {
                return Err(EngineError::ClosingAlreadyCompleted(month));
            }
        }

        let mut closing = existing.unwrap_or_else(|| MonthlyClosing::new(month));
        closing.status = ClosingStatus::InProgress;

        let details = self.calculate_details(&closing)?;

        closing.apply_totals(&details);
        closing.status = ClosingStatus::Completed;
        closing.closed_by = Some(command.actor);
        closing.updated_at = Utc::now();

        self.closing_repository.replace_closing(&closing, &details)?;

        info!(
            "Completed closing for {} with {} details ({} partners, payout {})",
            month,
            details.len(),
            closing.total_partners,
            closing.total_payout
        );

        Ok(ClosingWithDetails { closing, details })
    }

    /// Reopen a completed closing for corrections.
    ///
    /// Requires a non-blank justification of at most 1000 characters. Does
    /// not recompute anything; a subsequent run does. The transition is
    /// recorded in the audit log.
    pub fn reopen_closing(
        &self,
        command: ReopenClosingCommand,
    ) -> Result<MonthlyClosing, EngineError> {
        let justification = command.justification.trim().to_string();
        if justification.is_empty() {
            return Err(EngineError::InvalidJustification(
                "justification must not be blank".to_string(),
            ));
        }
        if justification.chars().count() > MAX_JUSTIFICATION_LEN {
            return Err(EngineError::InvalidJustification(format!(
                "justification exceeds {} characters",
                MAX_JUSTIFICATION_LEN
            )));
        }

        let month = command.reference_month;
        let lock = self.month_lock(month);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut closing = self
            .closing_repository
            .get_closing(month)?
            .ok_or(EngineError::ClosingNotFound(month))?;

        if !closing.can_be_reopened() {
            return Err(EngineError::ClosingNotReopenable {
                month,
                status: closing.status,
            });
        }

        let before = closing.clone();
        closing.status = ClosingStatus::Reopened;
        closing.justification = Some(justification.clone());
        closing.reopened_by = Some(command.actor.clone());
        closing.updated_at = Utc::now();

        self.closing_repository.save_closing(&closing)?;

        info!(
            "Reopened closing for {} by {}: {}",
            month, command.actor, justification
        );

        self.audit_service.record_reopen(
            CLOSING_ENTITY_TYPE,
            &closing.id,
            &command.actor,
            &justification,
            Some(&before),
            Some(&closing),
        );

        Ok(closing)
    }

    /// The closing for a month, with its stored detail rows.
    pub fn get_closing(&self, month: ReferenceMonth) -> Result<ClosingWithDetails, EngineError> {
        let closing = self
            .closing_repository
            .get_closing(month)?
            .ok_or(EngineError::ClosingNotFound(month))?;
        let details = self.closing_repository.list_details(month)?;
        Ok(ClosingWithDetails { closing, details })
    }

    /// All closings, newest reference month first.
    pub fn list_closings(&self) -> Result<Vec<MonthlyClosing>, EngineError> {
        let mut closings = self.closing_repository.list_closings()?;
        closings.sort_by(|a, b| b.reference_month.cmp(&a.reference_month));
        Ok(closings)
    }

    /// Group a closing's details by partner with per-partner sub-totals.
    pub fn partner_summaries(
        &self,
        month: ReferenceMonth,
    ) -> Result<Vec<PartnerClosingSummary>, EngineError> {
        let ClosingWithDetails { details, .. } = self.get_closing(month)?;

        let mut by_partner: BTreeMap<String, Vec<ClosingDetail>> = BTreeMap::new();
        for detail in details {
            by_partner
                .entry(detail.partner_id.clone())
                .or_default()
                .push(detail);
        }

        let mut summaries = Vec::with_capacity(by_partner.len());
        for (partner_id, details) in by_partner {
            let partner_name = self
                .partner_repository
                .get_partner(&partner_id)?
                .map(|partner| partner.name)
                .unwrap_or_else(|| "Unknown partner".to_string());

            summaries.push(PartnerClosingSummary {
                partner_id,
                partner_name,
                total_clients: details.len() as u32,
                total_commission: details.iter().map(|d| d.commission_value).sum(),
                total_bonus: details.iter().map(|d| d.bonus_value).sum(),
                total_payout: details.iter().map(|d| d.total_value).sum(),
                details,
            });
        }

        Ok(summaries)
    }

    fn calculate_details(
        &self,
        closing: &MonthlyClosing,
    ) -> Result<Vec<ClosingDetail>, EngineError> {
        let month = closing.reference_month;
        let month_start = month.month_start();

        let clients = self.client_repository.list_clients()?;
        let active_clients: Vec<_> = clients
            .into_iter()
            .filter(|client| client.is_active_on(month_start))
            .collect();

        let mut details = Vec::with_capacity(active_clients.len());
        for client in &active_clients {
            details.push(self.calculate_client_detail(client, closing)?);
        }

        Ok(details)
    }

    fn calculate_client_detail(
        &self,
        client: &Client,
        closing: &MonthlyClosing,
    ) -> Result<ClosingDetail, EngineError> {
        let month = closing.reference_month;
        let month_start = month.month_start();
        let month_end = month.month_end();

        let rule = self
            .commission_service
            .resolve_rule(client.category, month_start)?;

        let commission_value = self.commission_service.commission_value(client, &rule);
        let bonus_value = client_volume_bonus(client.monthly_billing);

        let observations = match client.status_effective_from {
            Some(effective) if effective > month_start && effective < month_end => {
                format!("Client deactivated on {}", effective)
            }
            _ => String::new(),
        };

        Ok(ClosingDetail {
            id: Uuid::new_v4().to_string(),
            closing_id: closing.id.clone(),
            partner_id: client.partner_id.clone(),
            client_id: client.id.clone(),
            client_name: client.name.clone(),
            category: client.category,
            client_status: client.status,
            client_active_from: Some(client.created_at.date_naive()),
            client_inactive_from: client.status_effective_from,
            monthly_revenue: client.monthly_billing,
            commission_rate: rule.percentage_rate,
            commission_value,
            bonus_value,
            total_value: commission_value + bonus_value,
            observations,
            created_at: Utc::now(),
        })
    }

    fn month_lock(&self, month: ReferenceMonth) -> Arc<Mutex<()>> {
        let mut locks = self
            .month_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(month)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        AuditAction, ClientCategory, CommissionRule, EntityStatus, Partner,
    };
    use crate::storage::csv::CsvConnection;
    use crate::storage::CommissionRuleStorage;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    struct TestContext {
        service: ClosingService<CsvConnection>,
        conn: Arc<CsvConnection>,
        _dir: tempfile::TempDir,
    }

    fn setup_test() -> TestContext {
        let temp_dir = tempdir().unwrap();
        let conn = Arc::new(CsvConnection::new(temp_dir.path().to_path_buf()).unwrap());
        let commission_service = CommissionService::new(conn.clone());
        let audit_service = AuditService::new(conn.clone());
        let service = ClosingService::new(conn.clone(), commission_service, audit_service);
        TestContext {
            service,
            conn,
            _dir: temp_dir,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month() -> ReferenceMonth {
        "2025-03".parse().unwrap()
    }

    fn seed_partner(ctx: &TestContext, partner_id: &str, name: &str) {
        let now = Utc::now();
        ctx.conn
            .create_partner_repository()
            .store_partner(&Partner {
                partner_id: partner_id.to_string(),
                name: name.to_string(),
                document: format!("doc-{}", partner_id),
                email: format!("{}@partners.example", partner_id),
                phone: None,
                status: EntityStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .expect("Failed to store partner");
    }

    fn seed_client(
        ctx: &TestContext,
        id: &str,
        partner_id: &str,
        category: ClientCategory,
        billing: Decimal,
        status: EntityStatus,
        status_effective_from: Option<NaiveDate>,
    ) {
        let now = Utc::now();
        ctx.conn
            .create_client_repository()
            .store_client(&Client {
                id: id.to_string(),
                name: format!("Client {}", id),
                document: format!("doc-{}", id),
                email: format!("{}@clients.example", id),
                phone: None,
                category,
                monthly_billing: billing,
                status,
                status_effective_from,
                partner_id: partner_id.to_string(),
                created_at: now,
                updated_at: now,
            })
            .expect("Failed to store client");
    }

    fn seed_rule(
        ctx: &TestContext,
        category: ClientCategory,
        fixed: Decimal,
        rate: Option<Decimal>,
    ) {
        let now = Utc::now();
        ctx.conn
            .create_commission_rule_repository()
            .store_rule(&CommissionRule {
                id: Uuid::new_v4().to_string(),
                category,
                fixed_amount: fixed,
                percentage_rate: rate,
                min_billing_threshold: None,
                max_billing_threshold: None,
                status: EntityStatus::Active,
                effective_from: date(2025, 1, 1),
                effective_to: None,
                created_at: now,
                updated_at: now,
            })
            .expect("Failed to store rule");
    }

    fn run(ctx: &TestContext, actor: &str) -> Result<ClosingWithDetails, EngineError> {
        ctx.service.run_closing(RunClosingCommand {
            reference_month: month(),
            actor: actor.to_string(),
        })
    }

    fn reopen(ctx: &TestContext, justification: &str, actor: &str) -> Result<MonthlyClosing, EngineError> {
        ctx.service.reopen_closing(ReopenClosingCommand {
            reference_month: month(),
            justification: justification.to_string(),
            actor: actor.to_string(),
        })
    }

    #[test]
    fn test_run_closing_completes_with_consistent_totals() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_partner(&ctx, "P-002", "South Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), Some(dec!(0.05)));
        seed_rule(&ctx, ClientCategory::Tier2, dec!(50), Some(dec!(0.02)));
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(2000), EntityStatus::Active, None);
        seed_client(&ctx, "c2", "P-001", ClientCategory::Tier2, dec!(15000), EntityStatus::Active, None);
        seed_client(&ctx, "c3", "P-002", ClientCategory::Tier1, dec!(8000), EntityStatus::Active, None);

        let result = run(&ctx, "ana").expect("Failed to run closing");
        let closing = &result.closing;

        assert_eq!(closing.status, ClosingStatus::Completed);
        assert_eq!(closing.closed_by.as_deref(), Some("ana"));
        assert_eq!(closing.total_clients, 3);
        assert_eq!(closing.total_partners, 2);

        // totals are exact sums of the detail rows
        let commission: Decimal = result.details.iter().map(|d| d.commission_value).sum();
        let bonus: Decimal = result.details.iter().map(|d| d.bonus_value).sum();
        assert_eq!(closing.total_commission, commission);
        assert_eq!(closing.total_bonus, bonus);
        assert_eq!(closing.total_payout, commission + bonus);

        // c1: 100 + 2000*0.05 = 200, no volume bonus
        // c2: 50 + 15000*0.02 = 350, volume bonus 300
        // c3: 100 + 8000*0.05 = 500, no volume bonus
        assert_eq!(closing.total_commission, dec!(1050.00));
        assert_eq!(closing.total_bonus, dec!(300.00));
        assert_eq!(closing.total_payout, dec!(1350.00));
    }

    #[test]
    fn test_run_conflicts_when_already_completed() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), None);
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(2000), EntityStatus::Active, None);

        run(&ctx, "ana").expect("Failed to run closing");
        let err = run(&ctx, "ana").unwrap_err();
        assert_eq!(err.code(), "CLOSING_ALREADY_COMPLETED");

        // the committed state did not change
        let stored = ctx.service.get_closing(month()).expect("Failed to get closing");
        assert_eq!(stored.details.len(), 1);
        assert_eq!(stored.closing.status, ClosingStatus::Completed);
    }

    #[test]
    fn test_missing_rule_aborts_run_without_persisting() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), None);
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(2000), EntityStatus::Active, None);
        // no rule exists for Tier2: this client makes the whole run fail
        seed_client(&ctx, "c2", "P-001", ClientCategory::Tier2, dec!(3000), EntityStatus::Active, None);

        let err = run(&ctx, "ana").unwrap_err();
        assert_eq!(err.code(), "RULE_NOT_FOUND");

        // nothing was committed, not even a partial detail set
        let err = ctx.service.get_closing(month()).unwrap_err();
        assert_eq!(err.code(), "CLOSING_NOT_FOUND");
    }

    #[test]
    fn test_activity_window_selects_clients() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), None);
        // active, no pending change: included
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Active, None);
        // deactivated before the month: excluded
        seed_client(&ctx, "c2", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Inactive, Some(date(2025, 2, 1)));
        // deactivation takes effect mid-month: still active at month start
        seed_client(&ctx, "c3", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Inactive, Some(date(2025, 3, 15)));
        // activation scheduled after the month: excluded
        seed_client(&ctx, "c4", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Active, Some(date(2025, 4, 1)));

        let result = run(&ctx, "ana").expect("Failed to run closing");
        let mut ids: Vec<_> = result.details.iter().map(|d| d.client_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["c1", "c3"]);
    }

    #[test]
    fn test_mid_month_deactivation_note() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), None);
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Inactive, Some(date(2025, 3, 15)));
        seed_client(&ctx, "c2", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Active, None);
        // deactivation exactly at month end is not "mid-month"
        seed_client(&ctx, "c3", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Inactive, Some(date(2025, 3, 31)));

        let result = run(&ctx, "ana").expect("Failed to run closing");
        let detail = |id: &str| {
            result
                .details
                .iter()
                .find(|d| d.client_id == id)
                .unwrap_or_else(|| panic!("missing detail for {}", id))
        };

        assert_eq!(detail("c1").observations, "Client deactivated on 2025-03-15");
        assert_eq!(detail("c1").client_inactive_from, Some(date(2025, 3, 15)));
        assert_eq!(detail("c2").observations, "");
        assert_eq!(detail("c3").observations, "");
    }

    #[test]
    fn test_reopen_requires_completed_closing() {
        let ctx = setup_test();

        // no closing at all
        let err = reopen(&ctx, "fix totals", "ana").unwrap_err();
        assert_eq!(err.code(), "CLOSING_NOT_FOUND");

        // closing exists but is in progress
        let mut closing = MonthlyClosing::new(month());
        closing.status = ClosingStatus::InProgress;
        ctx.conn
            .create_closing_repository()
            .save_closing(&closing)
            .expect("Failed to seed closing");
        let err = reopen(&ctx, "fix totals", "ana").unwrap_err();
        assert_eq!(err.code(), "CLOSING_NOT_REOPENABLE");

        // already reopened
        closing.status = ClosingStatus::Reopened;
        ctx.conn
            .create_closing_repository()
            .save_closing(&closing)
            .expect("Failed to seed closing");
        let err = reopen(&ctx, "fix totals", "ana").unwrap_err();
        assert_eq!(err.code(), "CLOSING_NOT_REOPENABLE");
    }

    #[test]
    fn test_reopen_validates_justification() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), None);
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Active, None);
        run(&ctx, "ana").expect("Failed to run closing");

        let err = reopen(&ctx, "   ", "ana").unwrap_err();
        assert_eq!(err.code(), "INVALID_JUSTIFICATION");

        let too_long = "x".repeat(MAX_JUSTIFICATION_LEN + 1);
        let err = reopen(&ctx, &too_long, "ana").unwrap_err();
        assert_eq!(err.code(), "INVALID_JUSTIFICATION");

        // still completed after the failed attempts
        let stored = ctx.service.get_closing(month()).expect("Failed to get closing");
        assert_eq!(stored.closing.status, ClosingStatus::Completed);
    }

    #[test]
    fn test_valid_reopen_transitions_and_audits() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), None);
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(1000), EntityStatus::Active, None);
        let completed = run(&ctx, "ana").expect("Failed to run closing");

        let reopened = reopen(&ctx, "commission rule was wrong", "bruno")
            .expect("Failed to reopen closing");

        assert_eq!(reopened.status, ClosingStatus::Reopened);
        assert_eq!(reopened.reopened_by.as_deref(), Some("bruno"));
        assert_eq!(
            reopened.justification.as_deref(),
            Some("commission rule was wrong")
        );

        let audit_service = AuditService::<CsvConnection>::new(ctx.conn.clone());
        let entries = audit_service
            .entries_for_entity(CLOSING_ENTITY_TYPE, &completed.closing.id)
            .expect("Failed to list audit entries");
        let reopen_entries: Vec<_> = entries
            .iter()
            .filter(|e| e.action == AuditAction::Reopen)
            .collect();
        assert_eq!(reopen_entries.len(), 1);
        assert_eq!(reopen_entries[0].actor, "bruno");
        assert_eq!(
            reopen_entries[0].justification.as_deref(),
            Some("commission rule was wrong")
        );
    }

    #[test]
    fn test_rerun_after_reopen_replaces_details() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), Some(dec!(0.05)));
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(2000), EntityStatus::Active, None);
        seed_client(&ctx, "c2", "P-001", ClientCategory::Tier1, dec!(3000), EntityStatus::Active, None);

        let first = run(&ctx, "ana").expect("Failed to run closing");
        assert_eq!(first.details.len(), 2);

        reopen(&ctx, "late client registration", "ana").expect("Failed to reopen");

        // one more client lands before the rerun
        seed_client(&ctx, "c5", "P-001", ClientCategory::Tier1, dec!(4000), EntityStatus::Active, None);

        let second = run(&ctx, "carla").expect("Failed to rerun closing");

        // replaced, not appended
        assert_eq!(second.details.len(), 3);
        let stored = ctx.service.get_closing(month()).expect("Failed to get closing");
        assert_eq!(stored.details.len(), 3);
        assert_eq!(stored.closing.closed_by.as_deref(), Some("carla"));
        assert_eq!(stored.closing.total_clients, 3);

        // same closing row, not a second one for the month
        assert_eq!(stored.closing.id, first.closing.id);
        assert_eq!(ctx.service.list_closings().unwrap().len(), 1);
    }

    #[test]
    fn test_rerun_with_unchanged_data_is_stable() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), Some(dec!(0.05)));
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(2000), EntityStatus::Active, None);

        let first = run(&ctx, "ana").expect("Failed to run closing");
        reopen(&ctx, "double checking", "ana").expect("Failed to reopen");
        let second = run(&ctx, "ana").expect("Failed to rerun closing");

        assert_eq!(first.details.len(), second.details.len());
        assert_eq!(first.closing.total_commission, second.closing.total_commission);
        assert_eq!(first.closing.total_bonus, second.closing.total_bonus);
        assert_eq!(first.closing.total_payout, second.closing.total_payout);

        let monetary = |details: &[ClosingDetail]| {
            let mut rows: Vec<_> = details
                .iter()
                .map(|d| (d.client_id.clone(), d.commission_value, d.bonus_value, d.total_value))
                .collect();
            rows.sort();
            rows
        };
        assert_eq!(monetary(&first.details), monetary(&second.details));
    }

    #[test]
    fn test_partner_summaries_group_and_subtotal() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        // P-002 intentionally missing from the partner store
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), Some(dec!(0.05)));
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(2000), EntityStatus::Active, None);
        seed_client(&ctx, "c2", "P-001", ClientCategory::Tier1, dec!(4000), EntityStatus::Active, None);
        seed_client(&ctx, "c3", "P-002", ClientCategory::Tier1, dec!(6000), EntityStatus::Active, None);

        let completed = run(&ctx, "ana").expect("Failed to run closing");
        let summaries = ctx
            .service
            .partner_summaries(month())
            .expect("Failed to build summaries");

        assert_eq!(summaries.len(), 2);
        let north = summaries.iter().find(|s| s.partner_id == "P-001").unwrap();
        let unknown = summaries.iter().find(|s| s.partner_id == "P-002").unwrap();

        assert_eq!(north.partner_name, "North Partner");
        assert_eq!(north.total_clients, 2);
        assert_eq!(unknown.partner_name, "Unknown partner");
        assert_eq!(unknown.total_clients, 1);

        let summed_payout: Decimal = summaries.iter().map(|s| s.total_payout).sum();
        assert_eq!(summed_payout, completed.closing.total_payout);
    }

    #[test]
    fn test_list_closings_newest_first() {
        let ctx = setup_test();
        let repo = ctx.conn.create_closing_repository();
        for m in ["2025-01", "2025-03", "2025-02"] {
            let mut closing = MonthlyClosing::new(m.parse().unwrap());
            closing.status = ClosingStatus::Completed;
            repo.save_closing(&closing).expect("Failed to seed closing");
        }

        let closings = ctx.service.list_closings().expect("Failed to list closings");
        let months: Vec<String> = closings
            .iter()
            .map(|c| c.reference_month.to_string())
            .collect();
        assert_eq!(months, vec!["2025-03", "2025-02", "2025-01"]);
    }

    #[test]
    fn test_concurrent_runs_commit_exactly_once() {
        let ctx = setup_test();
        seed_partner(&ctx, "P-001", "North Partner");
        seed_rule(&ctx, ClientCategory::Tier1, dec!(100), None);
        seed_client(&ctx, "c1", "P-001", ClientCategory::Tier1, dec!(2000), EntityStatus::Active, None);

        let service_a = ctx.service.clone();
        let service_b = ctx.service.clone();
        let run_for = |service: ClosingService<CsvConnection>| {
            std::thread::spawn(move || {
                service.run_closing(RunClosingCommand {
                    reference_month: "2025-03".parse().unwrap(),
                    actor: "ana".to_string(),
                })
            })
        };

        let handle_a = run_for(service_a);
        let handle_b = run_for(service_b);
        let a = handle_a.join().expect("thread panicked");
        let b = handle_b.join().expect("thread panicked");

        // the per-month lock serializes the two runs: whichever goes second
        // sees a completed closing and conflicts
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);

        let stored = ctx.service.get_closing(month()).expect("Failed to get closing");
        assert_eq!(stored.details.len(), 1);
    }
}
