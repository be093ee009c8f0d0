//! # Storage Traits
//!
//! Storage abstraction traits that allow different storage backends to be
//! used interchangeably by the domain layer. All operations are synchronous;
//! repositories are cheap to clone and safe to share across threads.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::models::{
    AuditEntry, BonusPolicy, Client, ClientCategory, ClosingDetail, CommissionRule,
    MonthlyClosing, Partner, ReferenceMonth,
};

/// Interface for partner storage operations.
pub trait PartnerStorage: Send + Sync {
    /// Store a new partner
    fn store_partner(&self, partner: &Partner) -> Result<()>;

    /// Retrieve a specific partner by ID
    fn get_partner(&self, partner_id: &str) -> Result<Option<Partner>>;

    /// List all partners ordered by ID
    fn list_partners(&self) -> Result<Vec<Partner>>;
}

/// Interface for client storage operations.
pub trait ClientStorage: Send + Sync {
    /// Store a new client
    fn store_client(&self, client: &Client) -> Result<()>;

    /// Retrieve a specific client by ID
    fn get_client(&self, client_id: &str) -> Result<Option<Client>>;

    /// List all clients
    fn list_clients(&self) -> Result<Vec<Client>>;

    /// List the clients referred by one partner
    fn list_clients_by_partner(&self, partner_id: &str) -> Result<Vec<Client>>;
}

/// Interface for commission rule storage operations.
pub trait CommissionRuleStorage: Send + Sync {
    /// Store a new rule
    fn store_rule(&self, rule: &CommissionRule) -> Result<()>;

    /// List all rules
    fn list_rules(&self) -> Result<Vec<CommissionRule>>;

    /// Active rules for a category whose validity window contains the date
    fn find_active_rules_for_category_on(
        &self,
        category: ClientCategory,
        date: NaiveDate,
    ) -> Result<Vec<CommissionRule>>;

    /// Whether any active rule for the category intersects the given window
    fn has_overlapping_rule(
        &self,
        category: ClientCategory,
        effective_from: NaiveDate,
        effective_to: Option<NaiveDate>,
    ) -> Result<bool>;
}

/// Interface for bonus policy storage operations.
pub trait BonusPolicyStorage: Send + Sync {
    /// Store a new policy
    fn store_policy(&self, policy: &BonusPolicy) -> Result<()>;

    /// List all policies
    fn list_policies(&self) -> Result<Vec<BonusPolicy>>;

    /// Retrieve a policy by its unique name
    fn find_policy_by_name(&self, name: &str) -> Result<Option<BonusPolicy>>;

    /// Active client-count policies valid on the date whose threshold is met
    fn find_eligible_client_count_policies(
        &self,
        date: NaiveDate,
        client_count: u32,
    ) -> Result<Vec<BonusPolicy>>;

    /// Active revenue policies valid on the date whose threshold is met
    fn find_eligible_revenue_policies(
        &self,
        date: NaiveDate,
        revenue: Decimal,
    ) -> Result<Vec<BonusPolicy>>;
}

/// Interface for monthly closing storage operations.
pub trait ClosingStorage: Send + Sync {
    /// Retrieve the closing for a reference month, if any
    fn get_closing(&self, month: ReferenceMonth) -> Result<Option<MonthlyClosing>>;

    /// List all closings (unordered; callers sort)
    fn list_closings(&self) -> Result<Vec<MonthlyClosing>>;

    /// Upsert a closing row without touching its detail set.
    /// Used for metadata-only transitions such as reopening.
    fn save_closing(&self, closing: &MonthlyClosing) -> Result<()>;

    /// Persist a closing together with its full detail set, discarding any
    /// previously stored details for that month. The detail set is written
    /// before the closing row so a reader never observes a completed closing
    /// with stale details.
    fn replace_closing(&self, closing: &MonthlyClosing, details: &[ClosingDetail]) -> Result<()>;

    /// List the stored detail rows of a month's closing
    fn list_details(&self, month: ReferenceMonth) -> Result<Vec<ClosingDetail>>;
}

/// Interface for the append-only audit log.
pub trait AuditStorage: Send + Sync {
    /// Append one entry. Entries are never updated or deleted.
    fn append_entry(&self, entry: &AuditEntry) -> Result<()>;

    /// List all entries in insertion order
    fn list_entries(&self) -> Result<Vec<AuditEntry>>;

    /// List entries recorded for one entity, in insertion order
    fn list_entries_for_entity(&self, entity_type: &str, entity_id: &str)
        -> Result<Vec<AuditEntry>>;
}

/// Interface for storage connections.
///
/// Abstracts the concrete backend and provides factory methods for creating
/// repositories, so the domain layer can be wired against any storage
/// implementation.
pub trait Connection: Send + Sync + Clone {
    type PartnerRepository: PartnerStorage + Clone;
    type ClientRepository: ClientStorage + Clone;
    type CommissionRuleRepository: CommissionRuleStorage + Clone;
    type BonusPolicyRepository: BonusPolicyStorage + Clone;
    type ClosingRepository: ClosingStorage + Clone;
    type AuditRepository: AuditStorage + Clone;

    fn create_partner_repository(&self) -> Self::PartnerRepository;
    fn create_client_repository(&self) -> Self::ClientRepository;
    fn create_commission_rule_repository(&self) -> Self::CommissionRuleRepository;
    fn create_bonus_policy_repository(&self) -> Self::BonusPolicyRepository;
    fn create_closing_repository(&self) -> Self::ClosingRepository;
    fn create_audit_repository(&self) -> Self::AuditRepository;
}
