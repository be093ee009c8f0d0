//! CSV-file-backed storage.
//!
//! One file per entity under the data directory, plus one detail file per
//! closing month. Repositories read the whole file and rewrite it on
//! mutation; the audit log is the exception and is append-only.

mod audit_repository;
mod bonus_policy_repository;
mod client_repository;
mod closing_repository;
mod commission_rule_repository;
mod connection;
mod fields;
mod partner_repository;

pub use audit_repository::AuditRepository;
pub use bonus_policy_repository::BonusPolicyRepository;
pub use client_repository::ClientRepository;
pub use closing_repository::ClosingRepository;
pub use commission_rule_repository::CommissionRuleRepository;
pub use connection::CsvConnection;
pub use partner_repository::PartnerRepository;
