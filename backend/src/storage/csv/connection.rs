//! CSV storage connection: owns the data directory layout and hands out
//! repositories for each entity.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::models::ReferenceMonth;
use crate::storage::csv::{
    AuditRepository, BonusPolicyRepository, ClientRepository, ClosingRepository,
    CommissionRuleRepository, PartnerRepository,
};
use crate::storage::traits::Connection;

/// Manages file paths inside the data directory and ensures it exists.
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a connection rooted at the given directory, creating it (and
    /// the closing detail subdirectory) if needed.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }
        fs::create_dir_all(base_path.join("closing_details"))?;

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a connection in the default data directory, overridable with
    /// the `PARTNERSHIP_DATA_DIR` environment variable.
    pub fn new_default() -> Result<Self> {
        let data_dir = std::env::var("PARTNERSHIP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        info!("Using data directory: {}", data_dir.display());
        Self::new(data_dir)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn partners_path(&self) -> PathBuf {
        self.base_directory.join("partners.csv")
    }

    pub fn clients_path(&self) -> PathBuf {
        self.base_directory.join("clients.csv")
    }

    pub fn commission_rules_path(&self) -> PathBuf {
        self.base_directory.join("commission_rules.csv")
    }

    pub fn bonus_policies_path(&self) -> PathBuf {
        self.base_directory.join("bonus_policies.csv")
    }

    pub fn closings_path(&self) -> PathBuf {
        self.base_directory.join("closings.csv")
    }

    /// One detail file per closing month; replacing a month's details is a
    /// rewrite of this file.
    pub fn closing_details_path(&self, month: ReferenceMonth) -> PathBuf {
        self.base_directory
            .join("closing_details")
            .join(format!("{}.csv", month))
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.base_directory.join("audit_log.csv")
    }
}

impl Connection for CsvConnection {
    type PartnerRepository = PartnerRepository;
    type ClientRepository = ClientRepository;
    type CommissionRuleRepository = CommissionRuleRepository;
    type BonusPolicyRepository = BonusPolicyRepository;
    type ClosingRepository = ClosingRepository;
    type AuditRepository = AuditRepository;

    fn create_partner_repository(&self) -> Self::PartnerRepository {
        PartnerRepository::new(self.clone())
    }

    fn create_client_repository(&self) -> Self::ClientRepository {
        ClientRepository::new(self.clone())
    }

    fn create_commission_rule_repository(&self) -> Self::CommissionRuleRepository {
        CommissionRuleRepository::new(self.clone())
    }

    fn create_bonus_policy_repository(&self) -> Self::BonusPolicyRepository {
        BonusPolicyRepository::new(self.clone())
    }

    fn create_closing_repository(&self) -> Self::ClosingRepository {
        ClosingRepository::new(self.clone())
    }

    fn create_audit_repository(&self) -> Self::AuditRepository {
        AuditRepository::new(self.clone())
    }
}
