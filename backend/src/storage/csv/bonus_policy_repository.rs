//! CSV-based bonus policy repository.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use rust_decimal::Decimal;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use super::fields::{
    field, format_opt_date, format_opt_decimal, format_opt_u32, opt_string, parse_date,
    parse_decimal, parse_opt_date, parse_opt_decimal, parse_opt_u32, parse_timestamp,
};
use crate::domain::models::{BonusKind, BonusPolicy, EntityStatus};
use crate::storage::traits::BonusPolicyStorage;

const HEADER: [&str; 12] = [
    "id",
    "name",
    "description",
    "kind",
    "threshold_clients",
    "revenue_threshold",
    "bonus_amount",
    "effective_from",
    "effective_to",
    "status",
    "created_at",
    "updated_at",
];

#[derive(Clone)]
pub struct BonusPolicyRepository {
    connection: CsvConnection,
}

impl BonusPolicyRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_policies(&self) -> Result<Vec<BonusPolicy>> {
        let path = self.connection.bonus_policies_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut policies = Vec::new();
        for result in reader.records() {
            let record = result?;
            let kind_str = field(&record, 3, "kind")?;
            let status_str = field(&record, 9, "status")?;
            policies.push(BonusPolicy {
                id: field(&record, 0, "id")?.to_string(),
                name: field(&record, 1, "name")?.to_string(),
                description: opt_string(field(&record, 2, "description")?),
                kind: BonusKind::parse(kind_str)
                    .ok_or_else(|| anyhow!("invalid bonus kind '{}'", kind_str))?,
                threshold_clients: parse_opt_u32(
                    field(&record, 4, "threshold_clients")?,
                    "threshold_clients",
                )?,
                revenue_threshold: parse_opt_decimal(
                    field(&record, 5, "revenue_threshold")?,
                    "revenue_threshold",
                )?,
                bonus_amount: parse_decimal(field(&record, 6, "bonus_amount")?, "bonus_amount")?,
                effective_from: parse_date(
                    field(&record, 7, "effective_from")?,
                    "effective_from",
                )?,
                effective_to: parse_opt_date(field(&record, 8, "effective_to")?, "effective_to")?,
                status: EntityStatus::parse(status_str)
                    .ok_or_else(|| anyhow!("invalid policy status '{}'", status_str))?,
                created_at: parse_timestamp(field(&record, 10, "created_at")?, "created_at")?,
                updated_at: parse_timestamp(field(&record, 11, "updated_at")?, "updated_at")?,
            });
        }

        Ok(policies)
    }

    fn write_policies(&self, policies: &[BonusPolicy]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.connection.bonus_policies_path())?;
        let mut writer = Writer::from_writer(BufWriter::new(file));

        writer.write_record(HEADER)?;
        for policy in policies {
            writer.write_record([
                policy.id.as_str(),
                policy.name.as_str(),
                policy.description.as_deref().unwrap_or(""),
                policy.kind.as_str(),
                format_opt_u32(policy.threshold_clients).as_str(),
                format_opt_decimal(policy.revenue_threshold).as_str(),
                policy.bonus_amount.to_string().as_str(),
                policy.effective_from.to_string().as_str(),
                format_opt_date(policy.effective_to).as_str(),
                policy.status.as_str(),
                policy.created_at.to_rfc3339().as_str(),
                policy.updated_at.to_rfc3339().as_str(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl BonusPolicyStorage for BonusPolicyRepository {
    fn store_policy(&self, policy: &BonusPolicy) -> Result<()> {
        let mut policies = self.read_policies()?;
        policies.retain(|p| p.id != policy.id);
        policies.push(policy.clone());
        self.write_policies(&policies)
    }

    fn list_policies(&self) -> Result<Vec<BonusPolicy>> {
        self.read_policies()
    }

    fn find_policy_by_name(&self, name: &str) -> Result<Option<BonusPolicy>> {
        Ok(self
            .read_policies()?
            .into_iter()
            .find(|p| p.name == name))
    }

    fn find_eligible_client_count_policies(
        &self,
        date: NaiveDate,
        client_count: u32,
    ) -> Result<Vec<BonusPolicy>> {
        let mut eligible: Vec<_> = self
            .read_policies()?
            .into_iter()
            .filter(|policy| {
                policy.kind == BonusKind::ClientCount
                    && policy.is_effective_on(date)
                    && policy
                        .threshold_clients
                        .map_or(false, |threshold| threshold <= client_count)
            })
            .collect();
        eligible.sort_by(|a, b| b.threshold_clients.cmp(&a.threshold_clients));
        Ok(eligible)
    }

    fn find_eligible_revenue_policies(
        &self,
        date: NaiveDate,
        revenue: Decimal,
    ) -> Result<Vec<BonusPolicy>> {
        let mut eligible: Vec<_> = self
            .read_policies()?
            .into_iter()
            .filter(|policy| {
                policy.kind == BonusKind::RevenueThreshold
                    && policy.is_effective_on(date)
                    && policy
                        .revenue_threshold
                        .map_or(false, |threshold| threshold <= revenue)
            })
            .collect();
        eligible.sort_by(|a, b| b.revenue_threshold.cmp(&a.revenue_threshold));
        Ok(eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client_count_policy(name: &str, threshold: u32) -> BonusPolicy {
        let now = Utc::now();
        BonusPolicy {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: Some("volume incentive".to_string()),
            kind: BonusKind::ClientCount,
            threshold_clients: Some(threshold),
            revenue_threshold: None,
            bonus_amount: dec!(100),
            effective_from: date(2025, 1, 1),
            effective_to: None,
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_round_trip_and_name_lookup() {
        let dir = tempdir().unwrap();
        let repo = BonusPolicyRepository::new(CsvConnection::new(dir.path()).unwrap());

        repo.store_policy(&client_count_policy("Five clients", 5))
            .unwrap();

        let loaded = repo
            .find_policy_by_name("Five clients")
            .unwrap()
            .expect("policy missing");
        assert_eq!(loaded.threshold_clients, Some(5));
        assert_eq!(loaded.revenue_threshold, None);
        assert_eq!(loaded.description.as_deref(), Some("volume incentive"));
        assert!(repo.find_policy_by_name("absent").unwrap().is_none());
    }

    #[test]
    fn test_eligible_client_count_ordering_and_window() {
        let dir = tempdir().unwrap();
        let repo = BonusPolicyRepository::new(CsvConnection::new(dir.path()).unwrap());

        repo.store_policy(&client_count_policy("Five", 5)).unwrap();
        repo.store_policy(&client_count_policy("Ten", 10)).unwrap();
        let mut expired = client_count_policy("Expired", 1);
        expired.effective_to = Some(date(2025, 1, 31));
        repo.store_policy(&expired).unwrap();

        let eligible = repo
            .find_eligible_client_count_policies(date(2025, 3, 1), 12)
            .unwrap();
        let names: Vec<_> = eligible.iter().map(|p| p.name.as_str()).collect();
        // highest threshold first, expired window excluded
        assert_eq!(names, vec!["Ten", "Five"]);
    }
}
