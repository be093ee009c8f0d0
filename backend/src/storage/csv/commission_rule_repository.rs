//! CSV-based commission rule repository.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use super::fields::{
    field, format_opt_date, format_opt_decimal, parse_date, parse_decimal, parse_opt_date,
    parse_opt_decimal, parse_timestamp,
};
use crate::domain::models::{ClientCategory, CommissionRule, EntityStatus};
use crate::storage::traits::CommissionRuleStorage;

const HEADER: [&str; 11] = [
    "id",
    "category",
    "fixed_amount",
    "percentage_rate",
    "min_billing_threshold",
    "max_billing_threshold",
    "status",
    "effective_from",
    "effective_to",
    "created_at",
    "updated_at",
];

#[derive(Clone)]
pub struct CommissionRuleRepository {
    connection: CsvConnection,
}

impl CommissionRuleRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_rules(&self) -> Result<Vec<CommissionRule>> {
        let path = self.connection.commission_rules_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut rules = Vec::new();
        for result in reader.records() {
            let record = result?;
            let category_str = field(&record, 1, "category")?;
            let status_str = field(&record, 6, "status")?;
            rules.push(CommissionRule {
                id: field(&record, 0, "id")?.to_string(),
                category: ClientCategory::parse(category_str)
                    .ok_or_else(|| anyhow!("invalid rule category '{}'", category_str))?,
                fixed_amount: parse_decimal(field(&record, 2, "fixed_amount")?, "fixed_amount")?,
                percentage_rate: parse_opt_decimal(
                    field(&record, 3, "percentage_rate")?,
                    "percentage_rate",
                )?,
                min_billing_threshold: parse_opt_decimal(
                    field(&record, 4, "min_billing_threshold")?,
                    "min_billing_threshold",
                )?,
                max_billing_threshold: parse_opt_decimal(
                    field(&record, 5, "max_billing_threshold")?,
                    "max_billing_threshold",
                )?,
                status: EntityStatus::parse(status_str)
                    .ok_or_else(|| anyhow!("invalid rule status '{}'", status_str))?,
                effective_from: parse_date(
                    field(&record, 7, "effective_from")?,
                    "effective_from",
                )?,
                effective_to: parse_opt_date(field(&record, 8, "effective_to")?, "effective_to")?,
                created_at: parse_timestamp(field(&record, 9, "created_at")?, "created_at")?,
                updated_at: parse_timestamp(field(&record, 10, "updated_at")?, "updated_at")?,
            });
        }

        Ok(rules)
    }

    fn write_rules(&self, rules: &[CommissionRule]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.connection.commission_rules_path())?;
        let mut writer = Writer::from_writer(BufWriter::new(file));

        writer.write_record(HEADER)?;
        for rule in rules {
            writer.write_record([
                rule.id.as_str(),
                rule.category.as_str(),
                rule.fixed_amount.to_string().as_str(),
                format_opt_decimal(rule.percentage_rate).as_str(),
                format_opt_decimal(rule.min_billing_threshold).as_str(),
                format_opt_decimal(rule.max_billing_threshold).as_str(),
                rule.status.as_str(),
                rule.effective_from.to_string().as_str(),
                format_opt_date(rule.effective_to).as_str(),
                rule.created_at.to_rfc3339().as_str(),
                rule.updated_at.to_rfc3339().as_str(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl CommissionRuleStorage for CommissionRuleRepository {
    fn store_rule(&self, rule: &CommissionRule) -> Result<()> {
        let mut rules = self.read_rules()?;
        rules.retain(|r| r.id != rule.id);
        rules.push(rule.clone());
        self.write_rules(&rules)
    }

    fn list_rules(&self) -> Result<Vec<CommissionRule>> {
        self.read_rules()
    }

    fn find_active_rules_for_category_on(
        &self,
        category: ClientCategory,
        date: NaiveDate,
    ) -> Result<Vec<CommissionRule>> {
        Ok(self
            .read_rules()?
            .into_iter()
            .filter(|rule| {
                rule.category == category
                    && rule.status == EntityStatus::Active
                    && rule.covers(date)
            })
            .collect())
    }

    fn has_overlapping_rule(
        &self,
        category: ClientCategory,
        effective_from: NaiveDate,
        effective_to: Option<NaiveDate>,
    ) -> Result<bool> {
        Ok(self.read_rules()?.iter().any(|rule| {
            rule.category == category
                && rule.status == EntityStatus::Active
                && rule.overlaps(effective_from, effective_to)
        }))
    }
}
