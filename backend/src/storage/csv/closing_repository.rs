//! CSV-based monthly closing repository.
//!
//! Closings live in one file; each month's detail rows live in their own
//! file under `closing_details/`. Replacing a month's computation rewrites
//! the detail file first and the closing row second, so a completed status
//! is never visible ahead of its details.

use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use super::fields::{
    field, format_opt_date, format_opt_decimal, opt_string, parse_decimal, parse_opt_date,
    parse_opt_decimal, parse_timestamp, parse_u32,
};
use crate::domain::models::{
    ClientCategory, ClosingDetail, ClosingStatus, EntityStatus, MonthlyClosing, ReferenceMonth,
};
use crate::storage::traits::ClosingStorage;

const CLOSING_HEADER: [&str; 13] = [
    "id",
    "reference_month",
    "status",
    "total_partners",
    "total_clients",
    "total_commission",
    "total_bonus",
    "total_payout",
    "justification",
    "closed_by",
    "reopened_by",
    "created_at",
    "updated_at",
];

const DETAIL_HEADER: [&str; 16] = [
    "id",
    "closing_id",
    "partner_id",
    "client_id",
    "client_name",
    "category",
    "client_status",
    "client_active_from",
    "client_inactive_from",
    "monthly_revenue",
    "commission_rate",
    "commission_value",
    "bonus_value",
    "total_value",
    "observations",
    "created_at",
];

#[derive(Clone)]
pub struct ClosingRepository {
    connection: CsvConnection,
}

impl ClosingRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_closings(&self) -> Result<Vec<MonthlyClosing>> {
        let path = self.connection.closings_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut closings = Vec::new();
        for result in reader.records() {
            let record = result?;
            let month_str = field(&record, 1, "reference_month")?;
            let status_str = field(&record, 2, "status")?;
            closings.push(MonthlyClosing {
                id: field(&record, 0, "id")?.to_string(),
                reference_month: month_str
                    .parse()
                    .map_err(|_| anyhow!("invalid reference month '{}'", month_str))?,
                status: ClosingStatus::parse(status_str)
                    .ok_or_else(|| anyhow!("invalid closing status '{}'", status_str))?,
                total_partners: parse_u32(field(&record, 3, "total_partners")?, "total_partners")?,
                total_clients: parse_u32(field(&record, 4, "total_clients")?, "total_clients")?,
                total_commission: parse_decimal(
                    field(&record, 5, "total_commission")?,
                    "total_commission",
                )?,
                total_bonus: parse_decimal(field(&record, 6, "total_bonus")?, "total_bonus")?,
                total_payout: parse_decimal(field(&record, 7, "total_payout")?, "total_payout")?,
                justification: opt_string(field(&record, 8, "justification")?),
                closed_by: opt_string(field(&record, 9, "closed_by")?),
                reopened_by: opt_string(field(&record, 10, "reopened_by")?),
                created_at: parse_timestamp(field(&record, 11, "created_at")?, "created_at")?,
                updated_at: parse_timestamp(field(&record, 12, "updated_at")?, "updated_at")?,
            });
        }

        Ok(closings)
    }

    fn write_closings(&self, closings: &[MonthlyClosing]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.connection.closings_path())?;
        let mut writer = Writer::from_writer(BufWriter::new(file));

        writer.write_record(CLOSING_HEADER)?;
        for closing in closings {
            writer.write_record([
                closing.id.as_str(),
                closing.reference_month.to_string().as_str(),
                closing.status.as_str(),
                closing.total_partners.to_string().as_str(),
                closing.total_clients.to_string().as_str(),
                closing.total_commission.to_string().as_str(),
                closing.total_bonus.to_string().as_str(),
                closing.total_payout.to_string().as_str(),
                closing.justification.as_deref().unwrap_or(""),
                closing.closed_by.as_deref().unwrap_or(""),
                closing.reopened_by.as_deref().unwrap_or(""),
                closing.created_at.to_rfc3339().as_str(),
                closing.updated_at.to_rfc3339().as_str(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }

    fn write_details(&self, month: ReferenceMonth, details: &[ClosingDetail]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.connection.closing_details_path(month))?;
        let mut writer = Writer::from_writer(BufWriter::new(file));

        writer.write_record(DETAIL_HEADER)?;
        for detail in details {
            writer.write_record([
                detail.id.as_str(),
                detail.closing_id.as_str(),
                detail.partner_id.as_str(),
                detail.client_id.as_str(),
                detail.client_name.as_str(),
                detail.category.as_str(),
                detail.client_status.as_str(),
                format_opt_date(detail.client_active_from).as_str(),
                format_opt_date(detail.client_inactive_from).as_str(),
                detail.monthly_revenue.to_string().as_str(),
                format_opt_decimal(detail.commission_rate).as_str(),
                detail.commission_value.to_string().as_str(),
                detail.bonus_value.to_string().as_str(),
                detail.total_value.to_string().as_str(),
                detail.observations.as_str(),
                detail.created_at.to_rfc3339().as_str(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }

    fn upsert_closing(&self, closing: &MonthlyClosing) -> Result<()> {
        let mut closings = self.read_closings()?;
        closings.retain(|c| c.reference_month != closing.reference_month);
        closings.push(closing.clone());
        closings.sort_by_key(|c| c.reference_month);
        self.write_closings(&closings)
    }
}

impl ClosingStorage for ClosingRepository {
    fn get_closing(&self, month: ReferenceMonth) -> Result<Option<MonthlyClosing>> {
        Ok(self
            .read_closings()?
            .into_iter()
            .find(|c| c.reference_month == month))
    }

    fn list_closings(&self) -> Result<Vec<MonthlyClosing>> {
        self.read_closings()
    }

    fn save_closing(&self, closing: &MonthlyClosing) -> Result<()> {
        self.upsert_closing(closing)
    }

    fn replace_closing(&self, closing: &MonthlyClosing, details: &[ClosingDetail]) -> Result<()> {
        // details first: a reader must never see a completed closing whose
        // detail set is stale or missing
        self.write_details(closing.reference_month, details)?;
        self.upsert_closing(closing)
    }

    fn list_details(&self, month: ReferenceMonth) -> Result<Vec<ClosingDetail>> {
        let path = self.connection.closing_details_path(month);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut details = Vec::new();
        for result in reader.records() {
            let record = result?;
            let category_str = field(&record, 5, "category")?;
            let status_str = field(&record, 6, "client_status")?;
            details.push(ClosingDetail {
                id: field(&record, 0, "id")?.to_string(),
                closing_id: field(&record, 1, "closing_id")?.to_string(),
                partner_id: field(&record, 2, "partner_id")?.to_string(),
                client_id: field(&record, 3, "client_id")?.to_string(),
                client_name: field(&record, 4, "client_name")?.to_string(),
                category: ClientCategory::parse(category_str)
                    .ok_or_else(|| anyhow!("invalid detail category '{}'", category_str))?,
                client_status: EntityStatus::parse(status_str)
                    .ok_or_else(|| anyhow!("invalid detail client status '{}'", status_str))?,
                client_active_from: parse_opt_date(
                    field(&record, 7, "client_active_from")?,
                    "client_active_from",
                )?,
                client_inactive_from: parse_opt_date(
                    field(&record, 8, "client_inactive_from")?,
                    "client_inactive_from",
                )?,
                monthly_revenue: parse_decimal(
                    field(&record, 9, "monthly_revenue")?,
                    "monthly_revenue",
                )?,
                commission_rate: parse_opt_decimal(
                    field(&record, 10, "commission_rate")?,
                    "commission_rate",
                )?,
                commission_value: parse_decimal(
                    field(&record, 11, "commission_value")?,
                    "commission_value",
                )?,
                bonus_value: parse_decimal(field(&record, 12, "bonus_value")?, "bonus_value")?,
                total_value: parse_decimal(field(&record, 13, "total_value")?, "total_value")?,
                observations: field(&record, 14, "observations")?.to_string(),
                created_at: parse_timestamp(field(&record, 15, "created_at")?, "created_at")?,
            });
        }

        Ok(details)
    }
}
