//! CSV-based partner repository.

use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use super::fields::{field, opt_string, parse_timestamp};
use crate::domain::models::{EntityStatus, Partner};
use crate::storage::traits::PartnerStorage;

const HEADER: [&str; 8] = [
    "partner_id",
    "name",
    "document",
    "email",
    "phone",
    "status",
    "created_at",
    "updated_at",
];

#[derive(Clone)]
pub struct PartnerRepository {
    connection: CsvConnection,
}

impl PartnerRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_partners(&self) -> Result<Vec<Partner>> {
        let path = self.connection.partners_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut partners = Vec::new();
        for result in reader.records() {
            let record = result?;
            let status_str = field(&record, 5, "status")?;
            partners.push(Partner {
                partner_id: field(&record, 0, "partner_id")?.to_string(),
                name: field(&record, 1, "name")?.to_string(),
                document: field(&record, 2, "document")?.to_string(),
                email: field(&record, 3, "email")?.to_string(),
                phone: opt_string(field(&record, 4, "phone")?),
                status: EntityStatus::parse(status_str)
                    .ok_or_else(|| anyhow!("invalid partner status '{}'", status_str))?,
                created_at: parse_timestamp(field(&record, 6, "created_at")?, "created_at")?,
                updated_at: parse_timestamp(field(&record, 7, "updated_at")?, "updated_at")?,
            });
        }

        Ok(partners)
    }

    fn write_partners(&self, partners: &[Partner]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.connection.partners_path())?;
        let mut writer = Writer::from_writer(BufWriter::new(file));

        writer.write_record(HEADER)?;
        for partner in partners {
            writer.write_record([
                partner.partner_id.as_str(),
                partner.name.as_str(),
                partner.document.as_str(),
                partner.email.as_str(),
                partner.phone.as_deref().unwrap_or(""),
                partner.status.as_str(),
                partner.created_at.to_rfc3339().as_str(),
                partner.updated_at.to_rfc3339().as_str(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl PartnerStorage for PartnerRepository {
    fn store_partner(&self, partner: &Partner) -> Result<()> {
        let mut partners = self.read_partners()?;
        partners.retain(|p| p.partner_id != partner.partner_id);
        partners.push(partner.clone());
        partners.sort_by(|a, b| a.partner_id.cmp(&b.partner_id));
        self.write_partners(&partners)
    }

    fn get_partner(&self, partner_id: &str) -> Result<Option<Partner>> {
        Ok(self
            .read_partners()?
            .into_iter()
            .find(|p| p.partner_id == partner_id))
    }

    fn list_partners(&self) -> Result<Vec<Partner>> {
        self.read_partners()
    }
}
