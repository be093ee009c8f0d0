//! CSV-based client repository.

use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use super::fields::{
    field, format_opt_date, opt_string, parse_decimal, parse_opt_date, parse_timestamp,
};
use crate::domain::models::{Client, ClientCategory, EntityStatus};
use crate::storage::traits::ClientStorage;

const HEADER: [&str; 12] = [
    "id",
    "name",
    "document",
    "email",
    "phone",
    "category",
    "monthly_billing",
    "status",
    "status_effective_from",
    "partner_id",
    "created_at",
    "updated_at",
];

#[derive(Clone)]
pub struct ClientRepository {
    connection: CsvConnection,
}

impl ClientRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_clients(&self) -> Result<Vec<Client>> {
        let path = self.connection.clients_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut clients = Vec::new();
        for result in reader.records() {
            let record = result?;
            let category_str = field(&record, 5, "category")?;
            let status_str = field(&record, 7, "status")?;
            clients.push(Client {
                id: field(&record, 0, "id")?.to_string(),
                name: field(&record, 1, "name")?.to_string(),
                document: field(&record, 2, "document")?.to_string(),
                email: field(&record, 3, "email")?.to_string(),
                phone: opt_string(field(&record, 4, "phone")?),
                category: ClientCategory::parse(category_str)
                    .ok_or_else(|| anyhow!("invalid client category '{}'", category_str))?,
                monthly_billing: parse_decimal(
                    field(&record, 6, "monthly_billing")?,
                    "monthly_billing",
                )?,
                status: EntityStatus::parse(status_str)
                    .ok_or_else(|| anyhow!("invalid client status '{}'", status_str))?,
                status_effective_from: parse_opt_date(
                    field(&record, 8, "status_effective_from")?,
                    "status_effective_from",
                )?,
                partner_id: field(&record, 9, "partner_id")?.to_string(),
                created_at: parse_timestamp(field(&record, 10, "created_at")?, "created_at")?,
                updated_at: parse_timestamp(field(&record, 11, "updated_at")?, "updated_at")?,
            });
        }

        Ok(clients)
    }

    fn write_clients(&self, clients: &[Client]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.connection.clients_path())?;
        let mut writer = Writer::from_writer(BufWriter::new(file));

        writer.write_record(HEADER)?;
        for client in clients {
            writer.write_record([
                client.id.as_str(),
                client.name.as_str(),
                client.document.as_str(),
                client.email.as_str(),
                client.phone.as_deref().unwrap_or(""),
                client.category.as_str(),
                client.monthly_billing.to_string().as_str(),
                client.status.as_str(),
                format_opt_date(client.status_effective_from).as_str(),
                client.partner_id.as_str(),
                client.created_at.to_rfc3339().as_str(),
                client.updated_at.to_rfc3339().as_str(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl ClientStorage for ClientRepository {
    fn store_client(&self, client: &Client) -> Result<()> {
        let mut clients = self.read_clients()?;
        clients.retain(|c| c.id != client.id);
        clients.push(client.clone());
        clients.sort_by(|a, b| a.id.cmp(&b.id));
        self.write_clients(&clients)
    }

    fn get_client(&self, client_id: &str) -> Result<Option<Client>> {
        Ok(self
            .read_clients()?
            .into_iter()
            .find(|c| c.id == client_id))
    }

    fn list_clients(&self) -> Result<Vec<Client>> {
        self.read_clients()
    }

    fn list_clients_by_partner(&self, partner_id: &str) -> Result<Vec<Client>> {
        Ok(self
            .read_clients()?
            .into_iter()
            .filter(|c| c.partner_id == partner_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn test_client(id: &str, partner_id: &str) -> Client {
        let now = Utc::now();
        Client {
            id: id.to_string(),
            name: format!("Client {}", id),
            document: format!("doc-{}", id),
            email: format!("{}@clients.example", id),
            phone: Some("+55 11 99999-0000".to_string()),
            category: ClientCategory::Tier2,
            monthly_billing: dec!(12345.67),
            status: EntityStatus::Inactive,
            status_effective_from: NaiveDate::from_ymd_opt(2025, 3, 15),
            partner_id: partner_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_store_and_read_back_preserves_fields() {
        let dir = tempdir().unwrap();
        let repo = ClientRepository::new(CsvConnection::new(dir.path()).unwrap());

        let client = test_client("c1", "P-001");
        repo.store_client(&client).expect("Failed to store client");

        let loaded = repo
            .get_client("c1")
            .expect("Failed to get client")
            .expect("client missing");
        assert_eq!(loaded.monthly_billing, dec!(12345.67));
        assert_eq!(loaded.category, ClientCategory::Tier2);
        assert_eq!(loaded.status, EntityStatus::Inactive);
        assert_eq!(
            loaded.status_effective_from,
            NaiveDate::from_ymd_opt(2025, 3, 15)
        );
        assert_eq!(loaded.phone.as_deref(), Some("+55 11 99999-0000"));
    }

    #[test]
    fn test_store_replaces_existing_row() {
        let dir = tempdir().unwrap();
        let repo = ClientRepository::new(CsvConnection::new(dir.path()).unwrap());

        let mut client = test_client("c1", "P-001");
        repo.store_client(&client).unwrap();
        client.monthly_billing = dec!(999);
        repo.store_client(&client).unwrap();

        let clients = repo.list_clients().unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].monthly_billing, dec!(999));
    }

    #[test]
    fn test_list_by_partner_filters() {
        let dir = tempdir().unwrap();
        let repo = ClientRepository::new(CsvConnection::new(dir.path()).unwrap());

        repo.store_client(&test_client("c1", "P-001")).unwrap();
        repo.store_client(&test_client("c2", "P-001")).unwrap();
        repo.store_client(&test_client("c3", "P-002")).unwrap();

        assert_eq!(repo.list_clients_by_partner("P-001").unwrap().len(), 2);
        assert_eq!(repo.list_clients_by_partner("P-002").unwrap().len(), 1);
        assert!(repo.list_clients_by_partner("P-404").unwrap().is_empty());
    }
}
