//! CSV-based append-only audit log.
//!
//! Entries are only ever appended; the file is never rewritten, so existing
//! records cannot be altered through this repository.

use anyhow::{anyhow, Result};
use csv::{Reader, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use super::fields::{field, opt_string, parse_timestamp};
use crate::domain::models::{AuditAction, AuditEntry};
use crate::storage::traits::AuditStorage;

const HEADER: [&str; 9] = [
    "id",
    "entity_type",
    "entity_id",
    "action",
    "actor",
    "justification",
    "before_snapshot",
    "after_snapshot",
    "created_at",
];

#[derive(Clone)]
pub struct AuditRepository {
    connection: CsvConnection,
}

impl AuditRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_entries(&self) -> Result<Vec<AuditEntry>> {
        let path = self.connection.audit_log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result?;
            let action_str = field(&record, 3, "action")?;
            entries.push(AuditEntry {
                id: field(&record, 0, "id")?.to_string(),
                entity_type: field(&record, 1, "entity_type")?.to_string(),
                entity_id: field(&record, 2, "entity_id")?.to_string(),
                action: AuditAction::parse(action_str)
                    .ok_or_else(|| anyhow!("invalid audit action '{}'", action_str))?,
                actor: field(&record, 4, "actor")?.to_string(),
                justification: opt_string(field(&record, 5, "justification")?),
                before_snapshot: opt_string(field(&record, 6, "before_snapshot")?),
                after_snapshot: opt_string(field(&record, 7, "after_snapshot")?),
                created_at: parse_timestamp(field(&record, 8, "created_at")?, "created_at")?,
            });
        }

        Ok(entries)
    }
}

impl AuditStorage for AuditRepository {
    fn append_entry(&self, entry: &AuditEntry) -> Result<()> {
        let path = self.connection.audit_log_path();
        let needs_header = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        if needs_header {
            writer.write_record(HEADER)?;
        }

        writer.write_record([
            entry.id.as_str(),
            entry.entity_type.as_str(),
            entry.entity_id.as_str(),
            entry.action.as_str(),
            entry.actor.as_str(),
            entry.justification.as_deref().unwrap_or(""),
            entry.before_snapshot.as_deref().unwrap_or(""),
            entry.after_snapshot.as_deref().unwrap_or(""),
            entry.created_at.to_rfc3339().as_str(),
        ])?;
        writer.flush()?;

        Ok(())
    }

    fn list_entries(&self) -> Result<Vec<AuditEntry>> {
        self.read_entries()
    }

    fn list_entries_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEntry>> {
        Ok(self
            .read_entries()?
            .into_iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .collect())
    }
}
