//! Append-only audit recording.
//!
//! A failed audit write is logged and swallowed: the business transaction
//! that triggered it must not roll back because the log could not be
//! written.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::errors::EngineError;
use crate::domain::models::{AuditAction, AuditEntry};
use crate::storage::{AuditStorage, Connection};

#[derive(Clone)]
pub struct AuditService<C: Connection> {
    audit_repository: C::AuditRepository,
}

impl<C: Connection> AuditService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            audit_repository: connection.create_audit_repository(),
        }
    }

    /// Record one action against an entity.
    ///
    /// Snapshot serialization failures degrade to missing snapshots; storage
    /// failures are logged. Neither surfaces to the caller.
    pub fn record<B: Serialize, A: Serialize>(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: AuditAction,
        actor: &str,
        justification: Option<&str>,
        before: Option<&B>,
        after: Option<&A>,
    ) {
        let before_snapshot = before.and_then(|value| serialize_snapshot(value, "before"));
        let after_snapshot = after.and_then(|value| serialize_snapshot(value, "after"));

        let entry = AuditEntry::new(
            entity_type,
            entity_id,
            action,
            actor,
            justification.map(str::to_string),
            before_snapshot,
            after_snapshot,
        );

        match self.audit_repository.append_entry(&entry) {
            Ok(()) => info!(
                "Audit entry recorded: {} {} {} by {}",
                action.as_str(),
                entity_type,
                entity_id,
                actor
            ),
            Err(e) => error!(
                "Failed to write audit entry for {} {} ({}): {:#}",
                entity_type,
                entity_id,
                action.as_str(),
                e
            ),
        }
    }

    /// Record a closing reopen with its justification.
    pub fn record_reopen<B: Serialize, A: Serialize>(
        &self,
        entity_type: &str,
        entity_id: &str,
        actor: &str,
        justification: &str,
        before: Option<&B>,
        after: Option<&A>,
    ) {
        self.record(
            entity_type,
            entity_id,
            AuditAction::Reopen,
            actor,
            Some(justification),
            before,
            after,
        );
    }

    /// All entries recorded for one entity, oldest first.
    pub fn entries_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEntry>, EngineError> {
        Ok(self
            .audit_repository
            .list_entries_for_entity(entity_type, entity_id)?)
    }

    /// All reopen events, oldest first.
    pub fn reopen_entries(&self) -> Result<Vec<AuditEntry>, EngineError> {
        let entries = self.audit_repository.list_entries()?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.action == AuditAction::Reopen)
            .collect())
    }
}

fn serialize_snapshot<T: Serialize>(value: &T, which: &str) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("Failed to serialize {} snapshot for audit entry: {}", which, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::CsvConnection;
    use tempfile::tempdir;

    fn setup_test() -> (AuditService<CsvConnection>, Arc<CsvConnection>, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let conn = Arc::new(CsvConnection::new(temp_dir.path().to_path_buf()).unwrap());
        (AuditService::new(conn.clone()), conn, temp_dir)
    }

    #[derive(Serialize)]
    struct Snapshot {
        status: &'static str,
    }

    #[test]
    fn test_record_reopen_appends_entry_with_snapshots() {
        let (service, _conn, _dir) = setup_test();

        service.record_reopen(
            "MonthlyClosing",
            "closing-1",
            "ana",
            "wrong commission rule applied",
            Some(&Snapshot { status: "COMPLETED" }),
            Some(&Snapshot { status: "REOPENED" }),
        );

        let entries = service
            .entries_for_entity("MonthlyClosing", "closing-1")
            .expect("Failed to list entries");
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.action, AuditAction::Reopen);
        assert_eq!(entry.actor, "ana");
        assert_eq!(
            entry.justification.as_deref(),
            Some("wrong commission rule applied")
        );
        assert_eq!(
            entry.before_snapshot.as_deref(),
            Some(r#"{"status":"COMPLETED"}"#)
        );
        assert_eq!(
            entry.after_snapshot.as_deref(),
            Some(r#"{"status":"REOPENED"}"#)
        );
    }

    #[test]
    fn test_reopen_entries_filters_by_action() {
        let (service, _conn, _dir) = setup_test();

        service.record::<Snapshot, Snapshot>(
            "MonthlyClosing",
            "closing-1",
            AuditAction::Create,
            "system",
            None,
            None,
            None,
        );
        service.record_reopen::<Snapshot, Snapshot>(
            "MonthlyClosing",
            "closing-1",
            "ana",
            "recount needed",
            None,
            None,
        );

        let reopens = service.reopen_entries().expect("Failed to list reopens");
        assert_eq!(reopens.len(), 1);
        assert_eq!(reopens[0].action, AuditAction::Reopen);
    }

    #[test]
    fn test_record_swallows_storage_failure() {
        let temp_dir = tempdir().unwrap();
        let conn = Arc::new(CsvConnection::new(temp_dir.path().to_path_buf()).unwrap());
        let service = AuditService::new(conn.clone());

        // Make the audit file path unwritable by occupying it with a directory
        std::fs::create_dir_all(conn.audit_log_path()).unwrap();

        // Must not panic or propagate the failure
        service.record_reopen::<Snapshot, Snapshot>(
            "MonthlyClosing",
            "closing-1",
            "ana",
            "justification",
            None,
            None,
        );
    }
}
