//! Domain model for immutable audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to the audited entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Reopen,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Reopen => "REOPEN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(AuditAction::Create),
            "UPDATE" => Some(AuditAction::Update),
            "DELETE" => Some(AuditAction::Delete),
            "REOPEN" => Some(AuditAction::Reopen),
            _ => None,
        }
    }
}

/// One append-only audit record. Never mutated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: AuditAction,
    pub actor: String,
    pub justification: Option<String>,
    /// JSON snapshot of the entity before the action, when serializable
    pub before_snapshot: Option<String>,
    /// JSON snapshot of the entity after the action, when serializable
    pub after_snapshot: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        entity_type: &str,
        entity_id: &str,
        action: AuditAction,
        actor: &str,
        justification: Option<String>,
        before_snapshot: Option<String>,
        after_snapshot: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            action,
            actor: actor.to_string(),
            justification,
            before_snapshot,
            after_snapshot,
            created_at: Utc::now(),
        }
    }
}
