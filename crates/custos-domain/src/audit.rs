//! Audit trail entries
//!
//! Every mutation that passes through an audited store appends one entry in
//! the same transaction as the mutation itself.

use crate::AuditId;

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Entity inserted
    Create,

    /// Entity changed
    Update,

    /// Entity removed
    Delete,
}

impl AuditAction {
    /// Get the action name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }

    /// Parse an action from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(AuditAction::Create),
            "update" => Some(AuditAction::Update),
            "delete" => Some(AuditAction::Delete),
            _ => None,
        }
    }
}

/// One audit log row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Unique identifier
    pub id: AuditId,

    /// Who performed the mutation (`system` for pipeline writes)
    pub actor: String,

    /// Mutation kind
    pub action: AuditAction,

    /// Entity type name (e.g. `IngestionJob`)
    pub entity_type: String,

    /// Entity identifier
    pub entity_id: String,

    /// When the entry was written
    pub created_at: u64,
}

impl AuditEntry {
    /// Actor recorded for pipeline writes
    pub const SYSTEM_ACTOR: &'static str = "system";

    /// Build a system-actor entry
    pub fn system(action: AuditAction, entity_type: &str, entity_id: &str, created_at: u64) -> Self {
        Self {
            id: AuditId::new(),
            actor: Self::SYSTEM_ACTOR.to_string(),
            action,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            created_at,
        }
    }
}
