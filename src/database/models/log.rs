use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditKind {
    Deletion,
    InvalidDataDeletion,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Deletion => "deletion",
            AuditKind::InvalidDataDeletion => "invalid-data-deletion",
        }
    }
}

impl TryFrom<String> for AuditKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "deletion" => Ok(AuditKind::Deletion),
            "invalid-data-deletion" => Ok(AuditKind::InvalidDataDeletion),
            other => Err(format!("unknown audit entry type '{}'", other)),
        }
    }
}

/// Immutable record of a deleted or rejected weather reading
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub document_id: Uuid,
    pub document: Value,
    pub deleted_at: DateTime<Utc>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub kind: AuditKind,
}

impl AuditLogEntry {
    pub fn new(document_id: Uuid, document: Value, kind: AuditKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            document,
            deleted_at: Utc::now(),
            kind,
        }
    }
}
