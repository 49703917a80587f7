use std::sync::Arc;
use tracing::info;

use crate::database::models::{AuditKind, AuditLogEntry, WeatherReading};
use crate::store::{AuditLogStore, StoreError};

/// Writes the `logs` collection. Callers await it before touching the reading.
#[derive(Clone)]
pub struct AuditLogWriter {
    logs: Arc<dyn AuditLogStore>,
}

impl AuditLogWriter {
    pub fn new(logs: Arc<dyn AuditLogStore>) -> Self {
        Self { logs }
    }

    pub async fn record_deletion(&self, reading: &WeatherReading) -> Result<AuditLogEntry, StoreError> {
        self.record(reading, AuditKind::Deletion).await
    }

    pub async fn record_rejected(&self, reading: &WeatherReading) -> Result<AuditLogEntry, StoreError> {
        self.record(reading, AuditKind::InvalidDataDeletion).await
    }

    async fn record(&self, reading: &WeatherReading, kind: AuditKind) -> Result<AuditLogEntry, StoreError> {
        let entry = AuditLogEntry::new(reading.id, reading.to_document(), kind);
        self.logs.append(&entry).await?;
        info!(
            "Audit log: {} of reading {} from {}",
            kind.as_str(),
            reading.id,
            reading.device_name
        );
        Ok(entry)
    }
}
