// store/mod.rs - Document store boundary
//
// Handlers and services only ever see these traits. PgStore backs them with
// Postgres, MemoryStore keeps everything in process for tests and
// STORE_BACKEND=memory runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{AuditLogEntry, ProfileUpdate, SensorMaxTemperature, User, WeatherReading};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseError, DatabaseManager};
use crate::filter::Filter;
use crate::types::Role;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate value: {0}")]
    Conflict(String),

    #[error("Stored document could not be decoded: {0}")]
    Decode(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find(&self, filter: &Filter) -> Result<Vec<Value>, StoreError>;
    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;
    /// The write paths below touch only their own columns; false or `None`
    /// when the user does not exist
    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;
    async fn set_password(&self, id: Uuid, hash: &str, changed_at: DateTime<Utc>) -> Result<bool, StoreError>;
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn update_role_where(&self, filter: &Filter, role: Role) -> Result<u64, StoreError>;
    async fn delete_where(&self, filter: &Filter) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait WeatherStore: Send + Sync {
    async fn insert(&self, reading: &WeatherReading) -> Result<(), StoreError>;
    async fn insert_many(&self, readings: &[WeatherReading]) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WeatherReading>, StoreError>;
    async fn find(&self, filter: &Filter) -> Result<Vec<Value>, StoreError>;
    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;
    async fn replace(&self, reading: &WeatherReading) -> Result<bool, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn delete_all(&self) -> Result<u64, StoreError>;
    /// Hottest reading per device with `start <= time <= end`, earliest
    /// reading winning ties, ordered by device name
    async fn max_temperature_by_device(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorMaxTemperature>, StoreError>;
}

#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), StoreError>;
    async fn entries_for(&self, document_id: Uuid) -> Result<Vec<AuditLogEntry>, StoreError>;
    async fn list(&self) -> Result<Vec<AuditLogEntry>, StoreError>;
}

/// The three collections, behind one backend
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub weather: Arc<dyn WeatherStore>,
    pub logs: Arc<dyn AuditLogStore>,
    pool: Option<PgPool>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            users: store.clone(),
            weather: store.clone(),
            logs: store,
            pool: None,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            users: store.clone(),
            weather: store.clone(),
            logs: store,
            pool: Some(pool),
        }
    }

    /// Backend named by the configuration; Postgres is connected and migrated
    pub async fn open(config: &AppConfig) -> Result<Self, DatabaseError> {
        match config.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; nothing will persist");
                Ok(Self::memory())
            }
            StoreBackend::Postgres => {
                let manager = DatabaseManager::connect(config).await?;
                manager.migrate().await?;
                Ok(Self::postgres(manager.pool().clone()))
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.pool.is_some()
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        match &self.pool {
            Some(pool) => Ok(DatabaseManager::health_check(pool).await?),
            None => Ok(()),
        }
    }
}
