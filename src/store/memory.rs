use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{AuditLogEntry, ProfileUpdate, SensorMaxTemperature, User, WeatherReading};
use crate::filter::Filter;
use crate::types::Role;

use super::{AuditLogStore, StoreError, UserStore, WeatherStore};

/// In-process backend; insertion order is preserved per collection
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    weather: RwLock<Vec<WeatherReading>>,
    logs: RwLock<Vec<AuditLogEntry>>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let users = self.users.read().await;
        Ok(filter.execute(users.iter().map(User::to_document)))
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let docs: Vec<Value> = self.users.read().await.iter().map(User::to_document).collect();
        Ok(filter.count_matching(docs.iter()))
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.last_logged_in = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_password(&self, id: Uuid, hash: &str, changed_at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = hash.to_string();
                user.password_changed_at = Some(changed_at);
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if let Some(email) = &update.email {
            if users.iter().any(|u| u.id != id && u.email.eq_ignore_ascii_case(email)) {
                return Err(StoreError::Conflict(format!("email {}", email)));
            }
        }

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    async fn update_role_where(&self, filter: &Filter, role: Role) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let now = Utc::now();
        let mut modified = 0;
        for user in users.iter_mut().filter(|u| filter.matches(&u.to_document())) {
            user.role = role;
            user.updated_at = now;
            modified += 1;
        }
        Ok(modified)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| !filter.matches(&u.to_document()));
        Ok((before - users.len()) as u64)
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn insert(&self, reading: &WeatherReading) -> Result<(), StoreError> {
        self.weather.write().await.push(reading.clone());
        Ok(())
    }

    async fn insert_many(&self, readings: &[WeatherReading]) -> Result<(), StoreError> {
        self.weather.write().await.extend_from_slice(readings);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WeatherReading>, StoreError> {
        Ok(self.weather.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let readings = self.weather.read().await;
        Ok(filter.execute(readings.iter().map(WeatherReading::to_document)))
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let docs: Vec<Value> = self
            .weather
            .read()
            .await
            .iter()
            .map(WeatherReading::to_document)
            .collect();
        Ok(filter.count_matching(docs.iter()))
    }

    async fn replace(&self, reading: &WeatherReading) -> Result<bool, StoreError> {
        let mut readings = self.weather.write().await;
        match readings.iter_mut().find(|r| r.id == reading.id) {
            Some(stored) => {
                *stored = reading.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut readings = self.weather.write().await;
        let before = readings.len();
        readings.retain(|r| r.id != id);
        Ok(readings.len() < before)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut readings = self.weather.write().await;
        let removed = readings.len() as u64;
        readings.clear();
        Ok(removed)
    }

    async fn max_temperature_by_device(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorMaxTemperature>, StoreError> {
        let readings = self.weather.read().await;
        let mut best: BTreeMap<&str, &WeatherReading> = BTreeMap::new();

        for reading in readings.iter().filter(|r| r.time >= start && r.time <= end) {
            best.entry(reading.device_name.as_str())
                .and_modify(|current| {
                    let hotter = reading.temperature > current.temperature;
                    let earlier_tie = reading.temperature == current.temperature && reading.time < current.time;
                    if hotter || earlier_tie {
                        *current = reading;
                    }
                })
                .or_insert(reading);
        }

        Ok(best
            .into_iter()
            .map(|(name, r)| SensorMaxTemperature {
                sensor_name: name.to_string(),
                time: r.time,
                temperature: r.temperature,
            })
            .collect())
    }
}

#[async_trait]
impl AuditLogStore for MemoryStore {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        self.logs.write().await.push(entry.clone());
        Ok(())
    }

    async fn entries_for(&self, document_id: Uuid) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self.logs.read().await.clone())
    }
}
