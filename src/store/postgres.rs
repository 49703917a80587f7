use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{AuditLogEntry, ProfileUpdate, SensorMaxTemperature, User, WeatherReading};
use crate::database::QueryBuilder;
use crate::filter::{Filter, FilterValue};
use crate::types::Role;

use super::{AuditLogStore, StoreError, UserStore, WeatherStore};

const UNIQUE_VIOLATION: &str = "23505";

const INSERT_WEATHER: &str = r#"INSERT INTO "weather" (
    "id", "device_name", "time", "temperature", "humidity", "latitude", "longitude",
    "wind_direction", "atmospheric_pressure", "solar_radiation", "max_wind_speed",
    "vapor_pressure", "precipitation", "created_at", "version"
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"#;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn query_builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.pool)
    }
}

/// Unique index violations surface as Conflict
fn map_unique(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

fn bind_reading<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    r: &WeatherReading,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    q.bind(r.id)
        .bind(r.device_name.clone())
        .bind(r.time)
        .bind(r.temperature)
        .bind(r.humidity)
        .bind(r.latitude)
        .bind(r.longitude)
        .bind(r.wind_direction)
        .bind(r.atmospheric_pressure)
        .bind(r.solar_radiation)
        .bind(r.max_wind_speed)
        .bind(r.vapor_pressure)
        .bind(r.precipitation)
        .bind(r.created_at)
        .bind(r.version)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO "users" ("id", "name", "email", "role", "password_hash",
                "password_changed_at", "last_logged_in", "created_at", "updated_at")
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.password_changed_at)
        .bind(user.last_logged_in)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "users" WHERE "id" = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "users" WHERE lower("email") = lower($1)"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        Ok(self.query_builder().select_all(filter).await?)
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self.query_builder().count(filter).await?)
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"UPDATE "users" SET "last_logged_in" = $2 WHERE "id" = $1"#)
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_password(&self, id: Uuid, hash: &str, changed_at: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"UPDATE "users" SET "password_hash" = $2, "password_changed_at" = $3, "updated_at" = $4
               WHERE "id" = $1"#,
        )
        .bind(id)
        .bind(hash)
        .bind(changed_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"UPDATE "users" SET "name" = COALESCE($2, "name"), "email" = COALESCE($3, "email"),
                "role" = COALESCE($4, "role"), "updated_at" = $5
               WHERE "id" = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.email.as_deref())
        .bind(update.role.map(|r| r.as_str()))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"DELETE FROM "users" WHERE "id" = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_role_where(&self, filter: &Filter, role: Role) -> Result<u64, StoreError> {
        let assignments = [
            ("role", FilterValue::Text(role.as_str().to_string())),
            ("updated_at", FilterValue::Timestamp(Utc::now())),
        ];
        Ok(self.query_builder().update_where(filter, &assignments).await?)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self.query_builder().delete_where(filter).await?)
    }
}

#[async_trait]
impl WeatherStore for PgStore {
    async fn insert(&self, reading: &WeatherReading) -> Result<(), StoreError> {
        bind_reading(sqlx::query(INSERT_WEATHER), reading)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_many(&self, readings: &[WeatherReading]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for reading in readings {
            bind_reading(sqlx::query(INSERT_WEATHER), reading)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WeatherReading>, StoreError> {
        let reading = sqlx::query_as::<_, WeatherReading>(r#"SELECT * FROM "weather" WHERE "id" = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(reading)
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        Ok(self.query_builder().select_all(filter).await?)
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self.query_builder().count(filter).await?)
    }

    async fn replace(&self, reading: &WeatherReading) -> Result<bool, StoreError> {
        let result = bind_reading(
            sqlx::query(
                r#"UPDATE "weather" SET "device_name" = $2, "time" = $3, "temperature" = $4,
                    "humidity" = $5, "latitude" = $6, "longitude" = $7, "wind_direction" = $8,
                    "atmospheric_pressure" = $9, "solar_radiation" = $10, "max_wind_speed" = $11,
                    "vapor_pressure" = $12, "precipitation" = $13, "created_at" = $14, "version" = $15
                   WHERE "id" = $1"#,
            ),
            reading,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"DELETE FROM "weather" WHERE "id" = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM "weather""#).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn max_temperature_by_device(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorMaxTemperature>, StoreError> {
        let rows = sqlx::query_as::<_, SensorMaxTemperature>(
            r#"SELECT DISTINCT ON ("device_name" COLLATE "C")
                   "device_name" AS "sensor_name", "time", "temperature"
               FROM "weather"
               WHERE "time" >= $1 AND "time" <= $2
               ORDER BY "device_name" COLLATE "C", "temperature" DESC, "time" ASC"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl AuditLogStore for PgStore {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO "logs" ("id", "document_id", "document", "deleted_at", "type")
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(entry.id)
        .bind(entry.document_id)
        .bind(&entry.document)
        .bind(entry.deleted_at)
        .bind(entry.kind.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn entries_for(&self, document_id: Uuid) -> Result<Vec<AuditLogEntry>, StoreError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            r#"SELECT * FROM "logs" WHERE "document_id" = $1 ORDER BY "deleted_at""#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn list(&self) -> Result<Vec<AuditLogEntry>, StoreError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(r#"SELECT * FROM "logs" ORDER BY "deleted_at""#)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }
}
