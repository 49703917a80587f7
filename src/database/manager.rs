use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, ConfigError};

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "users" (
        "id" UUID PRIMARY KEY,
        "name" TEXT NOT NULL,
        "email" TEXT NOT NULL,
        "role" TEXT NOT NULL DEFAULT 'teacher',
        "password_hash" TEXT NOT NULL,
        "password_changed_at" TIMESTAMPTZ,
        "last_logged_in" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS "users_email_key" ON "users" (lower("email"))"#,
    r#"CREATE TABLE IF NOT EXISTS "weather" (
        "id" UUID PRIMARY KEY,
        "device_name" TEXT NOT NULL,
        "time" TIMESTAMPTZ NOT NULL,
        "temperature" DOUBLE PRECISION NOT NULL,
        "humidity" DOUBLE PRECISION NOT NULL,
        "latitude" DOUBLE PRECISION,
        "longitude" DOUBLE PRECISION NOT NULL,
        "wind_direction" DOUBLE PRECISION,
        "atmospheric_pressure" DOUBLE PRECISION,
        "solar_radiation" DOUBLE PRECISION,
        "max_wind_speed" DOUBLE PRECISION,
        "vapor_pressure" DOUBLE PRECISION,
        "precipitation" DOUBLE PRECISION,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "version" INTEGER NOT NULL DEFAULT 0
    )"#,
    r#"CREATE INDEX IF NOT EXISTS "weather_device_time_idx" ON "weather" ("device_name", "time")"#,
    r#"CREATE TABLE IF NOT EXISTS "logs" (
        "id" UUID PRIMARY KEY,
        "document_id" UUID NOT NULL,
        "document" JSONB NOT NULL,
        "deleted_at" TIMESTAMPTZ NOT NULL,
        "type" TEXT NOT NULL
    )"#,
];

/// Owns the Postgres connection pool
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn connect(config: &AppConfig) -> Result<Self, DatabaseError> {
        let connection_string = config.database_url()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!(
            "Created database pool (max {} connections)",
            config.database.max_connections
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the users, weather and logs tables when missing
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
