// services/weather_service.rs - Reading ingestion, queries and aggregations
//
// Every write passes through the sanity gate: a reading outside the plausible
// bounds is written to the audit log and never reaches the weather collection.

use chrono::{DateTime, Duration, Months, NaiveTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::FilterConfig;
use crate::database::models::{SensorMaxTemperature, WeatherInput, WeatherReading};
use crate::database::schema::WEATHER;
use crate::database::validation::{self, ValidationErrors, WEATHER_RULES};
use crate::filter::{Filter, FilterError, FilterOp, FilterValue, Projection, QueryFeatures, SortDirection};
use crate::store::{StoreError, WeatherStore};

use super::audit::AuditLogWriter;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Invalid weather readings, document will not be saved.")]
    Rejected,

    #[error("{0}")]
    NotFound(String),

    #[error("This page does not exist")]
    PageNotFound,

    #[error("No precipitation value provided for update")]
    MissingPrecipitation,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// One page of a listing
#[derive(Debug)]
pub struct WeatherPage {
    pub documents: Vec<Value>,
}

#[derive(Clone)]
pub struct WeatherService {
    store: Arc<dyn WeatherStore>,
    audit: AuditLogWriter,
    filter_config: FilterConfig,
}

impl WeatherService {
    pub fn new(store: Arc<dyn WeatherStore>, audit: AuditLogWriter, filter_config: FilterConfig) -> Self {
        Self { store, audit, filter_config }
    }

    pub async fn create(&self, input: WeatherInput) -> Result<WeatherReading, WeatherError> {
        let reading = input.into_reading(Uuid::new_v4(), Utc::now(), 0)?;
        self.admit(&reading).await?;
        self.store.insert(&reading).await?;
        info!("Stored reading {} from {}", reading.id, reading.device_name);
        Ok(reading)
    }

    /// All or nothing: one implausible reading rejects the batch
    pub async fn create_many(&self, inputs: Vec<WeatherInput>) -> Result<Vec<WeatherReading>, WeatherError> {
        let now = Utc::now();
        let readings = inputs
            .into_iter()
            .map(|input| input.into_reading(Uuid::new_v4(), now, 0))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rejected = 0usize;
        for reading in readings.iter().filter(|r| !r.is_sane()) {
            self.audit.record_rejected(reading).await?;
            rejected += 1;
        }
        if rejected > 0 {
            warn!("Rejected batch of {} readings, {} implausible", readings.len(), rejected);
            return Err(WeatherError::Rejected);
        }

        self.store.insert_many(&readings).await?;
        info!("Stored batch of {} readings", readings.len());
        Ok(readings)
    }

    pub async fn list(&self, params: &[(String, String)]) -> Result<WeatherPage, WeatherError> {
        let filter = QueryFeatures::apply(&WEATHER, params, &self.filter_config)?;

        if filter.page_requested() {
            let total = self.store.count(&filter).await?;
            if filter.page_out_of_range(total) {
                return Err(WeatherError::PageNotFound);
            }
        }

        let documents = self.store.find(&filter).await?;
        Ok(WeatherPage { documents })
    }

    pub async fn get(&self, id: Uuid) -> Result<WeatherReading, WeatherError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| WeatherError::NotFound("No weather found with that ID".to_string()))
    }

    /// Full replacement; creation time is kept and the version bumps
    pub async fn replace(&self, id: Uuid, input: WeatherInput) -> Result<WeatherReading, WeatherError> {
        let existing = self.get(id).await?;
        let reading = input.into_reading(id, existing.created_at, existing.version + 1)?;
        self.admit(&reading).await?;

        if !self.store.replace(&reading).await? {
            return Err(WeatherError::NotFound("No weather found with that ID".to_string()));
        }
        Ok(reading)
    }

    pub async fn update_precipitation(&self, id: Uuid, precipitation: Option<f64>) -> Result<WeatherReading, WeatherError> {
        let precipitation = precipitation.ok_or(WeatherError::MissingPrecipitation)?;

        let mut reading = self.get(id).await?;
        reading.precipitation = Some(precipitation);
        reading.version += 1;
        validation::validate(WEATHER_RULES, &reading.to_document())?;
        self.admit(&reading).await?;

        if !self.store.replace(&reading).await? {
            return Err(WeatherError::NotFound("No weather found with that ID".to_string()));
        }
        Ok(reading)
    }

    /// The snapshot is logged before the row goes away
    pub async fn delete(&self, id: Uuid) -> Result<(), WeatherError> {
        let reading = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| WeatherError::NotFound("No document found with that ID".to_string()))?;

        self.audit.record_deletion(&reading).await?;
        self.store.delete(id).await?;
        info!("Deleted reading {}", id);
        Ok(())
    }

    pub async fn max_precipitation(&self, sensor: &str, now: DateTime<Utc>) -> Result<Value, WeatherError> {
        let filter = Filter::new(&WEATHER)
            .where_eq("deviceName", FilterValue::Text(sensor.to_string()))
            .where_op("time", FilterOp::Gte, FilterValue::Timestamp(five_months_before(now)))
            .where_op("time", FilterOp::Lte, FilterValue::Timestamp(now))
            .order_by("precipitation", SortDirection::Desc)
            .select(Projection::Include {
                fields: vec!["deviceName".into(), "time".into(), "precipitation".into()],
                id: false,
            })
            .limit(1, 0);

        self.first(&filter).await?.ok_or_else(|| {
            WeatherError::NotFound(
                "No precipitation record found for the specified sensor in the last five months".to_string(),
            )
        })
    }

    pub async fn max_temperature(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorMaxTemperature>, WeatherError> {
        let rows = self.store.max_temperature_by_device(start, end).await?;
        if rows.is_empty() {
            return Err(WeatherError::NotFound(
                "No temperature readings found for the specified date range".to_string(),
            ));
        }
        Ok(rows)
    }

    /// The reading taken during the second starting at `instant`
    pub async fn stats_at(&self, sensor: &str, instant: DateTime<Utc>) -> Result<Value, WeatherError> {
        let filter = Filter::new(&WEATHER)
            .where_eq("deviceName", FilterValue::Text(sensor.to_string()))
            .where_op("time", FilterOp::Gte, FilterValue::Timestamp(instant))
            .where_op("time", FilterOp::Lt, FilterValue::Timestamp(instant + Duration::seconds(1)))
            .select(Projection::Include {
                fields: vec![
                    "temperature".into(),
                    "atmosphericPressure".into(),
                    "solarRadiation".into(),
                    "precipitation".into(),
                ],
                id: false,
            })
            .limit(1, 0);

        self.first(&filter)
            .await?
            .ok_or_else(|| WeatherError::NotFound("No reading found for the specified date and time".to_string()))
    }

    pub async fn delete_all(&self) -> Result<u64, WeatherError> {
        Ok(self.store.delete_all().await?)
    }

    async fn first(&self, filter: &Filter) -> Result<Option<Value>, WeatherError> {
        Ok(self.store.find(filter).await?.into_iter().next())
    }

    async fn admit(&self, reading: &WeatherReading) -> Result<(), WeatherError> {
        if reading.is_sane() {
            return Ok(());
        }
        warn!(
            "Implausible reading from {} (temperature {}, humidity {}), diverted to logs",
            reading.device_name, reading.temperature, reading.humidity
        );
        self.audit.record_rejected(reading).await?;
        Err(WeatherError::Rejected)
    }
}

/// Midnight UTC five calendar months before `now`, clamped to month end
pub fn five_months_before(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let start = date.checked_sub_months(Months::new(5)).unwrap_or(date);
    start.and_time(NaiveTime::MIN).and_utc()
}
