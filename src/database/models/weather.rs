use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::validation::{self, ValidationErrors, WEATHER_RULES};
use crate::types::parse_timestamp;

/// Humidity above this never persists
pub const MAX_HUMIDITY: f64 = 100.0;
pub const MIN_TEMPERATURE: f64 = -50.0;
pub const MAX_TEMPERATURE: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub device_name: String,
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub latitude: Option<f64>,
    pub longitude: f64,
    pub wind_direction: Option<f64>,
    pub atmospheric_pressure: Option<f64>,
    pub solar_radiation: Option<f64>,
    pub max_wind_speed: Option<f64>,
    pub vapor_pressure: Option<f64>,
    pub precipitation: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "__v")]
    pub version: i32,
}

impl WeatherReading {
    /// Physically plausible: humidity <= 100 and temperature in [-50, 60]
    pub fn is_sane(&self) -> bool {
        self.humidity <= MAX_HUMIDITY
            && (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature)
    }

    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Incoming reading; every field optional so validation can report them all
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInput {
    pub device_name: Option<String>,
    pub time: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub wind_direction: Option<f64>,
    pub atmospheric_pressure: Option<f64>,
    pub solar_radiation: Option<f64>,
    pub max_wind_speed: Option<f64>,
    pub vapor_pressure: Option<f64>,
    pub precipitation: Option<f64>,
}

impl WeatherInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let doc = serde_json::to_value(self).unwrap_or(Value::Null);
        validation::validate(WEATHER_RULES, &doc)
    }

    /// Validate and build the document that would be stored
    pub fn into_reading(self, id: Uuid, created_at: DateTime<Utc>, version: i32) -> Result<WeatherReading, ValidationErrors> {
        self.validate()?;

        // validate() guarantees the required fields are present
        let (Some(device_name), Some(time), Some(temperature), Some(humidity), Some(longitude)) = (
            self.device_name,
            self.time.as_deref().and_then(parse_timestamp),
            self.temperature,
            self.humidity,
            self.longitude,
        ) else {
            return Err(ValidationErrors {
                messages: vec!["Missing required fields".to_string()],
                field_errors: Default::default(),
            });
        };

        Ok(WeatherReading {
            id,
            device_name,
            time,
            temperature,
            humidity,
            latitude: self.latitude,
            longitude,
            wind_direction: self.wind_direction,
            atmospheric_pressure: self.atmospheric_pressure,
            solar_radiation: self.solar_radiation,
            max_wind_speed: self.max_wind_speed,
            vapor_pressure: self.vapor_pressure,
            precipitation: self.precipitation,
            created_at,
            version,
        })
    }
}

/// Result row of the per-sensor maximum temperature aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SensorMaxTemperature {
    pub sensor_name: String,
    pub time: DateTime<Utc>,
    pub temperature: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(temperature: f64, humidity: f64) -> WeatherInput {
        WeatherInput {
            device_name: Some("Woodford_Sensor".into()),
            time: Some("2021-05-07T03:44:04Z".into()),
            temperature: Some(temperature),
            humidity: Some(humidity),
            longitude: Some(152.77),
            ..Default::default()
        }
    }

    #[test]
    fn builds_reading_from_valid_input() {
        let now = Utc::now();
        let reading = input(22.0, 70.0).into_reading(Uuid::new_v4(), now, 0).unwrap();
        assert_eq!(reading.device_name, "Woodford_Sensor");
        assert_eq!(reading.created_at, now);
        assert!(reading.is_sane());

        let doc = reading.to_document();
        assert_eq!(doc["deviceName"], "Woodford_Sensor");
        assert_eq!(doc["__v"], 0);
    }

    #[test]
    fn sanity_bounds() {
        let now = Utc::now();
        let build = |t, h| input(t, h).into_reading(Uuid::new_v4(), now, 0).unwrap();
        assert!(!build(22.0, 150.0).is_sane());
        assert!(!build(61.0, 50.0).is_sane());
        assert!(!build(-50.5, 50.0).is_sane());
        assert!(build(60.0, 100.0).is_sane());
        assert!(build(-50.0, 0.0).is_sane());
    }

    #[test]
    fn rejects_unparseable_time() {
        let mut bad = input(20.0, 50.0);
        bad.time = Some("last tuesday".into());
        let err = bad.into_reading(Uuid::new_v4(), Utc::now(), 0).unwrap_err();
        assert!(err.to_string().contains("Time of data collection must be a valid date"));
    }
}
