// handlers/protected/weather/stats.rs - Aggregations over readings

use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult};
use crate::types::parse_timestamp;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstantQuery {
    pub date: Option<String>,
    pub time: Option<String>,
}

/// GET /api/v1/weather/max-precipitation/:sensorName
pub async fn max_precipitation(State(state): State<AppState>, Path(sensor_name): Path<String>) -> ApiResult {
    let reading = state.weather.max_precipitation(&sensor_name, Utc::now()).await?;
    Ok(ApiResponse::success(reading))
}

/// GET /api/v1/weather/max-temp?startDate=&endDate=
pub async fn max_temperature(State(state): State<AppState>, ApiQuery(query): ApiQuery<DateRangeQuery>) -> ApiResult {
    let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
        return Err(ApiError::bad_request("Please provide startDate and endDate"));
    };
    let (Some(start), Some(end)) = (parse_timestamp(&start), parse_timestamp(&end)) else {
        return Err(ApiError::bad_request("Invalid date format"));
    };

    let rows = state.weather.max_temperature(start, end).await?;
    Ok(ApiResponse::success(json!(rows)))
}

/// GET /api/v1/weather/weather-stats/:sensorName?date=YYYY-MM-DD&time=HH:MM:SS
pub async fn stats(
    State(state): State<AppState>,
    Path(sensor_name): Path<String>,
    ApiQuery(query): ApiQuery<InstantQuery>,
) -> ApiResult {
    let (Some(date), Some(time)) = (query.date, query.time) else {
        return Err(ApiError::bad_request("Please provide date and time"));
    };
    let instant = parse_timestamp(&format!("{}T{}Z", date, time))
        .ok_or_else(|| ApiError::bad_request("Invalid date format"))?;

    let reading = state.weather.stats_at(&sensor_name, instant).await?;
    Ok(ApiResponse::success(json!({ "weatherReading": reading })))
}
