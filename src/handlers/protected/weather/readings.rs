// handlers/protected/weather/readings.rs - Reading CRUD

use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::database::models::WeatherInput;
use crate::middleware::{parse_id, ApiJson, ApiQuery, ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct PrecipitationPatch {
    pub precipitation: Option<f64>,
}

/// GET /api/v1/weather
///
/// Query pairs keep their order and repeats so `time[gte]` and `time[lte]`
/// can both apply.
pub async fn list(State(state): State<AppState>, ApiQuery(params): ApiQuery<Vec<(String, String)>>) -> ApiResult {
    let page = state.weather.list(&params).await?;
    let results = page.documents.len();
    Ok(ApiResponse::success(json!({ "weather": page.documents })).results(results))
}

/// POST /api/v1/weather
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<WeatherInput>) -> ApiResult {
    let reading = state.weather.create(input).await?;
    Ok(ApiResponse::created(json!({ "weather": reading })))
}

/// POST /api/v1/weather/batch
pub async fn create_batch(State(state): State<AppState>, ApiJson(inputs): ApiJson<Vec<WeatherInput>>) -> ApiResult {
    let readings = state.weather.create_many(inputs).await?;
    let records = readings.len();
    Ok(ApiResponse::created(json!({ "weather": readings })).records(records))
}

/// GET /api/v1/weather/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let reading = state.weather.get(parse_id(id.trim())?).await?;
    Ok(ApiResponse::success(json!({ "weather": reading })))
}

/// PATCH /api/v1/weather/:id - full replacement
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<WeatherInput>,
) -> ApiResult {
    let reading = state.weather.replace(parse_id(id.trim())?, input).await?;
    Ok(ApiResponse::success(json!({ "weather": reading })))
}

/// PATCH /api/v1/weather/update-precipitation/:id
pub async fn update_precipitation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<PrecipitationPatch>,
) -> ApiResult {
    let reading = state
        .weather
        .update_precipitation(parse_id(id.trim())?, patch.precipitation)
        .await?;
    Ok(ApiResponse::success(json!({ "weather": reading })))
}

/// DELETE /api/v1/weather/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.weather.delete(parse_id(id.trim())?).await?;
    Ok(ApiResponse::no_content())
}
