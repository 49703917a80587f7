// handlers/elevated/bulk.rs - Date-ranged bulk user operations
//
// Both ranges are whole UTC days: from 00:00 on the start date up to, but
// not including, 00:00 on the day after the end date.

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, CurrentUser};
use crate::types::{parse_timestamp, utc_day_range, Role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub new_role: Option<String>,
}

fn day_range(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    match (parse_timestamp(start), parse_timestamp(end)) {
        (Some(start), Some(end)) => Ok(utc_day_range(start, end)),
        _ => Err(ApiError::bad_request("Invalid date format")),
    }
}

/// PATCH /api/v1/users/update-role?startDate=&endDate=&newRole=
pub async fn update_roles(State(state): State<AppState>, ApiQuery(query): ApiQuery<BulkQuery>) -> ApiResult {
    let (Some(start), Some(end), Some(new_role)) = (query.start_date, query.end_date, query.new_role) else {
        return Err(ApiError::bad_request("Please provide startDate, endDate, and newRole"));
    };
    let role: Role = new_role
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid role specified"))?;
    let (start, end) = day_range(&start, &end)?;

    let modified = state.users.update_roles_created_between(start, end, role).await?;
    Ok(ApiResponse::ok().message(format!("{} users' roles updated successfully", modified)))
}

/// DELETE /api/v1/users/last-login?startDate=&endDate=
///
/// Only students are removed, and never the caller.
pub async fn delete_by_last_login(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiQuery(query): ApiQuery<BulkQuery>,
) -> ApiResult {
    let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
        return Err(ApiError::bad_request("Please provide startDate and endDate"));
    };
    let (start, end) = day_range(&start, &end)?;

    state.users.delete_students_last_seen_between(start, end, caller.id).await?;
    Ok(ApiResponse::no_content())
}
