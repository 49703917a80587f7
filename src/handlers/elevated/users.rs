// handlers/elevated/users.rs - Teacher-side user management

use axum::extract::{Path, State};
use serde_json::json;

use crate::app::AppState;
use crate::database::models::{NewUserInput, UserPatch};
use crate::middleware::{parse_id, ApiJson, ApiQuery, ApiResponse, ApiResult};
use crate::types::Role;

/// GET /api/v1/users
pub async fn list_users(State(state): State<AppState>, ApiQuery(params): ApiQuery<Vec<(String, String)>>) -> ApiResult {
    let users = state.users.list(&params).await?;
    let results = users.len();
    Ok(ApiResponse::success(json!({ "users": users })).results(results))
}

/// POST /api/v1/users/create-user
///
/// Unlike signup no session is issued; the account belongs to someone else.
pub async fn create_user(State(state): State<AppState>, ApiJson(input): ApiJson<NewUserInput>) -> ApiResult {
    let user = state.users.register(input, Role::Student).await?;
    Ok(ApiResponse::created(json!({ "user": user })))
}

/// GET /api/v1/users/:id
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let user = state.users.get(parse_id(id.trim())?).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// PATCH /api/v1/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> ApiResult {
    let user = state.users.update(parse_id(id.trim())?, &patch).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// DELETE /api/v1/users/:id
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.users.delete(parse_id(id.trim())?).await?;
    Ok(ApiResponse::no_content())
}
