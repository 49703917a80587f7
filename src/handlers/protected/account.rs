// handlers/protected/account.rs - The caller's own account

use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{PasswordChange, UserPatch};
use crate::error::ApiError;
use crate::handlers::session::send_token;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};

/// PATCH /api/v1/users/updateMe - name and email only
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult {
    if body.get("password").is_some() || body.get("passwordConfirm").is_some() {
        return Err(ApiError::bad_request(
            "This route is not for password updates. Please use /updateMyPassword.",
        ));
    }

    let patch = UserPatch {
        name: body.get("name").and_then(Value::as_str).map(str::to_string),
        email: body.get("email").and_then(Value::as_str).map(str::to_string),
        role: None,
    };
    let user = state.users.update_profile(&user, &patch).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// PATCH /api/v1/users/updateMyPassword - re-issues the session
pub async fn update_my_password(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentUser(user): CurrentUser,
    ApiJson(change): ApiJson<PasswordChange>,
) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    let user = state.users.change_password(&user, &change).await?;
    send_token(&state, jar, &user, ApiResponse::success)
}
