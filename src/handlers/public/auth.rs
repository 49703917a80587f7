// handlers/public/auth.rs - Signup, login and logout

use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::NewUserInput;
use crate::error::ApiError;
use crate::handlers::session::{logged_out, send_token, FAILED_LOGIN_SECS, LOGOUT_SECS};
use crate::middleware::{ApiJson, ApiResponse};
use crate::types::Role;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/v1/users/signup
///
/// Accounts created here default to the teacher role when the body names none.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(input): ApiJson<NewUserInput>,
) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    let user = state.users.register(input, Role::Teacher).await?;
    send_token(&state, jar, &user, ApiResponse::created)
}

/// POST /api/v1/users/login
///
/// Failures also replace any session cookie with the short-lived sentinel.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<ApiJson<LoginRequest>>,
) -> Result<(CookieJar, ApiResponse<Value>), (CookieJar, ApiError)> {
    let ApiJson(body) = body.unwrap_or_default();

    let user = match state.users.authenticate(body.email.as_deref(), body.password.as_deref()).await {
        Ok(user) => user,
        Err(e) => return Err((logged_out(jar, FAILED_LOGIN_SECS), e.into())),
    };

    tracing::info!("{} logged in", user.email);
    send_token(&state, jar.clone(), &user, ApiResponse::success).map_err(|e| (jar, e))
}

/// GET /api/v1/users/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<Value>) {
    (logged_out(jar, LOGOUT_SECS), ApiResponse::ok())
}
