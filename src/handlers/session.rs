// handlers/session.rs - Session cookie helpers shared by the auth tiers

use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, LOGGED_OUT, SESSION_COOKIE};

/// Sentinel lifetime after a failed login
pub const FAILED_LOGIN_SECS: i64 = 3;
/// Sentinel lifetime after an explicit logout
pub const LOGOUT_SECS: i64 = 10;

/// Issue a token for `user`, set it as the session cookie and echo it in the body
pub fn send_token(
    state: &AppState,
    jar: CookieJar,
    user: &User,
    respond: fn(Value) -> ApiResponse<Value>,
) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    let token = state.tokens.issue(user.id)?;
    let security = &state.config.security;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(security.secure_cookies)
        .expires(OffsetDateTime::now_utc() + Duration::days(security.jwt_cookie_expires_in_days));

    Ok((jar.add(cookie), respond(json!({ "user": user })).token(token)))
}

/// Overwrite the session cookie with the logout sentinel
pub fn logged_out(jar: CookieJar, seconds: i64) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, LOGGED_OUT))
        .path("/")
        .http_only(true)
        .expires(OffsetDateTime::now_utc() + Duration::seconds(seconds));
    jar.add(cookie)
}
