use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "jwt";
/// Cookie value written on logout; never a valid token
pub const LOGGED_OUT: &str = "loggedout";

const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";

/// The authenticated caller, attached by [`protect`]
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Resolve the caller from a bearer token or the session cookie
///
/// Runs, in order: credential extraction, token verification, identity
/// lookup and the password freshness check. The first failure ends the
/// request with 401.
pub async fn protect(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        warn!("Rejected {} {}: no credentials", request.method(), request.uri().path());
        ApiError::unauthorized(NOT_LOGGED_IN)
    })?;

    let claims = state.tokens.verify(&token)?;

    let user = state.stores.users.find_by_id(claims.sub).await?.ok_or_else(|| {
        warn!("Token subject {} no longer exists", claims.sub);
        ApiError::unauthorized("The user belonging to this token no longer exists.")
    })?;

    if user.changed_password_after(claims.iat) {
        warn!("Stale token for {} issued before password change", user.email);
        return Err(ApiError::unauthorized("User recently changed password! Please log in again."));
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// `Authorization: Bearer` wins over the cookie; the logout sentinel counts as absent
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer"))
        .map(|v| v.trim().to_string());

    let token = match bearer {
        Some(token) => token,
        None => CookieJar::from_headers(headers).get(SESSION_COOKIE)?.value().to_string(),
    };

    if token.is_empty() || token == LOGGED_OUT {
        return None;
    }
    Some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(NOT_LOGGED_IN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        headers.insert(header::COOKIE, HeaderValue::from_static("jwt=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn falls_back_to_cookie_and_ignores_sentinel() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; jwt=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));

        headers.insert(header::COOKIE, HeaderValue::from_static("jwt=loggedout"));
        assert_eq!(extract_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&headers), None);
    }
}
