// HTTP API Error Types
use axum::{extract::rejection::{JsonRejection, QueryRejection}, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::TokenError;
use crate::database::validation::ValidationErrors;
use crate::filter::FilterError;
use crate::services::{UserError, WeatherError};
use crate::store::StoreError;

/// Message shown for 5xx responses outside development
const GENERIC_SERVER_ERROR: &str = "Something went very wrong!";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Clone)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // Duplicate unique value, reported as 400
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 400,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Detailed message; for 5xx this may contain internals
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Production body: `fail` for 4xx, `error` with a generic message for 5xx
    pub fn to_json(&self) -> Value {
        if self.is_server_error() {
            return json!({ "status": "error", "message": GENERIC_SERVER_ERROR });
        }

        let mut body = json!({ "status": "fail", "message": self.message() });
        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            body["errors"] = json!(field_errors);
        }
        body
    }

    /// Development body: numeric status and the full message
    pub fn to_detailed_json(&self) -> Value {
        let mut body = json!({
            "status": self.status_code(),
            "message": self.message(),
            "code": self.error_code(),
        });
        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            body["errors"] = json!(field_errors);
        }
        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(detail) => {
                tracing::debug!("Unique constraint violated: {}", detail);
                ApiError::conflict("User email already existed.")
            }
            StoreError::Decode(msg) => {
                tracing::error!("Store decode error: {}", msg);
                ApiError::internal_server_error(format!("Stored document could not be decoded: {}", msg))
            }
            StoreError::Database(sqlx::Error::PoolTimedOut) => {
                tracing::error!("Database pool timed out");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            StoreError::Database(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error(format!("Database error: {}", sqlx_err))
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::validation_error(err.to_string(), None)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        let message = err.to_string();
        ApiError::validation_error(message, Some(err.field_errors))
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::unauthorized("Your token has expired! Please log in again."),
            TokenError::Invalid(detail) => {
                tracing::warn!("Rejected token: {}", detail);
                ApiError::unauthorized("Invalid token. Please log in again!")
            }
            other => {
                tracing::error!("Token service error: {}", other);
                ApiError::internal_server_error(other.to_string())
            }
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::Validation(e) => e.into(),
            WeatherError::Store(e) => e.into(),
            WeatherError::Filter(e) => e.into(),
            WeatherError::NotFound(msg) => ApiError::not_found(msg),
            e @ WeatherError::PageNotFound => ApiError::not_found(e.to_string()),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(e) => e.into(),
            UserError::Store(e) => e.into(),
            UserError::Filter(e) => e.into(),
            UserError::Hashing(e) => e.into(),
            e @ UserError::MissingCredentials => ApiError::bad_request(e.to_string()),
            UserError::NotFound(msg) => ApiError::not_found(msg),
            e @ UserError::PageNotFound => ApiError::not_found(e.to_string()),
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Password hashing failed: {}", err);
        ApiError::internal_server_error(format!("Password hashing failed: {}", err))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_json())).into_response();
        // Picked up by the development-mode error renderer
        response.extensions_mut().insert(self);
        response
    }
}
