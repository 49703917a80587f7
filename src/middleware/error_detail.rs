use axum::{
    body::Body,
    extract::State,
    http::header,
    response::Response,
};

use crate::config::Environment;
use crate::error::ApiError;

/// Development-mode error renderer
///
/// Every `ApiError` response carries the error in its extensions. Outside
/// development the production body is left alone; in development it is
/// replaced by the detailed form with the numeric status.
pub async fn render_error_detail(State(environment): State<Environment>, response: Response) -> Response {
    if !environment.is_development() {
        return response;
    }
    let Some(error) = response.extensions().get::<ApiError>().cloned() else {
        return response;
    };

    if error.is_server_error() {
        tracing::error!("{} {}", error.status_code(), error.message());
    }

    let body = match serde_json::to_vec(&error.to_detailed_json()) {
        Ok(body) => body,
        Err(_) => return response,
    };
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}
