use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Success envelope: `{status: "success", data?, results?, records?, token?, message?}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize = Value> {
    pub data: Option<T>,
    pub status_code: StatusCode,
    results: Option<usize>,
    records: Option<usize>,
    token: Option<String>,
    message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with a `data` member
    pub fn success(data: T) -> Self {
        Self::with_status(Some(data), StatusCode::OK)
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self::with_status(Some(data), StatusCode::CREATED)
    }

    fn with_status(data: Option<T>, status_code: StatusCode) -> Self {
        Self {
            data,
            status_code,
            results: None,
            records: None,
            token: None,
            message: None,
        }
    }

    pub fn results(mut self, count: usize) -> Self {
        self.results = Some(count);
        self
    }

    pub fn records(mut self, count: usize) -> Self {
        self.records = Some(count);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<Value> {
    /// 200 with only the status member
    pub fn ok() -> Self {
        Self::with_status(None, StatusCode::OK)
    }

    /// 204 No Content (no body is sent)
    pub fn no_content() -> Self {
        Self::with_status(None, StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        if self.status_code == StatusCode::NO_CONTENT {
            return self.status_code.into_response();
        }

        let mut envelope = Map::new();
        envelope.insert("status".into(), json!("success"));
        if let Some(count) = self.results {
            envelope.insert("results".into(), json!(count));
        }
        if let Some(count) = self.records {
            envelope.insert("records".into(), json!(count));
        }
        if let Some(token) = self.token {
            envelope.insert("token".into(), Value::String(token));
        }
        if let Some(message) = self.message {
            envelope.insert("message".into(), Value::String(message));
        }
        if let Some(data) = self.data {
            match serde_json::to_value(&data) {
                Ok(value) => {
                    envelope.insert("data".into(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "status": "error", "message": "Something went very wrong!" })),
                    )
                        .into_response();
                }
            }
        }

        (self.status_code, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T = Value> = Result<ApiResponse<T>, crate::error::ApiError>;
