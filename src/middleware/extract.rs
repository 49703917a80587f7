use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `Json<T>` whose rejection renders through `ApiError`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Query<T>` whose rejection renders through `ApiError`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Path ids are validated by hand so a malformed one reads as a cast error
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid _id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Range {
        start_date: Option<String>,
    }

    async fn extract_range(uri: &str) -> Result<ApiQuery<Range>, ApiError> {
        let (mut parts, _) = HttpRequest::builder().uri(uri).body(()).unwrap().into_parts();
        ApiQuery::<Range>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn query_rejection_is_a_bad_request() {
        let ApiQuery(range) = extract_range("/x?startDate=2021-05-01").await.unwrap();
        assert_eq!(range.start_date.as_deref(), Some("2021-05-01"));

        let err = extract_range("/x?startDate=2021-05-01&startDate=2021-05-02").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("startDate"), "{}", err.message());
    }

    #[test]
    fn malformed_id_is_a_bad_request() {
        let err = parse_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid _id: not-a-uuid");
        assert!(parse_id("0b5c6f6e-8f5e-4c57-9d2b-2d1e4c4f6a11").is_ok());
    }
}
