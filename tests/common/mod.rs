#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use weather_api::config::{AppConfig, Environment, StoreBackend};
use weather_api::database::models::{NewUserInput, User, WeatherReading};
use weather_api::store::Stores;
use weather_api::types::Role;
use weather_api::{app, AppState};

pub const PASSWORD: &str = "pass1234";

/// The full router over a fresh memory store
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    /// Every `Set-Cookie` header value
    pub fn cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }
}

pub fn test_config(environment: Environment) -> AppConfig {
    let mut config = match environment {
        Environment::Development => AppConfig::development(),
        Environment::Production => AppConfig::production(),
    };
    config.database.backend = StoreBackend::Memory;
    config.security.jwt_secret = "integration-test-secret".into();
    config
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(Environment::Development))
    }

    pub fn production() -> Self {
        Self::with_config(test_config(Environment::Production))
    }

    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(config, Stores::memory()).expect("test secret is set");
        let router = app(state.clone());
        Self { state, router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Register a user directly and hand back a session token for it
    pub async fn user(&self, name: &str, email: &str, role: Role) -> Result<(User, String)> {
        let input = NewUserInput {
            name: Some(name.into()),
            email: Some(email.into()),
            role: Some(role.to_string()),
            password: Some(PASSWORD.into()),
            password_confirm: Some(PASSWORD.into()),
        };
        let user = self.state.users.register(input, role).await?;
        let token = self.state.tokens.issue(user.id)?;
        Ok((user, token))
    }

    pub async fn teacher(&self) -> Result<(User, String)> {
        self.user("Tess Teacher", "tess@school.test", Role::Teacher).await
    }

    pub async fn student(&self) -> Result<(User, String)> {
        self.user("Sam Student", "sam@school.test", Role::Student).await
    }

    pub async fn sensor(&self) -> Result<(User, String)> {
        self.user("Woodford Sensor", "woodford@sensors.test", Role::Sensor).await
    }

    /// Store a reading as-is, bypassing validation and the sanity gate
    pub async fn seed_reading(
        &self,
        device: &str,
        time: DateTime<Utc>,
        temperature: f64,
        precipitation: Option<f64>,
    ) -> Result<WeatherReading> {
        let reading = WeatherReading {
            id: Uuid::new_v4(),
            device_name: device.into(),
            time,
            temperature,
            humidity: 55.0,
            latitude: Some(-27.1),
            longitude: 152.77,
            wind_direction: Some(180.0),
            atmospheric_pressure: Some(101.3),
            solar_radiation: Some(120.0),
            max_wind_speed: Some(4.2),
            vapor_pressure: Some(1.8),
            precipitation,
            created_at: Utc::now(),
            version: 0,
        };
        self.state.stores.weather.insert(&reading).await?;
        Ok(reading)
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await.context("router failed")?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok(TestResponse { status, headers, body })
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::GET, uri, Some(token), None).await
    }
}
