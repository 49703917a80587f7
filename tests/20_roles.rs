mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::{middleware, routing::post, Router};
use serde_json::json;
use tower::ServiceExt;

use common::TestApp;
use weather_api::middleware::{gated, protect};
use weather_api::types::Role;

fn reading_body() -> serde_json::Value {
    json!({
        "deviceName": "Woodford_Sensor",
        "time": "2024-05-01T10:00:00Z",
        "temperature": 21.5,
        "humidity": 60.0,
        "longitude": 152.77,
        "precipitation": 0.2,
    })
}

#[tokio::test]
async fn denied_role_never_reaches_the_handler() -> Result<()> {
    let app = TestApp::new();
    let (_, student) = app.student().await?;
    let (_, teacher) = app.teacher().await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handler = post(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            StatusCode::OK
        }
    });
    let router = Router::new()
        .route("/probe", gated(handler, &[Role::Teacher]))
        .route_layer(middleware::from_fn_with_state(app.state.clone(), protect))
        .with_state(app.state.clone());

    let probe = |token: &str| {
        Request::builder()
            .method(Method::POST)
            .uri("/probe")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
    };

    let denied = router.clone().oneshot(probe(&student)?).await?;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let unauthenticated = router
        .clone()
        .oneshot(Request::builder().method(Method::POST).uri("/probe").body(Body::empty())?)
        .await?;
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let allowed = router.oneshot(probe(&teacher)?).await?;
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn students_read_but_cannot_write_weather() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.student().await?;

    let res = app.request(Method::POST, "/api/v1/weather", Some(&token), Some(reading_body())).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.message(), "You do not have permission to perform this action");
    assert_eq!(app.state.weather.list(&[]).await?.documents.len(), 0);

    assert_eq!(app.get("/api/v1/weather", &token).await?.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn sensors_write_but_cannot_read_weather() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.sensor().await?;

    let created = app.request(Method::POST, "/api/v1/weather", Some(&token), Some(reading_body())).await?;
    assert_eq!(created.status, StatusCode::CREATED, "body: {}", created.body);

    let listed = app.get("/api/v1/weather", &token).await?;
    assert_eq!(listed.status, StatusCode::FORBIDDEN);

    let id = created.body["data"]["weather"]["_id"].as_str().unwrap_or_default().to_string();
    let removed = app.request(Method::DELETE, &format!("/api/v1/weather/{}", id), Some(&token), None).await?;
    assert_eq!(removed.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn user_administration_is_teacher_only() -> Result<()> {
    let app = TestApp::new();
    let (_, student) = app.student().await?;
    let (_, sensor) = app.sensor().await?;
    let (_, teacher) = app.teacher().await?;

    assert_eq!(app.get("/api/v1/users", &student).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/v1/users", &sensor).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/v1/users", &teacher).await?.status, StatusCode::OK);

    // Own-account routes are open to every role
    let me = app
        .request(Method::PATCH, "/api/v1/users/updateMe", Some(&sensor), Some(json!({ "name": "Woodford Two" })))
        .await?;
    assert_eq!(me.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unknown_routes_name_the_path() -> Result<()> {
    let app = TestApp::new();

    let res = app.request(Method::GET, "/api/v2/forecast", None, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.message(), "Can't find /api/v2/forecast on this server");
    Ok(())
}

#[tokio::test]
async fn error_body_depends_on_environment() -> Result<()> {
    let production = TestApp::production();
    let res = production.request(Method::GET, "/nowhere", None, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, json!({ "status": "fail", "message": "Can't find /nowhere on this server" }));

    let development = TestApp::new();
    let res = development.request(Method::GET, "/nowhere", None, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["status"], 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn service_endpoints_answer_without_a_session() -> Result<()> {
    let app = TestApp::new();

    let root = app.request(Method::GET, "/", None, None).await?;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body["data"]["name"], "weather-api");

    let health = app.request(Method::GET, "/health", None, None).await?;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["store"], "memory");
    Ok(())
}
