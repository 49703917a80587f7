mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn max_precipitation_looks_back_five_months() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.student().await?;
    let now = Utc::now();
    app.seed_reading("Woodford_Sensor", now - Duration::days(30), 20.0, Some(0.5)).await?;
    app.seed_reading("Woodford_Sensor", now - Duration::days(90), 20.0, Some(0.9)).await?;
    app.seed_reading("Woodford_Sensor", now - Duration::days(210), 20.0, Some(3.0)).await?;
    app.seed_reading("Noosa_Sensor", now - Duration::days(10), 20.0, Some(7.5)).await?;

    let res = app.get("/api/v1/weather/max-precipitation/Woodford_Sensor", &token).await?;
    assert_eq!(res.status, StatusCode::OK, "body: {}", res.body);
    let data = &res.body["data"];
    assert_eq!(data["precipitation"], 0.9);
    assert_eq!(data["deviceName"], "Woodford_Sensor");
    assert!(data["time"].is_string());
    assert!(data.get("_id").is_none());
    assert!(data.get("temperature").is_none());
    Ok(())
}

#[tokio::test]
async fn max_precipitation_for_unknown_sensor() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.teacher().await?;

    let res = app.get("/api/v1/weather/max-precipitation/Nowhere_Sensor", &token).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        res.message(),
        "No precipitation record found for the specified sensor in the last five months"
    );
    Ok(())
}

#[tokio::test]
async fn max_temperature_per_sensor_prefers_earliest_tie() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.teacher().await?;
    let at = |day: u32, hour: u32| Utc.with_ymd_and_hms(2021, 5, day, hour, 0, 0).unwrap();

    app.seed_reading("Woodford_Sensor", at(3, 9), 28.0, None).await?;
    app.seed_reading("Woodford_Sensor", at(2, 14), 28.0, None).await?;
    app.seed_reading("Woodford_Sensor", at(4, 12), 25.0, None).await?;
    app.seed_reading("Noosa_Sensor", at(5, 13), 31.5, None).await?;
    // Outside the range
    app.seed_reading("Noosa_Sensor", at(20, 13), 40.0, None).await?;

    let res = app
        .get("/api/v1/weather/max-temp?startDate=2021-05-01&endDate=2021-05-10", &token)
        .await?;
    assert_eq!(res.status, StatusCode::OK, "body: {}", res.body);
    assert_eq!(
        res.body["data"],
        json!([
            { "sensorName": "Noosa_Sensor", "time": "2021-05-05T13:00:00Z", "temperature": 31.5 },
            { "sensorName": "Woodford_Sensor", "time": "2021-05-02T14:00:00Z", "temperature": 28.0 },
        ])
    );
    Ok(())
}

#[tokio::test]
async fn max_temperature_argument_errors() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.teacher().await?;

    let missing = app.get("/api/v1/weather/max-temp?startDate=2021-05-01", &token).await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "Please provide startDate and endDate");

    let invalid = app
        .get("/api/v1/weather/max-temp?startDate=yesterday&endDate=2021-05-10", &token)
        .await?;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.message(), "Invalid date format");

    let empty = app
        .get("/api/v1/weather/max-temp?startDate=1999-01-01&endDate=1999-12-31", &token)
        .await?;
    assert_eq!(empty.status, StatusCode::NOT_FOUND);
    assert_eq!(empty.message(), "No temperature readings found for the specified date range");
    Ok(())
}

#[tokio::test]
async fn repeated_query_keys_get_a_json_bad_request() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.teacher().await?;

    let res = app
        .get(
            "/api/v1/weather/max-temp?startDate=2021-05-01&startDate=2021-05-02&endDate=2021-05-10",
            &token,
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(res.body["status"], "fail");
    assert!(res.message().contains("startDate"), "{}", res.message());

    let stats = app
        .get("/api/v1/weather/weather-stats/Woodford_Sensor?date=2021-05-07&date=2021-05-08&time=03:44:04", &token)
        .await?;
    assert_eq!(stats.status, StatusCode::BAD_REQUEST);
    assert_eq!(stats.body["status"], "fail");
    Ok(())
}

#[tokio::test]
async fn stats_at_a_specific_second() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.student().await?;
    let taken = Utc.with_ymd_and_hms(2021, 5, 7, 3, 44, 4).unwrap() + Duration::milliseconds(250);
    app.seed_reading("Woodford_Sensor", taken, 22.74, Some(0.085)).await?;

    let hit = app
        .get("/api/v1/weather/weather-stats/Woodford_Sensor?date=2021-05-07&time=03:44:04", &token)
        .await?;
    assert_eq!(hit.status, StatusCode::OK, "body: {}", hit.body);
    let reading = &hit.body["data"]["weatherReading"];
    assert_eq!(reading["temperature"], 22.74);
    assert_eq!(reading["precipitation"], 0.085);
    assert_eq!(reading["atmosphericPressure"], 101.3);
    assert_eq!(reading["solarRadiation"], 120.0);
    assert!(reading.get("humidity").is_none());
    assert!(reading.get("_id").is_none());

    let miss = app
        .get("/api/v1/weather/weather-stats/Woodford_Sensor?date=2021-05-07&time=03:44:05", &token)
        .await?;
    assert_eq!(miss.status, StatusCode::NOT_FOUND);
    assert_eq!(miss.message(), "No reading found for the specified date and time");

    let other_sensor = app
        .get("/api/v1/weather/weather-stats/Noosa_Sensor?date=2021-05-07&time=03:44:04", &token)
        .await?;
    assert_eq!(other_sensor.status, StatusCode::NOT_FOUND);

    let invalid = app
        .get("/api/v1/weather/weather-stats/Woodford_Sensor?date=2021-13-40&time=03:44:04", &token)
        .await?;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.message(), "Invalid date format");

    let missing = app.get("/api/v1/weather/weather-stats/Woodford_Sensor?date=2021-05-07", &token).await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    Ok(())
}
