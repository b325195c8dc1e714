use std::sync::Arc;

use aqi_core::{Coordinates, Endpoints, FeedConfig, FetchError, ForecastFeed, ForecastRefresh};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORECAST_PATH: &str = "/v1/forecast:lookup";

fn feed_config(server: &MockServer) -> FeedConfig {
    FeedConfig {
        api_key: "test-key".into(),
        coordinates: Coordinates::new(52.37, 4.89),
        tick_interval_hours: 1,
        forecast_interval_hours: 3,
        forecast_length_hours: 24,
        additional_info: false,
        endpoints: Endpoints {
            current_conditions: format!("{}/v1/currentConditions:lookup", server.uri()),
            forecast: format!("{}{}", server.uri(), FORECAST_PATH),
        },
    }
}

fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn hourly_forecasts() -> serde_json::Value {
    json!({
        "hourlyForecasts": [
            {"dateTime": "2024-01-01T11:00:00Z",
             "indexes": [{"code": "uaqi", "aqi": 62, "dominantPollutant": "o3"},
                         {"code": "nld_rivm", "aqi": 2}]},
            {"dateTime": "2024-01-01T12:00:00Z",
             "indexes": [{"code": "nld_rivm", "aqi": 3}]},
            {"dateTime": "2024-01-01T13:00:00Z",
             "indexes": [{"code": "uaqi", "aqi": 58, "dominantPollutant": "pm10"}]}
        ],
        "regionCode": "nl"
    })
}

fn updated(refresh: ForecastRefresh) -> Arc<aqi_core::Forecast> {
    match refresh {
        ForecastRefresh::Updated(forecast) => forecast,
        ForecastRefresh::Skipped => panic!("expected a fetch, got Skipped"),
    }
}

#[tokio::test]
async fn first_refresh_requests_window_from_next_full_hour() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .and(query_param("key", "test-key"))
        .and(body_json(json!({
            "universalAqi": "true",
            "location": {"latitude": "52.37", "longitude": "4.89"},
            "period": {"startTime": "2024-01-01T11:00:00Z", "endTime": "2024-01-02T11:00:00Z"},
            "languageCode": "en",
            "extraComputations": [
                "HEALTH_RECOMMENDATIONS",
                "DOMINANT_POLLUTANT_CONCENTRATION",
                "POLLUTANT_ADDITIONAL_INFO",
                "LOCAL_AQI"
            ],
            "uaqiColorPalette": "RED_GREEN"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_forecasts()))
        .expect(1)
        .mount(&server)
        .await;

    let feed = ForecastFeed::new(feed_config(&server), Client::new());
    let now = at("2024-01-01T10:15:00Z");
    assert!(feed.is_due(now).await);

    let forecast = updated(feed.refresh_if_due(now).await.expect("forecast fetch"));

    assert_eq!(forecast.points.len(), 3);
    assert_eq!(forecast.fetched_at, Some(now));
    assert_eq!(forecast.points[0].aqi_value, Some(62));
    assert_eq!(forecast.points[0].dominant_pollutant.as_deref(), Some("o3"));
    assert_eq!(forecast.points[1].timestamp, "2024-01-01T12:00:00Z");
    assert_eq!(forecast.points[1].aqi_value, None);
    assert_eq!(forecast.points[1].dominant_pollutant, None);
    assert_eq!(forecast.points[2].aqi_value, Some(58));

    assert_eq!(feed.forecast().await, forecast.points);
    assert_eq!(feed.last_update().await, Some(now));
}

#[tokio::test]
async fn fresh_forecast_skips_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_forecasts()))
        .expect(2)
        .mount(&server)
        .await;

    let feed = ForecastFeed::new(feed_config(&server), Client::new());
    let t = at("2024-01-01T10:15:00Z");

    updated(feed.refresh_if_due(t).await.expect("initial fetch"));
    let cached = feed.snapshot().await;

    for offset in [1, 2] {
        let result = feed
            .refresh_if_due(t + Duration::hours(offset))
            .await
            .expect("skip is not an error");
        assert_eq!(result, ForecastRefresh::Skipped);
        assert!(Arc::ptr_eq(&cached, &feed.snapshot().await));
    }
    assert!(!feed.is_due(t + Duration::hours(3) - Duration::seconds(1)).await);

    let later = t + Duration::hours(3);
    let refreshed = updated(feed.refresh_if_due(later).await.expect("due again"));
    assert_eq!(refreshed.fetched_at, Some(later));
    assert_eq!(feed.last_update().await, Some(later));

    server.verify().await;
}

#[tokio::test]
async fn failed_fetch_keeps_cache_and_retries_on_next_tick() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_forecasts()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hourlyForecasts": []})))
        .mount(&server)
        .await;

    let feed = ForecastFeed::new(feed_config(&server), Client::new());
    let t = at("2024-01-01T10:15:00Z");
    updated(feed.refresh_if_due(t).await.expect("initial fetch"));
    let cached = feed.snapshot().await;

    let stale = t + Duration::hours(3);
    let err = feed.refresh_if_due(stale).await.expect_err("503");
    assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
    assert_eq!(*cached, *feed.snapshot().await);
    assert_eq!(feed.last_update().await, Some(t));
    assert!(!feed.status().await.is_available());

    let next_tick = stale + Duration::hours(1);
    assert!(feed.is_due(next_tick).await);
    let refreshed = updated(feed.refresh_if_due(next_tick).await.expect("retry succeeds"));
    assert!(refreshed.points.is_empty());
    assert_eq!(feed.last_update().await, Some(next_tick));
    assert!(feed.status().await.is_available());
}

#[tokio::test]
async fn missing_hourly_forecasts_is_malformed_and_stays_due() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"regionCode": "nl"})))
        .expect(2)
        .mount(&server)
        .await;

    let feed = ForecastFeed::new(feed_config(&server), Client::new());
    let t = at("2024-01-01T10:15:00Z");

    let err = feed.refresh_if_due(t).await.expect_err("malformed");
    assert!(matches!(err, FetchError::Malformed(_)));
    assert!(feed.forecast().await.is_empty());
    assert_eq!(feed.last_update().await, None);

    assert!(feed.refresh_if_due(t + Duration::minutes(5)).await.is_err());
    assert_eq!(feed.status().await.consecutive_failures, 2);
}
