use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::FetchError;
use crate::feed::{post_lookup, shared_state, FeedKind, FeedStatus, SharedState};
use crate::models::{Forecast, ForecastPoint};
use crate::normalize::{decode_forecast, parse_forecast_entries, UNIVERSAL_AQI_CODE};

pub const FORECAST_EXTRA_COMPUTATIONS: [&str; 4] = [
    "HEALTH_RECOMMENDATIONS",
    "DOMINANT_POLLUTANT_CONCENTRATION",
    "POLLUTANT_ADDITIONAL_INFO",
    "LOCAL_AQI",
];

pub const FORECAST_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Requested forecast period: from the next full hour for `length` hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ForecastWindow {
    /// `start` is the first hour boundary strictly after `now`.
    pub fn starting_after(now: DateTime<Utc>, length_hours: u32) -> Self {
        let into_hour = Duration::seconds(i64::from(now.minute() * 60 + now.second()))
            + Duration::nanoseconds(i64::from(now.nanosecond()));
        let start = now - into_hour + Duration::hours(1);
        let end = start + Duration::hours(i64::from(length_hours));
        Self { start, end }
    }

    pub fn start_time(&self) -> String {
        self.start.format(FORECAST_TIME_FORMAT).to_string()
    }

    pub fn end_time(&self) -> String {
        self.end.format(FORECAST_TIME_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastRefresh {
    Updated(Arc<Forecast>),
    /// The last successful fetch is still within the forecast interval.
    Skipped,
}

#[derive(Debug, Serialize)]
struct TextLocation {
    latitude: String,
    longitude: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Period {
    start_time: String,
    end_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastRequest<'a> {
    universal_aqi: &'a str,
    location: TextLocation,
    period: Period,
    language_code: &'a str,
    extra_computations: &'a [&'a str],
    uaqi_color_palette: &'a str,
}

/// Hourly AQI forecast, fetched only once `forecast_interval_hours` have
/// passed since the last successful fetch.
#[derive(Debug, Clone)]
pub struct ForecastFeed {
    client: Client,
    config: Arc<FeedConfig>,
    state: SharedState<Forecast>,
}

impl ForecastFeed {
    pub fn new(config: FeedConfig, client: Client) -> Self {
        Self::with_shared_config(Arc::new(config), client)
    }

    pub(crate) fn with_shared_config(config: Arc<FeedConfig>, client: Client) -> Self {
        Self {
            client,
            config,
            state: shared_state(),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    fn interval(&self) -> Duration {
        Duration::hours(i64::from(self.config.forecast_interval_hours))
    }

    /// Time of the last successful fetch, as passed to `refresh_if_due`.
    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.status.last_success
    }

    pub async fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_update().await {
            None => true,
            Some(last) => now - last >= self.interval(),
        }
    }

    pub async fn refresh_if_due(&self, now: DateTime<Utc>) -> Result<ForecastRefresh, FetchError> {
        if !self.is_due(now).await {
            debug!(feed = %FeedKind::Forecast, "forecast still fresh, skipping fetch");
            return Ok(ForecastRefresh::Skipped);
        }

        debug!(
            feed = %FeedKind::Forecast,
            interval_hours = self.config.forecast_interval_hours,
            length_hours = self.config.forecast_length_hours,
            "fetching forecast data"
        );
        let result = self.fetch(now).await;

        let mut state = self.state.write().await;
        match result {
            Ok(points) => {
                let snapshot = Arc::new(Forecast {
                    points,
                    fetched_at: Some(now),
                });
                state.snapshot = Arc::clone(&snapshot);
                state.status.record_success(now);
                debug!(entries = snapshot.points.len(), "received forecast entries");
                Ok(ForecastRefresh::Updated(snapshot))
            }
            Err(err) => {
                state.status.record_failure(now, &err);
                warn!(feed = %FeedKind::Forecast, error = %err, "failed to fetch forecast data");
                Err(err)
            }
        }
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<ForecastPoint>, FetchError> {
        let window = ForecastWindow::starting_after(now, self.config.forecast_length_hours);
        let payload = ForecastRequest {
            universal_aqi: "true",
            location: TextLocation {
                latitude: self.config.coordinates.latitude.to_string(),
                longitude: self.config.coordinates.longitude.to_string(),
            },
            period: Period {
                start_time: window.start_time(),
                end_time: window.end_time(),
            },
            language_code: "en",
            extra_computations: &FORECAST_EXTRA_COMPUTATIONS,
            uaqi_color_palette: "RED_GREEN",
        };
        let body = post_lookup(
            &self.client,
            &self.config.endpoints.forecast,
            &self.config.api_key,
            &payload,
        )
        .await?;

        let hourly = decode_forecast(&body)?;
        Ok(parse_forecast_entries(&hourly, UNIVERSAL_AQI_CODE))
    }

    pub async fn snapshot(&self) -> Arc<Forecast> {
        Arc::clone(&self.state.read().await.snapshot)
    }

    pub async fn forecast(&self) -> Vec<ForecastPoint> {
        self.state.read().await.snapshot.points.clone()
    }

    pub async fn status(&self) -> FeedStatus {
        self.state.read().await.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn window_starts_at_next_full_hour() {
        let window = ForecastWindow::starting_after(at("2024-01-01T10:15:00Z"), 24);
        assert_eq!(window.start_time(), "2024-01-01T11:00:00Z");
        assert_eq!(window.end_time(), "2024-01-02T11:00:00Z");
    }

    #[test]
    fn window_on_exact_hour_moves_to_the_following_hour() {
        let window = ForecastWindow::starting_after(at("2024-01-01T10:00:00Z"), 1);
        assert_eq!(window.start_time(), "2024-01-01T11:00:00Z");
        assert_eq!(window.end_time(), "2024-01-01T12:00:00Z");
    }

    #[test]
    fn window_drops_sub_second_precision_and_crosses_days() {
        let window = ForecastWindow::starting_after(at("2024-12-31T23:59:59.999Z"), 96);
        assert_eq!(window.start_time(), "2025-01-01T00:00:00Z");
        assert_eq!(window.end_time(), "2025-01-05T00:00:00Z");
        assert_eq!(window.start.nanosecond(), 0);
    }
}
