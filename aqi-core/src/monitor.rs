use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::config::FeedConfig;
use crate::current::CurrentConditionsFeed;
use crate::error::FetchError;
use crate::forecast::{ForecastFeed, ForecastRefresh};
use crate::models::{CurrentConditions, ForecastPoint, IndexScore, PollutantReading};
use crate::sensors::{
    forecast_sensor, index_sensors, pollutant_sensors, ForecastSensor, IndexSensor,
    PollutantSensor,
};

/// Both feeds for one configured location, sharing a key and coordinates.
#[derive(Debug, Clone)]
pub struct AirQualityMonitor {
    config: Arc<FeedConfig>,
    current: CurrentConditionsFeed,
    forecast: ForecastFeed,
}

#[derive(Debug)]
pub struct TickOutcome {
    pub current: Result<Arc<CurrentConditions>, FetchError>,
    pub forecast: Result<ForecastRefresh, FetchError>,
}

impl AirQualityMonitor {
    pub fn new(config: FeedConfig, client: Client) -> Self {
        let config = Arc::new(config);
        Self {
            current: CurrentConditionsFeed::with_shared_config(Arc::clone(&config), client.clone()),
            forecast: ForecastFeed::with_shared_config(Arc::clone(&config), client),
            config,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn current_feed(&self) -> &CurrentConditionsFeed {
        &self.current
    }

    pub fn forecast_feed(&self) -> &ForecastFeed {
        &self.forecast
    }

    /// Refresh current conditions and, if due, the forecast. The feeds share no
    /// state so they run side by side; one failing never affects the other.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        let (current, forecast) =
            tokio::join!(self.current.refresh(), self.forecast.refresh_if_due(now));
        TickOutcome { current, forecast }
    }

    pub async fn pollutant(&self, code: &str) -> Option<PollutantReading> {
        self.current.pollutant(code).await
    }

    pub async fn indexes(&self) -> Vec<IndexScore> {
        self.current.indexes().await
    }

    pub async fn forecast(&self) -> Vec<ForecastPoint> {
        self.forecast.forecast().await
    }

    pub async fn pollutant_sensors(&self) -> Vec<PollutantSensor> {
        let snapshot = self.current.snapshot().await;
        pollutant_sensors(&snapshot, self.config.additional_info)
    }

    pub async fn index_sensors(&self) -> Vec<IndexSensor> {
        let snapshot = self.current.snapshot().await;
        index_sensors(&snapshot, self.config.additional_info)
    }

    pub async fn forecast_sensor(&self) -> ForecastSensor {
        let snapshot = self.forecast.snapshot().await;
        forecast_sensor(&snapshot)
    }
}
