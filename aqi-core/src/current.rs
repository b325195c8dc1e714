use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::FetchError;
use crate::feed::{post_lookup, shared_state, FeedKind, FeedStatus, SharedState};
use crate::models::{Coordinates, CurrentConditions, IndexScore, PollutantReading};
use crate::normalize::{
    decode_current_conditions, parse_health_recommendations, parse_indexes, parse_pollutants,
};

pub const CURRENT_EXTRA_COMPUTATIONS: [&str; 5] = [
    "HEALTH_RECOMMENDATIONS",
    "LOCAL_AQI",
    "POLLUTANT_ADDITIONAL_INFO",
    "DOMINANT_POLLUTANT_CONCENTRATION",
    "POLLUTANT_CONCENTRATION",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrentConditionsRequest<'a> {
    location: Coordinates,
    extra_computations: &'a [&'a str],
}

/// Polls the current-conditions endpoint once per tick and caches the result.
#[derive(Debug, Clone)]
pub struct CurrentConditionsFeed {
    client: Client,
    config: Arc<FeedConfig>,
    state: SharedState<CurrentConditions>,
}

impl CurrentConditionsFeed {
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

    /// Fetch once and replace the cached view on success. On failure the
    /// cached view is left as it was.
    pub async fn refresh(&self) -> Result<Arc<CurrentConditions>, FetchError> {
        debug!(feed = %FeedKind::CurrentConditions, "fetching current AQI data");
        let result = self.fetch().await;

        let now = Utc::now();
        let mut state = self.state.write().await;
        match result {
            Ok(conditions) => {
                let snapshot = Arc::new(conditions);
                state.snapshot = Arc::clone(&snapshot);
                state.status.record_success(now);
                debug!(
                    pollutants = snapshot.pollutants.len(),
                    indexes = snapshot.indexes.len(),
                    "fetched current conditions"
                );
                Ok(snapshot)
            }
            Err(err) => {
                state.status.record_failure(now, &err);
                warn!(
                    feed = %FeedKind::CurrentConditions,
                    error = %err,
                    "failed to fetch current AQI data"
                );
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> Result<CurrentConditions, FetchError> {
        let payload = CurrentConditionsRequest {
            location: self.config.coordinates,
            extra_computations: &CURRENT_EXTRA_COMPUTATIONS,
        };
        let body = post_lookup(
            &self.client,
            &self.config.endpoints.current_conditions,
            &self.config.api_key,
            &payload,
        )
        .await?;

        let response = decode_current_conditions(&body)?;
        Ok(CurrentConditions {
            pollutants: parse_pollutants(&response.pollutants),
            indexes: parse_indexes(&response.indexes),
            health_recommendations: parse_health_recommendations(
                response.health_recommendations.as_ref(),
            ),
            region_code: response.region_code,
            observed_at: response.date_time,
            fetched_at: Some(Utc::now()),
        })
    }

    pub async fn snapshot(&self) -> Arc<CurrentConditions> {
        Arc::clone(&self.state.read().await.snapshot)
    }

    pub async fn pollutant(&self, code: &str) -> Option<PollutantReading> {
        self.state.read().await.snapshot.pollutant(code).cloned()
    }

    pub async fn indexes(&self) -> Vec<IndexScore> {
        self.state.read().await.snapshot.indexes.clone()
    }

    pub async fn status(&self) -> FeedStatus {
        self.state.read().await.status.clone()
    }
}
