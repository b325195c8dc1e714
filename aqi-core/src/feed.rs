use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FeedKind {
    CurrentConditions,
    Forecast,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKind::CurrentConditions => f.write_str("current_conditions"),
            FeedKind::Forecast => f.write_str("forecast"),
        }
    }
}

/// Outcome of the most recent refresh attempts, for availability handling.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedStatus {
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

impl FeedStatus {
    /// True when at least one refresh succeeded and the latest attempt did not fail.
    pub fn is_available(&self) -> bool {
        self.last_success.is_some() && self.last_error.is_none()
    }

    pub(crate) fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_success = Some(at);
        self.last_error = None;
        self.consecutive_failures = 0;
    }

    pub(crate) fn record_failure(&mut self, at: DateTime<Utc>, err: &FetchError) {
        self.last_failure = Some(at);
        self.last_error = Some(err.to_string());
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

#[derive(Debug)]
pub(crate) struct FeedState<T> {
    pub snapshot: Arc<T>,
    pub status: FeedStatus,
}

pub(crate) type SharedState<T> = Arc<RwLock<FeedState<T>>>;

pub(crate) fn shared_state<T: Default>() -> SharedState<T> {
    Arc::new(RwLock::new(FeedState {
        snapshot: Arc::new(T::default()),
        status: FeedStatus::default(),
    }))
}

/// Single POST against an Air Quality endpoint. Returns the body of a 200
/// response; anything else is a `FetchError`.
pub(crate) async fn post_lookup<P: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    api_key: &str,
    payload: &P,
) -> Result<String, FetchError> {
    let response = client
        .post(url)
        .query(&[("key", api_key)])
        .json(payload)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if status != StatusCode::OK {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}
