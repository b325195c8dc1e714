use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::error::PollError;
use crate::feed::FeedKind;
use crate::forecast::ForecastRefresh;
use crate::models::{CurrentConditions, Forecast};
use crate::monitor::AirQualityMonitor;

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
        }
    }
}

impl PollConfig {
    pub fn from_feed_config(config: &FeedConfig) -> Self {
        Self {
            interval: Duration::from_secs(u64::from(config.tick_interval_hours) * 3600),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    CurrentConditions(Arc<CurrentConditions>),
    Forecast(Arc<Forecast>),
    RefreshFailed { feed: FeedKind, error: String },
}

pub struct PollerHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn stop(self) -> Result<(), PollError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(PollError::from)
    }
}

/// Run one tick against both feeds. A skipped forecast produces no event.
pub async fn poll_once(monitor: &AirQualityMonitor, now: DateTime<Utc>) -> Vec<Event> {
    let outcome = monitor.tick(now).await;
    let mut events = Vec::with_capacity(2);

    match outcome.current {
        Ok(snapshot) => events.push(Event::CurrentConditions(snapshot)),
        Err(err) => events.push(Event::RefreshFailed {
            feed: FeedKind::CurrentConditions,
            error: err.to_string(),
        }),
    }
    match outcome.forecast {
        Ok(ForecastRefresh::Updated(snapshot)) => events.push(Event::Forecast(snapshot)),
        Ok(ForecastRefresh::Skipped) => {}
        Err(err) => events.push(Event::RefreshFailed {
            feed: FeedKind::Forecast,
            error: err.to_string(),
        }),
    }

    events
}

/// Tick `monitor` every `config.interval`, starting immediately.
pub fn spawn_poller(
    monitor: AirQualityMonitor,
    config: PollConfig,
    update_tx: mpsc::Sender<Event>,
) -> PollerHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("poller shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    for event in poll_once(&monitor, Utc::now()).await {
                        if update_tx.send(event).await.is_err() {
                            warn!("update receiver dropped");
                        }
                    }
                }
            }
        }
    });

    PollerHandle { cancel_tx, join }
}
