mod app;

use std::process::ExitCode;
use std::time::Duration;

use aqi_core::{spawn_poller, AirQualityMonitor, MonitorConfig, PollConfig};
use reqwest::ClientBuilder;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = MonitorConfig::load().with_env_overrides();
    let feed_config = match config.resolve() {
        Ok(feed_config) => feed_config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let client = match ClientBuilder::new()
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .user_agent(concat!("aqi-monitor/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    info!(
        latitude = feed_config.coordinates.latitude,
        longitude = feed_config.coordinates.longitude,
        update_hours = feed_config.tick_interval_hours,
        forecast_hours = feed_config.forecast_interval_hours,
        "starting air quality monitor"
    );

    let monitor = AirQualityMonitor::new(feed_config.clone(), client);
    let (update_tx, mut update_rx) = mpsc::channel(16);
    let poller = spawn_poller(
        monitor.clone(),
        PollConfig::from_feed_config(&feed_config),
        update_tx,
    );

    let app = App::new(monitor);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
            event = update_rx.recv() => match event {
                Some(event) => app.handle(event).await,
                None => break,
            },
        }
    }

    if let Err(e) = poller.stop().await {
        warn!(error = %e, "poller did not stop cleanly");
    }
    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
