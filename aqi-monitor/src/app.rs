use aqi_core::{AirQualityMonitor, Event, FeedKind, ForecastSensor, IndexSensor, PollutantSensor};
use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};

/// Turns poller events into log lines built from the sensor views.
pub struct App {
    monitor: AirQualityMonitor,
}

impl App {
    pub fn new(monitor: AirQualityMonitor) -> Self {
        Self { monitor }
    }

    pub async fn handle(&self, event: Event) {
        match event {
            Event::CurrentConditions(snapshot) => {
                info!(
                    fetched = %format_time(snapshot.fetched_at),
                    "current conditions updated"
                );
                for sensor in self.monitor.index_sensors().await {
                    info!("{}", format_index(&sensor));
                }
                for sensor in self.monitor.pollutant_sensors().await {
                    info!("{}", format_pollutant(&sensor));
                }
                for (group, text) in &snapshot.health_recommendations {
                    info!("  {group}: {text}");
                }
            }
            Event::Forecast(snapshot) => {
                info!(
                    fetched = %format_time(snapshot.fetched_at),
                    "forecast updated"
                );
                for line in format_forecast(&self.monitor.forecast_sensor().await) {
                    info!("{line}");
                }
            }
            Event::RefreshFailed { feed, error } => {
                let status = match feed {
                    FeedKind::CurrentConditions => self.monitor.current_feed().status().await,
                    FeedKind::Forecast => self.monitor.forecast_feed().status().await,
                };
                warn!(
                    %feed,
                    %error,
                    failures = status.consecutive_failures,
                    last_success = %format_time(status.last_success),
                    "feed unavailable until next successful refresh"
                );
            }
        }
    }
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_pollutant(sensor: &PollutantSensor) -> String {
    let mut line = format!(
        "  {:<18} {:>8} {}",
        sensor.name,
        or_dash(sensor.value.map(|v| format!("{v:.1}"))),
        sensor.unit
    );
    if let Some(details) = &sensor.details {
        if let Some(sources) = &details.sources {
            line.push_str(&format!(" | sources: {sources}"));
        }
        if let Some(effects) = &details.effects {
            line.push_str(&format!(" | effects: {effects}"));
        }
    }
    line
}

fn format_index(sensor: &IndexSensor) -> String {
    let mut line = format!("  {:<18} {:>8}", sensor.name, or_dash(sensor.value));
    if let Some(details) = &sensor.details {
        line.push_str(&format!(
            " | {} (dominant: {})",
            or_dash(details.category.as_deref()),
            or_dash(details.dominant_pollutant.as_deref())
        ));
    }
    line
}

fn format_forecast(sensor: &ForecastSensor) -> Vec<String> {
    let mut lines = vec![format!("  next hour AQI: {}", or_dash(sensor.value))];
    lines.extend(sensor.forecast.iter().map(|point| {
        format!(
            "  {} AQI {:>4} {}",
            point.timestamp,
            or_dash(point.aqi_value),
            or_dash(point.dominant_pollutant.as_deref())
        )
    }));
    lines
}
