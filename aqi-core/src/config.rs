use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::models::Coordinates;

pub const CURRENT_CONDITIONS_URL: &str =
    "https://airquality.googleapis.com/v1/currentConditions:lookup";
pub const FORECAST_URL: &str = "https://airquality.googleapis.com/v1/forecast:lookup";

pub const MIN_INTERVAL_HOURS: u32 = 1;
pub const MAX_INTERVAL_HOURS: u32 = 24;
pub const MAX_FORECAST_LENGTH_HOURS: u32 = 96;

const API_KEY_ENV: &str = "GOOGLE_AQI_API_KEY";
const LATITUDE_ENV: &str = "GOOGLE_AQI_LATITUDE";
const LONGITUDE_ENV: &str = "GOOGLE_AQI_LONGITUDE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub current_conditions: String,
    pub forecast: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            current_conditions: CURRENT_CONDITIONS_URL.to_string(),
            forecast: FORECAST_URL.to_string(),
        }
    }
}

/// User-facing settings as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub update_interval_hours: u32,
    pub forecast_interval_hours: u32,
    pub forecast_length_hours: u32,
    pub get_additional_info: bool,
    pub request_timeout_seconds: u64,
    pub endpoints: Endpoints,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            update_interval_hours: 1,
            forecast_interval_hours: 3,
            forecast_length_hours: 24,
            get_additional_info: false,
            request_timeout_seconds: 10,
            endpoints: Endpoints::default(),
        }
    }
}

/// Validated settings handed to the feeds. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub api_key: String,
    pub coordinates: Coordinates,
    pub tick_interval_hours: u32,
    pub forecast_interval_hours: u32,
    pub forecast_length_hours: u32,
    pub additional_info: bool,
    pub endpoints: Endpoints,
}

impl MonitorConfig {
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        let app_config_dir = config_dir.join("aqi-monitor");
        std::fs::create_dir_all(&app_config_dir)?;
        Ok(app_config_dir.join("config.json"))
    }

    /// Loads the config file, falling back to the defaults.
    pub fn load() -> Self {
        match Self::config_file_path() {
            Ok(path) => Self::load_or_init(&path),
            Err(e) => {
                warn!(error = %e, "no config location, using defaults");
                Self::default()
            }
        }
    }

    /// Loads `path`. Defaults are written out only when the file does not
    /// exist yet; an unreadable or invalid file is left as it is.
    pub fn load_or_init(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let default_config = Self::default();
                if let Err(save_err) = default_config.save_to(path) {
                    warn!(error = %save_err, "failed to save default config");
                }
                default_config
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config_content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&config_content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Encode)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment variables win over the file.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = key;
        }
        if let Some(lat) = lookup(LATITUDE_ENV).and_then(|v| v.parse().ok()) {
            self.latitude = lat;
        }
        if let Some(lon) = lookup(LONGITUDE_ENV).and_then(|v| v.parse().ok()) {
            self.longitude = lon;
        }
        self
    }

    pub fn resolve(&self) -> Result<FeedConfig, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        check_range("latitude", self.latitude, -90.0, 90.0)?;
        check_range("longitude", self.longitude, -180.0, 180.0)?;
        check_hours(
            "update_interval_hours",
            self.update_interval_hours,
            MAX_INTERVAL_HOURS,
        )?;
        check_hours(
            "forecast_interval_hours",
            self.forecast_interval_hours,
            MAX_INTERVAL_HOURS,
        )?;
        check_hours(
            "forecast_length_hours",
            self.forecast_length_hours,
            MAX_FORECAST_LENGTH_HOURS,
        )?;

        Ok(FeedConfig {
            api_key: self.api_key.trim().to_string(),
            coordinates: Coordinates::new(self.latitude, self.longitude),
            tick_interval_hours: self.update_interval_hours,
            forecast_interval_hours: self.forecast_interval_hours,
            forecast_length_hours: self.forecast_length_hours,
            additional_info: self.get_additional_info,
            endpoints: self.endpoints.clone(),
        })
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

fn check_hours(field: &'static str, value: u32, max: u32) -> Result<(), ConfigError> {
    check_range(
        field,
        f64::from(value),
        f64::from(MIN_INTERVAL_HOURS),
        f64::from(max),
    )
}
