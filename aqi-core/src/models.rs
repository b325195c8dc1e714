use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollutantReading {
    pub code: String,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub concentration_value: Option<f64>,
    pub concentration_units: Option<String>,
    pub sources: Option<String>,
    pub effects: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexScore {
    pub code: String,
    pub display_name: Option<String>,
    pub aqi_value: Option<i64>,
    pub aqi_display: Option<String>,
    pub category: Option<String>,
    pub dominant_pollutant: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForecastPoint {
    /// ISO 8601 UTC timestamp of the forecast hour, as sent upstream.
    pub timestamp: String,
    pub aqi_value: Option<i64>,
    pub dominant_pollutant: Option<String>,
}

/// Cached view of the current-conditions feed.
///
/// Pollutants and indexes always come from the same fetch; the whole value is
/// replaced on every successful refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrentConditions {
    pub pollutants: HashMap<String, PollutantReading>,
    pub indexes: Vec<IndexScore>,
    pub health_recommendations: BTreeMap<String, String>,
    pub region_code: Option<String>,
    pub observed_at: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CurrentConditions {
    pub fn pollutant(&self, code: &str) -> Option<&PollutantReading> {
        self.pollutants.get(code)
    }

    pub fn is_empty(&self) -> bool {
        self.fetched_at.is_none()
    }
}

/// Cached view of the forecast feed, chronological.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
    pub points: Vec<ForecastPoint>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Forecast {
    pub fn first(&self) -> Option<&ForecastPoint> {
        self.points.first()
    }
}
