//! Parsing of Air Quality API payloads into the cached shapes.
//!
//! Decoding is lenient field by field: a missing, null or mistyped value maps
//! to `None` (or an empty list) here, so a single odd record never fails a
//! whole response.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{ForecastPoint, IndexScore, PollutantReading};

pub const UNIVERSAL_AQI_CODE: &str = "uaqi";

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Non-array values become an empty list; unreadable elements become
/// `T::default()` so element count and order are preserved.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient_opt_list(deserializer)?.unwrap_or_default())
}

fn lenient_opt_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditionsResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub region_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub pollutants: Vec<RawPollutant>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub indexes: Vec<RawIndex>,
    #[serde(default, deserialize_with = "lenient")]
    pub health_recommendations: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    #[serde(default, deserialize_with = "lenient_opt_list")]
    pub hourly_forecasts: Option<Vec<RawHourlyForecast>>,
    #[serde(default, deserialize_with = "lenient")]
    pub region_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPollutant {
    #[serde(default, deserialize_with = "lenient")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub concentration: Option<RawConcentration>,
    #[serde(default, deserialize_with = "lenient")]
    pub additional_info: Option<RawAdditionalInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConcentration {
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub units: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAdditionalInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub sources: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub effects: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndex {
    #[serde(default, deserialize_with = "lenient")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub aqi: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub aqi_display: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub dominant_pollutant: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHourlyForecast {
    #[serde(default, deserialize_with = "lenient")]
    pub date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub indexes: Vec<RawIndex>,
}

/// Decode a current-conditions body. Only a body that is not a JSON object
/// is malformed.
pub fn decode_current_conditions(body: &str) -> Result<CurrentConditionsResponse, FetchError> {
    match serde_json::from_str::<Value>(body)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value)?),
        _ => Err(FetchError::Malformed(
            "current conditions body is not an object".into(),
        )),
    }
}

/// Decode a forecast body, requiring the `hourlyForecasts` collection.
pub fn decode_forecast(body: &str) -> Result<Vec<RawHourlyForecast>, FetchError> {
    let response = match serde_json::from_str::<Value>(body)? {
        value @ Value::Object(_) => serde_json::from_value::<ForecastResponse>(value)?,
        _ => ForecastResponse::default(),
    };
    response
        .hourly_forecasts
        .ok_or_else(|| FetchError::Malformed("invalid forecast data received".into()))
}

pub fn parse_pollutants(raw: &[RawPollutant]) -> HashMap<String, PollutantReading> {
    let mut pollutants = HashMap::with_capacity(raw.len());
    for pollutant in raw {
        let Some(code) = pollutant.code.as_deref() else {
            debug!("skipping pollutant entry without a code");
            continue;
        };
        let concentration = pollutant.concentration.as_ref();
        let info = pollutant.additional_info.as_ref();
        pollutants.insert(
            code.to_owned(),
            PollutantReading {
                code: code.to_owned(),
                display_name: pollutant.display_name.clone(),
                full_name: pollutant.full_name.clone(),
                concentration_value: concentration.and_then(|c| c.value),
                concentration_units: concentration.and_then(|c| c.units.clone()),
                sources: info.and_then(|i| i.sources.clone()),
                effects: info.and_then(|i| i.effects.clone()),
            },
        );
    }
    pollutants
}

pub fn parse_indexes(raw: &[RawIndex]) -> Vec<IndexScore> {
    raw.iter()
        .map(|index| IndexScore {
            code: index.code.clone().unwrap_or_default(),
            display_name: index.display_name.clone(),
            aqi_value: index.aqi,
            aqi_display: index.aqi_display.clone(),
            category: index.category.clone(),
            dominant_pollutant: index.dominant_pollutant.clone(),
        })
        .collect()
}

pub fn find_index_by_code<'a>(indexes: &'a [IndexScore], code: &str) -> Option<&'a IndexScore> {
    indexes.iter().find(|index| index.code == code)
}

/// One point per hourly entry, in input order, even when the entry carries no
/// index with `universal_code`.
pub fn parse_forecast_entries(
    raw: &[RawHourlyForecast],
    universal_code: &str,
) -> Vec<ForecastPoint> {
    raw.iter()
        .map(|entry| {
            let indexes = parse_indexes(&entry.indexes);
            let universal = find_index_by_code(&indexes, universal_code);
            ForecastPoint {
                timestamp: entry.date_time.clone().unwrap_or_default(),
                aqi_value: universal.and_then(|i| i.aqi_value),
                dominant_pollutant: universal.and_then(|i| i.dominant_pollutant.clone()),
            }
        })
        .collect()
}

/// Keeps only the textual recommendations; anything else upstream is dropped.
pub fn parse_health_recommendations(
    raw: Option<&BTreeMap<String, Value>>,
) -> BTreeMap<String, String> {
    raw.map(|groups| {
        groups
            .iter()
            .filter_map(|(group, text)| text.as_str().map(|t| (group.clone(), t.to_owned())))
            .collect()
    })
    .unwrap_or_default()
}
