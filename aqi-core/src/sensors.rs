//! Display-ready views over the cached snapshots.
//!
//! Descriptive attributes (sources, effects, category, dominant pollutant) are
//! only exposed when the additional-info setting is on.

use serde::Serialize;

use crate::models::{CurrentConditions, Forecast, ForecastPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollutantInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
}

pub const KNOWN_POLLUTANTS: [PollutantInfo; 6] = [
    PollutantInfo {
        code: "pm25",
        name: "PM2.5",
        unit: "µg/m³",
    },
    PollutantInfo {
        code: "pm10",
        name: "PM10",
        unit: "µg/m³",
    },
    PollutantInfo {
        code: "co",
        name: "Carbon Monoxide",
        unit: "ppm",
    },
    PollutantInfo {
        code: "no2",
        name: "Nitrogen Dioxide",
        unit: "ppb",
    },
    PollutantInfo {
        code: "so2",
        name: "Sulfur Dioxide",
        unit: "ppb",
    },
    PollutantInfo {
        code: "o3",
        name: "Ozone",
        unit: "ppb",
    },
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PollutantDetails {
    pub sources: Option<String>,
    pub effects: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PollutantSensor {
    pub code: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub value: Option<f64>,
    pub details: Option<PollutantDetails>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexDetails {
    pub category: Option<String>,
    pub dominant_pollutant: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexSensor {
    pub code: String,
    pub name: String,
    pub value: Option<i64>,
    pub details: Option<IndexDetails>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ForecastSensor {
    /// AQI of the first forecast hour.
    pub value: Option<i64>,
    pub forecast: Vec<ForecastPoint>,
}

/// One sensor per catalog pollutant, whether or not the last fetch reported it.
pub fn pollutant_sensors(
    conditions: &CurrentConditions,
    additional_info: bool,
) -> Vec<PollutantSensor> {
    KNOWN_POLLUTANTS
        .iter()
        .map(|info| {
            let reading = conditions.pollutant(info.code);
            PollutantSensor {
                code: info.code,
                name: info.name,
                unit: info.unit,
                value: reading.and_then(|r| r.concentration_value),
                details: additional_info.then(|| PollutantDetails {
                    sources: reading.and_then(|r| r.sources.clone()),
                    effects: reading.and_then(|r| r.effects.clone()),
                }),
            }
        })
        .collect()
}

pub fn index_sensors(conditions: &CurrentConditions, additional_info: bool) -> Vec<IndexSensor> {
    conditions
        .indexes
        .iter()
        .filter(|index| !index.code.is_empty())
        .map(|index| IndexSensor {
            code: index.code.clone(),
            name: index
                .display_name
                .clone()
                .unwrap_or_else(|| index.code.to_uppercase()),
            value: index.aqi_value,
            details: additional_info.then(|| IndexDetails {
                category: index.category.clone(),
                dominant_pollutant: index.dominant_pollutant.clone(),
            }),
        })
        .collect()
}

pub fn forecast_sensor(forecast: &Forecast) -> ForecastSensor {
    ForecastSensor {
        value: forecast.first().and_then(|point| point.aqi_value),
        forecast: forecast.points.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexScore, PollutantReading};

    fn conditions() -> CurrentConditions {
        let mut conditions = CurrentConditions::default();
        conditions.pollutants.insert(
            "pm25".into(),
            PollutantReading {
                code: "pm25".into(),
                display_name: Some("PM2.5".into()),
                full_name: None,
                concentration_value: Some(12.5),
                concentration_units: Some("MICROGRAMS_PER_CUBIC_METER".into()),
                sources: Some("Traffic".into()),
                effects: Some("Asthma".into()),
            },
        );
        conditions.indexes = vec![
            IndexScore {
                code: "uaqi".into(),
                display_name: Some("Universal AQI".into()),
                aqi_value: Some(64),
                aqi_display: Some("64".into()),
                category: Some("Good air quality".into()),
                dominant_pollutant: Some("pm25".into()),
            },
            IndexScore {
                code: "usa_epa".into(),
                display_name: None,
                aqi_value: Some(51),
                aqi_display: None,
                category: None,
                dominant_pollutant: None,
            },
            IndexScore {
                code: String::new(),
                display_name: None,
                aqi_value: None,
                aqi_display: None,
                category: None,
                dominant_pollutant: None,
            },
        ];
        conditions
    }

    #[test]
    fn pollutant_sensors_cover_the_catalog() {
        let sensors = pollutant_sensors(&conditions(), false);
        assert_eq!(sensors.len(), KNOWN_POLLUTANTS.len());

        let pm25 = sensors.iter().find(|s| s.code == "pm25").expect("pm25");
        assert_eq!(pm25.value, Some(12.5));
        assert_eq!(pm25.unit, "µg/m³");
        assert_eq!(pm25.details, None);

        let so2 = sensors.iter().find(|s| s.code == "so2").expect("so2");
        assert_eq!(so2.value, None);
    }

    #[test]
    fn pollutant_details_only_with_additional_info() {
        let sensors = pollutant_sensors(&conditions(), true);
        let pm25 = sensors.iter().find(|s| s.code == "pm25").expect("pm25");
        assert_eq!(
            pm25.details,
            Some(PollutantDetails {
                sources: Some("Traffic".into()),
                effects: Some("Asthma".into()),
            })
        );
    }

    #[test]
    fn index_sensors_name_falls_back_to_upper_code_and_skip_blank_codes() {
        let sensors = index_sensors(&conditions(), true);
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[0].name, "Universal AQI");
        assert_eq!(
            sensors[0].details.as_ref().and_then(|d| d.category.as_deref()),
            Some("Good air quality")
        );
        assert_eq!(sensors[1].name, "USA_EPA");
        assert_eq!(sensors[1].value, Some(51));

        let plain = index_sensors(&conditions(), false);
        assert!(plain.iter().all(|s| s.details.is_none()));
    }

    #[test]
    fn forecast_sensor_reports_first_hour() {
        let forecast = Forecast {
            points: vec![
                ForecastPoint {
                    timestamp: "2024-01-01T11:00:00Z".into(),
                    aqi_value: Some(40),
                    dominant_pollutant: Some("o3".into()),
                },
                ForecastPoint {
                    timestamp: "2024-01-01T12:00:00Z".into(),
                    aqi_value: Some(45),
                    dominant_pollutant: None,
                },
            ],
            fetched_at: None,
        };
        let sensor = forecast_sensor(&forecast);
        assert_eq!(sensor.value, Some(40));
        assert_eq!(sensor.forecast.len(), 2);

        assert_eq!(forecast_sensor(&Forecast::default()).value, None);
    }
}
