pub mod config;
pub mod current;
pub mod error;
pub mod feed;
pub mod forecast;
pub mod models;
pub mod monitor;
pub mod normalize;
pub mod poller;
pub mod sensors;

pub use config::{Endpoints, FeedConfig, MonitorConfig};
pub use current::CurrentConditionsFeed;
pub use error::{ConfigError, FetchError, PollError};
pub use feed::{FeedKind, FeedStatus};
pub use forecast::{ForecastFeed, ForecastRefresh, ForecastWindow};
pub use models::{
    Coordinates, CurrentConditions, Forecast, ForecastPoint, IndexScore, PollutantReading,
};
pub use monitor::{AirQualityMonitor, TickOutcome};
pub use poller::{poll_once, spawn_poller, Event, PollConfig, PollerHandle};
pub use sensors::{ForecastSensor, IndexSensor, PollutantSensor};
