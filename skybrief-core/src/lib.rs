//! Core library for the `skybrief` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over the weather provider and the text generator
//! - Snapshot building, forecast aggregation and narrative fallback
//!
//! It is used by `skybrief-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod narrative;
pub mod provider;
pub mod service;
pub mod snapshot;
pub mod units;

pub use config::{Config, ForecastConfig, ProviderConfig};
pub use error::WeatherError;
pub use forecast::{DayBoundary, MAX_FORECAST_DAYS, aggregate, aggregate_with};
pub use model::{
    DailyForecast, RawForecastResponse, RawWeatherResponse, WeatherSnapshot,
};
pub use narrative::{Narrative, NarrativeSource, Narrator, TextGenerator};
pub use provider::{ProviderId, WeatherProvider};
pub use service::{WeatherReport, WeatherService};
pub use snapshot::build_snapshot;
pub use units::kelvin_to_celsius;
