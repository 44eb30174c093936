use serde::{Serialize, Serializer};
use tracing::{info, instrument, warn};

use crate::{
    Config, DailyForecast, WeatherError, WeatherSnapshot,
    forecast::{DayBoundary, aggregate_with},
    narrative::{Narrative, Narrator},
    provider::{WeatherProvider, provider_from_config},
    snapshot::build_snapshot,
};

/// Everything rendered for one city lookup.
///
/// Only the snapshot is mandatory; a failed forecast is kept as an error so the
/// rest of the report can still be shown.
#[derive(Debug, Serialize)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub narrative: Option<Narrative>,
    #[serde(serialize_with = "serialize_forecast")]
    pub forecast: Result<Vec<DailyForecast>, WeatherError>,
}

fn serialize_forecast<S: Serializer>(
    forecast: &Result<Vec<DailyForecast>, WeatherError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "lowercase")]
    enum Section<'a> {
        Days(&'a [DailyForecast]),
        Error(String),
    }

    match forecast {
        Ok(days) => Section::Days(days).serialize(serializer),
        Err(err) => Section::Error(err.to_string()).serialize(serializer),
    }
}

/// Runs one lookup: current weather, then narrative, then forecast, in that order.
#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
    narrator: Option<Narrator>,
    day_boundary: DayBoundary,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>, narrator: Narrator) -> Self {
        Self {
            provider,
            narrator: Some(narrator),
            day_boundary: DayBoundary::default(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let narrator = Narrator::from_config(config)?;
        Ok(Self::new(provider, narrator).with_day_boundary(config.forecast.day_boundary))
    }

    pub fn with_day_boundary(mut self, day_boundary: DayBoundary) -> Self {
        self.day_boundary = day_boundary;
        self
    }

    /// Skip the narrative section entirely.
    pub fn without_narrative(mut self) -> Self {
        self.narrator = None;
        self
    }

    #[instrument(skip(self))]
    pub async fn report(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::InvalidInput("city name is empty".into()));
        }

        let raw = self.provider.current(city).await?;
        let snapshot = build_snapshot(&raw, city)?;
        info!(
            condition = %snapshot.condition,
            temperature_c = snapshot.temperature_c,
            "Current weather fetched"
        );

        let narrative = match &self.narrator {
            Some(narrator) => Some(narrator.describe(&snapshot).await),
            None => None,
        };

        let forecast = self.forecast_for(&snapshot).await;
        match &forecast {
            Ok(days) => info!(days = days.len(), boundary = %self.day_boundary, "Forecast aggregated"),
            Err(err) => warn!(error = %err, "Forecast unavailable"),
        }

        Ok(WeatherReport {
            snapshot,
            narrative,
            forecast,
        })
    }

    async fn forecast_for(
        &self,
        snapshot: &WeatherSnapshot,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        let raw = self.provider.forecast(snapshot.lat, snapshot.lon).await?;
        aggregate_with(&raw, self.day_boundary)
    }
}
