use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::WeatherError,
    model::{DailyForecast, RawForecastEntry, RawForecastResponse},
    units::kelvin_to_celsius,
};

/// Number of calendar days kept from a forecast ("5-day forecast").
pub const MAX_FORECAST_DAYS: usize = 5;

/// Which clock decides where one forecast day ends and the next begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// Midnight UTC.
    #[default]
    Utc,
    /// Midnight at the forecast location, using the offset the provider reports
    /// in `city.timezone`. Falls back to UTC when the offset is absent.
    Location,
}

impl DayBoundary {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayBoundary::Utc => "utc",
            DayBoundary::Location => "location",
        }
    }

    fn offset_for(&self, raw: &RawForecastResponse) -> FixedOffset {
        let utc = Utc.fix();
        match self {
            DayBoundary::Utc => utc,
            DayBoundary::Location => raw
                .city
                .as_ref()
                .and_then(|c| c.timezone)
                .and_then(FixedOffset::east_opt)
                .unwrap_or(utc),
        }
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayBoundary {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utc" => Ok(DayBoundary::Utc),
            "location" | "local" => Ok(DayBoundary::Location),
            _ => Err(WeatherError::Configuration(format!(
                "Unknown day boundary '{s}'. Supported values: utc, location."
            ))),
        }
    }
}

/// Group forecast entries into at most [`MAX_FORECAST_DAYS`] UTC calendar days.
pub fn aggregate(raw: &RawForecastResponse) -> Result<Vec<DailyForecast>, WeatherError> {
    aggregate_with(raw, DayBoundary::Utc)
}

/// Group forecast entries by calendar day under the given day boundary.
///
/// Days appear in the order they are first seen. Each day reports min, max
/// and mean temperature, and the most frequent condition (ties go to the
/// condition seen first).
pub fn aggregate_with(
    raw: &RawForecastResponse,
    boundary: DayBoundary,
) -> Result<Vec<DailyForecast>, WeatherError> {
    raw.check_status()?;

    if raw.list.is_empty() {
        return Err(WeatherError::EmptyForecast);
    }

    let offset = boundary.offset_for(raw);
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for (i, entry) in raw.list.iter().enumerate() {
        let reading = Reading::from_entry(i, entry, offset)?;

        let slot = *index.entry(reading.date).or_insert_with(|| {
            buckets.push(Bucket::new(reading.date));
            buckets.len() - 1
        });
        buckets[slot].push(reading);
    }

    Ok(buckets
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(Bucket::finish)
        .collect())
}

struct Reading<'a> {
    date: NaiveDate,
    temp_c: f64,
    /// `main.temp_min`, or `main.temp` when the entry has none.
    min_c: f64,
    /// `main.temp_max`, or `main.temp` when the entry has none.
    max_c: f64,
    condition: &'a str,
}

impl<'a> Reading<'a> {
    fn from_entry(
        i: usize,
        entry: &'a RawForecastEntry,
        offset: FixedOffset,
    ) -> Result<Self, WeatherError> {
        let dt = entry
            .dt
            .ok_or_else(|| WeatherError::MissingField(format!("list[{i}].dt")))?;
        let date = DateTime::from_timestamp(dt, 0)
            .ok_or_else(|| WeatherError::Parse(format!("list[{i}].dt is out of range: {dt}")))?
            .with_timezone(&offset)
            .date_naive();

        let main = entry.main.as_ref();
        let temp = main
            .and_then(|m| m.temp)
            .ok_or_else(|| WeatherError::MissingField(format!("list[{i}].main.temp")))?;
        let temp_min = main.and_then(|m| m.temp_min).unwrap_or(temp);
        let temp_max = main.and_then(|m| m.temp_max).unwrap_or(temp);

        let condition = entry
            .weather
            .first()
            .and_then(|w| w.description.as_deref())
            .ok_or_else(|| {
                WeatherError::MissingField(format!("list[{i}].weather[0].description"))
            })?;

        Ok(Self {
            date,
            temp_c: kelvin_to_celsius(temp),
            min_c: kelvin_to_celsius(temp_min),
            max_c: kelvin_to_celsius(temp_max),
            condition,
        })
    }
}

struct Bucket<'a> {
    date: NaiveDate,
    temps: Vec<f64>,
    min: f64,
    max: f64,
    /// Condition tallies in first-seen order.
    tallies: Vec<(&'a str, usize)>,
}

impl<'a> Bucket<'a> {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            temps: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            tallies: Vec::new(),
        }
    }

    fn push(&mut self, reading: Reading<'a>) {
        self.temps.push(reading.temp_c);
        self.min = self.min.min(reading.min_c);
        self.max = self.max.max(reading.max_c);
        match self.tallies.iter_mut().find(|(c, _)| *c == reading.condition) {
            Some((_, count)) => *count += 1,
            None => self.tallies.push((reading.condition, 1)),
        }
    }

    fn finish(self) -> DailyForecast {
        let avg = self.temps.iter().sum::<f64>() / self.temps.len() as f64;

        // Strictly-greater keeps the earliest condition on ties.
        let mut dominant = ("", 0);
        for &(condition, count) in &self.tallies {
            if count > dominant.1 {
                dominant = (condition, count);
            }
        }

        DailyForecast {
            date: self.date,
            min_temp_c: self.min,
            max_temp_c: self.max,
            avg_temp_c: avg,
            dominant_condition: dominant.0.to_string(),
        }
    }
}
