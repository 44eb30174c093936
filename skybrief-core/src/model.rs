use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WeatherError;

/// Current weather response as returned by the provider.
///
/// Every consumed field is optional: an error payload for an unknown city
/// carries only `cod` and `message`, so absence must be detected explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWeatherResponse {
    /// Status code; the provider sends it as a number or a string.
    pub cod: Option<Value>,
    pub message: Option<Value>,
    pub name: Option<String>,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub wind: Option<RawWind>,
    pub coord: Option<RawCoord>,
    pub visibility: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCondition {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWind {
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCoord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Multi-point forecast response (3-hour steps over roughly five days).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawForecastResponse {
    pub cod: Option<Value>,
    pub message: Option<Value>,
    #[serde(default)]
    pub list: Vec<RawForecastEntry>,
    pub city: Option<RawForecastCity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawForecastEntry {
    /// Unix seconds.
    pub dt: Option<i64>,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawForecastCity {
    pub name: Option<String>,
    /// Offset from UTC in seconds.
    pub timezone: Option<i32>,
}

/// Normalized current conditions for one city. Temperatures are in Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_ms: f64,
    pub visibility_m: Option<u32>,
    pub condition: String,
    pub lat: f64,
    pub lon: f64,
}

/// One calendar day of the aggregated forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub avg_temp_c: f64,
    pub dominant_condition: String,
}

/// Normalize a status field to its string form so `404` and `"404"` compare equal.
pub fn status_code(cod: Option<&Value>) -> Option<String> {
    match cod? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            // 404.0 and 404 are the same code.
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        }),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Fail with [`WeatherError::Provider`] unless the status is absent or `200`.
pub fn check_status(cod: Option<&Value>, message: Option<&Value>) -> Result<(), WeatherError> {
    let Some(code) = status_code(cod) else {
        return Ok(());
    };

    if code == "200" {
        return Ok(());
    }

    let message = match message {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "no message from provider".to_string(),
        Some(other) => other.to_string(),
    };

    Err(WeatherError::Provider { code, message })
}

impl RawWeatherResponse {
    pub fn check_status(&self) -> Result<(), WeatherError> {
        check_status(self.cod.as_ref(), self.message.as_ref())
    }
}

impl RawForecastResponse {
    pub fn check_status(&self) -> Result<(), WeatherError> {
        check_status(self.cod.as_ref(), self.message.as_ref())
    }
}
