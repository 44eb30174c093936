use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::{DEFAULT_OPENWEATHER_URL, ProviderConfig},
    error::WeatherError,
    model::{RawForecastResponse, RawWeatherResponse, status_code},
};

use super::WeatherProvider;

/// OpenWeather "2.5" API client. Requests omit `units`, so temperatures
/// come back in Kelvin.
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenWeatherProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, WeatherError> {
        Self::with_settings(
            cfg.api_key.clone(),
            cfg.base_url.as_deref().unwrap_or(DEFAULT_OPENWEATHER_URL),
            cfg.timeout(),
        )
    }

    pub fn with_settings(
        api_key: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        debug!(%status, bytes = body.len(), "OpenWeather {endpoint} response");

        // Error payloads ("city not found") arrive as JSON with a non-2xx status;
        // those are passed through so the status check sees the provider's `cod`.
        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(WeatherError::Provider {
                    code: status.as_u16().to_string(),
                    message: truncate_body(&body),
                });
            }
            Err(err) => return Err(err.into()),
        };

        if !status.is_success() && status_code(value.get("cod")).is_none() {
            return Err(WeatherError::Provider {
                code: status.as_u16().to_string(),
                message: truncate_body(&body),
            });
        }

        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn current(&self, city: &str) -> Result<RawWeatherResponse, WeatherError> {
        self.get_json("weather", &[("q", city.to_string())]).await
    }

    #[instrument(skip(self))]
    async fn forecast(&self, lat: f64, lon: f64) -> Result<RawForecastResponse, WeatherError> {
        self.get_json("forecast", &[("lat", lat.to_string()), ("lon", lon.to_string())])
            .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
