use thiserror::Error;

/// Failures of the weather path (snapshot, forecast, provider calls).
///
/// The narrative path never surfaces these to callers; see [`crate::narrative::Narrator`].
#[derive(Debug, Error)]
pub enum WeatherError {
    /// A field the snapshot or forecast needs is absent from the provider response.
    #[error("Provider response is missing required field `{0}`")]
    MissingField(String),

    /// The provider answered, but its status code reports a failure (e.g. unknown city).
    #[error("Provider reported status {code}: {message}")]
    Provider { code: String, message: String },

    /// Transport failure or timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// The forecast response contained no entries.
    #[error("Forecast response contained no entries")]
    EmptyForecast,

    /// The response body could not be decoded.
    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    /// The request itself is unusable (e.g. a blank city name).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl WeatherError {
    pub fn missing(path: &str) -> Self {
        Self::MissingField(path.to_string())
    }

    /// True when the provider reported "not found" (404) for the requested location.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Provider { code, .. } if code == "404")
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
