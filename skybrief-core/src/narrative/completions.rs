use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::{DEFAULT_COMPLETION_MODEL, DEFAULT_OPENAI_URL, ProviderConfig},
    error::WeatherError,
};

use super::TextGenerator;

/// Client for an OpenAI-style `/completions` endpoint.
#[derive(Clone)]
pub struct CompletionsClient {
    api_key: String,
    base_url: String,
    model: String,
    http: Client,
}

impl std::fmt::Debug for CompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionsClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl CompletionsClient {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, WeatherError> {
        Self::with_settings(
            cfg.api_key.clone(),
            cfg.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_URL),
            cfg.model.as_deref().unwrap_or(DEFAULT_COMPLETION_MODEL),
            cfg.timeout(),
        )
    }

    pub fn with_settings(
        api_key: String,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            http,
        })
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[async_trait]
impl TextGenerator for CompletionsClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, WeatherError> {
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens,
        };

        let res = self
            .http
            .post(format!("{}/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(WeatherError::Provider {
                code: status.as_u16().to_string(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: CompletionResponse = res.json().await?;
        debug!(choices = parsed.choices.len(), "Completion received");

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .ok_or_else(|| WeatherError::Parse("completion response had no choices".into()))
    }
}
