//! Human-readable weather blurb.
//!
//! The narrative is supplementary: [`Narrator::describe`] never fails and
//! substitutes a templated sentence whenever text generation does not
//! produce usable output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};
use tracing::{debug, warn};

use crate::{
    Config, WeatherError, WeatherSnapshot,
    config::{DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECS},
    provider::ProviderId,
};

pub mod completions;

pub use completions::CompletionsClient;

/// A text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, WeatherError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

impl Narrative {
    pub fn fallback(snapshot: &WeatherSnapshot) -> Self {
        Self {
            text: fallback_text(snapshot),
            source: NarrativeSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == NarrativeSource::Fallback
    }
}

/// Prompt sent to the text generator.
pub fn prompt_for(snapshot: &WeatherSnapshot) -> String {
    format!(
        "The current weather in {} is {} with a temperature of {:.1}°C, \
         humidity of {}% and wind speed of {} m/s. Explain this in simple words.",
        snapshot.city,
        snapshot.condition,
        snapshot.temperature_c,
        snapshot.humidity_pct,
        snapshot.wind_speed_ms,
    )
}

pub fn fallback_text(snapshot: &WeatherSnapshot) -> String {
    format!(
        "The weather in {} is {} with a temperature of {:.1}°C.",
        snapshot.city, snapshot.condition, snapshot.temperature_c
    )
}

#[derive(Debug)]
pub struct Narrator {
    generator: Option<Box<dyn TextGenerator>>,
    max_tokens: u32,
    timeout: Duration,
}

impl Narrator {
    pub fn new(generator: Box<dyn TextGenerator>, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            generator: Some(generator),
            max_tokens,
            timeout,
        }
    }

    /// A narrator that always uses the templated text.
    pub fn fallback_only() -> Self {
        Self {
            generator: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Uses the `openai` provider when it has a key, otherwise falls back to templates.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let id = ProviderId::OpenAi;
        let Some(cfg) = config
            .provider_config(id)
            .filter(|_| config.is_provider_configured(id))
        else {
            debug!("No text-generation key configured; narratives use the template");
            return Ok(Self::fallback_only());
        };

        let client = CompletionsClient::from_config(cfg)?;
        Ok(Self::new(
            Box::new(client),
            cfg.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            cfg.timeout(),
        ))
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Describe the snapshot in plain words. Single attempt; any failure
    /// yields [`Narrative::fallback`].
    pub async fn describe(&self, snapshot: &WeatherSnapshot) -> Narrative {
        let Some(generator) = &self.generator else {
            return Narrative::fallback(snapshot);
        };

        let prompt = prompt_for(snapshot);
        let attempt = tokio::time::timeout(
            self.timeout,
            generator.generate(&prompt, self.max_tokens),
        )
        .await;

        match attempt {
            Ok(Ok(text)) if !text.trim().is_empty() => Narrative {
                text: text.trim().to_string(),
                source: NarrativeSource::Generated,
            },
            Ok(Ok(_)) => {
                warn!("Text generator returned an empty completion; using fallback");
                Narrative::fallback(snapshot)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "Text generation failed; using fallback");
                Narrative::fallback(snapshot)
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Text generation timed out; using fallback");
                Narrative::fallback(snapshot)
            }
        }
    }
}
