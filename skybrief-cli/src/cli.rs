use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use skybrief_core::{Config, DayBoundary, ProviderId, WeatherService};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skybrief", version, about = "Current weather, a short narrative and a 5-day forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API key for a provider.
    Configure {
        /// Provider short name: "openweather" or "openai".
        provider: String,
    },

    /// Show current weather and forecast for a city.
    Show {
        /// City name, e.g. "New York".
        city: String,

        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Skip the generated narrative.
        #[arg(long)]
        no_narrative: bool,

        /// Where forecast days start: "utc" or "location". Overrides the config file.
        #[arg(long)]
        day_boundary: Option<String>,
    },

    /// Print the location of the config file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show {
                city,
                json,
                no_narrative,
                day_boundary,
            } => show(&city, json, no_narrative, day_boundary.as_deref()).await,
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    let mut cfg = Config::load_from_disk()?;
    cfg.upsert_provider_api_key(id, api_key);
    cfg.save()?;

    println!(
        "Saved {id} API key to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn show(
    city: &str,
    json: bool,
    no_narrative: bool,
    day_boundary: Option<&str>,
) -> anyhow::Result<()> {
    let cfg = Config::load()?;

    let mut service = WeatherService::from_config(&cfg)?;
    if let Some(boundary) = day_boundary {
        service = service.with_day_boundary(boundary.parse::<DayBoundary>()?);
    }
    if no_narrative {
        service = service.without_narrative();
    }
    debug!(city, json, no_narrative, "Fetching report");

    let report = match service.report(city).await {
        Ok(report) => report,
        Err(err) if err.is_not_found() => bail!("City not found: {city}"),
        Err(err) => return Err(err).context(format!("Failed to fetch weather for {city}")),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::report(&report));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_show_flags() {
        let cli = Cli::try_parse_from([
            "skybrief",
            "show",
            "New York",
            "--json",
            "--no-narrative",
            "--day-boundary",
            "location",
        ])
        .unwrap();

        match cli.command {
            Command::Show {
                city,
                json,
                no_narrative,
                day_boundary,
            } => {
                assert_eq!(city, "New York");
                assert!(json);
                assert!(no_narrative);
                assert_eq!(day_boundary.as_deref(), Some("location"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_configure() {
        let cli = Cli::try_parse_from(["skybrief", "configure", "openai"]).unwrap();
        assert!(matches!(cli.command, Command::Configure { ref provider } if provider == "openai"));
    }

    #[test]
    fn show_requires_city() {
        assert!(Cli::try_parse_from(["skybrief", "show"]).is_err());
    }
}
