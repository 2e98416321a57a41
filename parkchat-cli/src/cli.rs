use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use parkchat_core::{
    ChatOrchestrator, Config, Coordinates, EventQuery, EventsResponse, EventsService, ProviderId,
    WeatherService, api, events::NycOpenDataClient,
};
use std::net::SocketAddr;
use tracing::info;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "parkchat", version, about = "Central Park weekend assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },

    /// Ask a question about the weekend in Central Park.
    Ask {
        /// Question text; prompted for when absent.
        message: Option<String>,
    },

    /// Show the weekend forecast.
    Weather {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// List this weekend's park events.
    Events {
        /// Skip the spatial filter and match on dates only.
        #[arg(long)]
        no_locations: bool,

        /// Use sample events instead of NYC Open Data.
        #[arg(long)]
        mock: bool,
    },

    /// Configure credentials for a service.
    Configure {
        /// One of "openweather", "open-meteo", "gemini" or "nyc-open-data".
        provider: String,
    },

    /// Print the config file location.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Serve { addr } => {
                let config = Config::from_environment()?;
                api::serve(&config, addr).await?;
            }
            Command::Ask { message } => {
                let message = match message {
                    Some(message) => message,
                    None => Text::new("Ask about this weekend in Central Park:").prompt()?,
                };
                let config = Config::from_environment()?;
                let result = ChatOrchestrator::from_config(&config).chat(&message).await?;
                println!("{}", render::chat_result(&result));
            }
            Command::Weather { lat, lon } => {
                let config = Config::from_environment()?;
                let service = WeatherService::from_config(&config);
                let base = service.default_location();
                let at = Coordinates::new(lat.unwrap_or(base.lat), lon.unwrap_or(base.lng));

                let summary = service.weekend_weather(Some(at)).await.into_data();
                println!("{}", render::weather_card(&summary));
            }
            Command::Events { no_locations, mock } => {
                let config = Config::from_environment()?;
                let service = EventsService::new(Box::new(NycOpenDataClient::from_config(&config)));
                let query = EventQuery {
                    locations: !no_locations,
                    mock,
                };

                let found = service.weekend_events(query).await;
                println!("{}", render::events_block(&EventsResponse::from(found)));
            }
            Command::Configure { provider } => configure(&provider)?,
            Command::ConfigPath => println!("{}", Config::config_file_path()?.display()),
        }

        Ok(())
    }
}

/// Prompt for credentials and persist them. Only the file is read here, so
/// secrets from the environment are never written to disk.
fn configure(provider: &str) -> Result<()> {
    let mut config = Config::load()?;

    match provider.to_lowercase().as_str() {
        "gemini" => {
            config.llm.api_key = Some(secret("Gemini API key:")?);
            let model = Text::new("Model id:")
                .with_default(config.model_id())
                .prompt()?;
            config.llm.model = Some(model.trim().to_string());
        }
        "nyc-open-data" | "nycopendata" => {
            config.open_data.app_token = Some(secret("NYC Open Data app token:")?);
        }
        other => {
            let id = ProviderId::try_from(other)?;
            if id.requires_api_key() {
                let key = secret(&format!("{} API key:", id.display_name()))?;
                config.upsert_provider_api_key(id, key);
            }
            config.set_default_provider(id);
        }
    }

    config.save()?;
    info!(provider, "configuration saved");
    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn secret(message: &str) -> Result<String> {
    let value = Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    let value = value.trim();
    if value.is_empty() {
        bail!("Value must not be empty");
    }
    Ok(value.to_string())
}
