use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{
    geo::{CENTRAL_PARK_CENTROID, Coordinates},
    weather::ProviderId,
};

pub const DEFAULT_MODEL_ID: &str = "gemini-2.0-flash";

/// Configuration for a single weather provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider's public endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Language model credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// NYC Open Data (Socrata) access.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenDataConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration, built once at startup and handed to each
/// component.
///
/// Example TOML:
/// ```toml
/// default_provider = "openweather"
///
/// [providers.openweather]
/// api_key = "..."
///
/// [llm]
/// api_key = "..."
/// model = "gemini-2.0-flash"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Weather provider id, e.g. "openweather" or "open-meteo".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub open_data: OpenDataConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location: Option<Coordinates>,
}

impl Config {
    /// Config file (if any) with environment variables layered on top.
    pub fn from_environment() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Weather provider to use; OpenWeather unless configured otherwise.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::OpenWeather),
        }
    }

    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Set/replace a provider API key and make it the default if none is set.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .or_default()
            .api_key = Some(api_key);

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.api_key.as_deref())
            .filter(|key| !key.is_empty())
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.base_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }

    pub fn llm_api_key(&self) -> Option<&str> {
        self.llm.api_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn model_id(&self) -> &str {
        self.llm
            .model
            .as_deref()
            .filter(|model| !model.is_empty())
            .unwrap_or(DEFAULT_MODEL_ID)
    }

    pub fn open_data_app_token(&self) -> Option<&str> {
        self.open_data.app_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Coordinates used when a request does not name its own.
    pub fn default_location(&self) -> Coordinates {
        self.default_location.unwrap_or(CENTRAL_PARK_CENTROID)
    }

    /// Overlay process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Overlay variables from `lookup`; blank values are ignored.
    ///
    /// Recognised: `GEMINI_API_KEY`, `MODEL_ID`, `GEMINI_BASE_URL`,
    /// `WEATHER_PROVIDER`, `OPENWEATHER_API_KEY`, `OPENWEATHER_BASE`,
    /// `OPEN_METEO_BASE`, `NYC_OPEN_DATA_APP_TOKEN`, `NYC_OPEN_DATA_BASE`,
    /// `DEFAULT_LAT`, `DEFAULT_LON`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = var("GEMINI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = var("MODEL_ID") {
            self.llm.model = Some(model);
        }
        if let Some(url) = var("GEMINI_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(provider) = var("WEATHER_PROVIDER") {
            self.default_provider = Some(provider);
        }
        if let Some(key) = var("OPENWEATHER_API_KEY") {
            self.provider_entry(ProviderId::OpenWeather).api_key = Some(key);
        }
        if let Some(url) = var("OPENWEATHER_BASE") {
            self.provider_entry(ProviderId::OpenWeather).base_url = Some(url);
        }
        if let Some(url) = var("OPEN_METEO_BASE") {
            self.provider_entry(ProviderId::OpenMeteo).base_url = Some(url);
        }
        if let Some(token) = var("NYC_OPEN_DATA_APP_TOKEN") {
            self.open_data.app_token = Some(token);
        }
        if let Some(url) = var("NYC_OPEN_DATA_BASE") {
            self.open_data.base_url = Some(url);
        }

        let lat = var("DEFAULT_LAT").and_then(|v| v.parse::<f64>().ok());
        let lng = var("DEFAULT_LON").and_then(|v| v.parse::<f64>().ok());
        if lat.is_some() || lng.is_some() {
            let base = self.default_location();
            self.default_location = Some(Coordinates::new(
                lat.unwrap_or(base.lat),
                lng.unwrap_or(base.lng),
            ));
        }
    }

    fn provider_entry(&mut self, id: ProviderId) -> &mut ProviderConfig {
        self.providers.entry(id.as_str().to_string()).or_default()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "parkchat", "parkchat")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
