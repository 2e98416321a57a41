use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;

use crate::{geo::Coordinates, weekend::WeekendWindow};

use super::{DailyForecast, ProviderForecast, ProviderId, WeatherProvider, truncate_body};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";

/// Keyless daily forecast API; the provider aggregates per local day itself.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    tz: Tz,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: Option<String>, tz: Tz) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            tz,
            http: Client::new(),
        }
    }

    async fn fetch_daily(&self, at: Coordinates, window: &WeekendWindow) -> Result<OmResponse> {
        let url = format!("{}/forecast", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", at.lat.to_string()),
                ("longitude", at.lng.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_probability_max,weather_code"
                        .to_string(),
                ),
                ("temperature_unit", "fahrenheit".to_string()),
                ("timezone", self.tz.name().to_string()),
                ("start_date", window.saturday().to_string()),
                ("end_date", window.sunday().to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to Open-Meteo (daily forecast)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).context("Failed to parse Open-Meteo forecast JSON")
    }
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u16>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    daily: OmDaily,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn weekend_forecast(
        &self,
        at: Coordinates,
        window: &WeekendWindow,
    ) -> Result<ProviderForecast> {
        let parsed = self.fetch_daily(at, window).await?;

        Ok(ProviderForecast {
            saturday: pick_day(&parsed.daily, window.saturday()),
            sunday: pick_day(&parsed.daily, window.sunday()),
        })
    }
}

/// The requested day, or `None` when the response has no row or no
/// temperatures for it.
fn pick_day(daily: &OmDaily, date: NaiveDate) -> Option<DailyForecast> {
    let idx = daily.time.iter().position(|d| *d == date)?;

    let hi = daily.temperature_2m_max.get(idx).copied().flatten()?;
    let lo = daily.temperature_2m_min.get(idx).copied().flatten()?;

    let precip = daily
        .precipitation_probability_max
        .get(idx)
        .copied()
        .flatten()
        .unwrap_or(0.0);

    Some(DailyForecast {
        date,
        min_temp: lo.min(hi),
        max_temp: lo.max(hi),
        precipitation_probability: precip.round().clamp(0.0, 100.0) as u8,
        weather_code: daily.weather_code.get(idx).copied().flatten().unwrap_or(1),
        humidity: None,
    })
}
