use crate::{
    Config,
    geo::Coordinates,
    model::{Provenance, Sourced},
    weather::{open_meteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
    weekend::{PARK_TIMEZONE, WeekendWindow},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug};
use tracing::{info, warn};

pub mod mock;
pub mod open_meteo;
pub mod openweather;

pub const PARK_LOCATION_NAME: &str = "Central Park, NYC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "open-meteo",
        }
    }

    /// Human-facing name, used as the `source` in weather metadata.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OpenWeatherMap",
            ProviderId::OpenMeteo => "Open-Meteo",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" | "openweathermap" => Ok(ProviderId::OpenWeather),
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, open-meteo."
            )),
        }
    }
}

/// One day of the weekend forecast. Temperatures are °F, percentages 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub min_temp: f64,
    pub max_temp: f64,
    pub precipitation_probability: u8,
    /// WMO weather interpretation code.
    pub weather_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<u8>,
}

impl DailyForecast {
    pub fn condition(&self) -> &'static str {
        describe_weather_code(self.weather_code)
    }
}

/// Both weekend days.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekendForecast {
    pub saturday: DailyForecast,
    pub sunday: DailyForecast,
}

/// What a provider returns. A day beyond the provider's horizon is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProviderForecast {
    pub saturday: Option<DailyForecast>,
    pub sunday: Option<DailyForecast>,
}

impl ProviderForecast {
    /// Fill uncovered days from the seasonal mock. Returns the completed
    /// forecast and, when anything was filled, a note naming the days.
    /// `None` when neither day is covered.
    pub fn complete(self, window: &WeekendWindow) -> Option<(WeekendForecast, Option<String>)> {
        if self.saturday.is_none() && self.sunday.is_none() {
            return None;
        }

        let estimate = mock::mock_forecast(window);
        let mut filled = Vec::new();
        let mut pick = |live: Option<DailyForecast>, fallback: DailyForecast, label: &str| {
            live.unwrap_or_else(|| {
                filled.push(format!("{label} {}", fallback.date));
                fallback
            })
        };

        let saturday = pick(self.saturday, estimate.saturday, "Saturday");
        let sunday = pick(self.sunday, estimate.sunday, "Sunday");
        let note = (!filled.is_empty()).then(|| {
            format!(
                "{} beyond the forecast horizon; seasonal estimate used",
                filled.join(" and ")
            )
        });

        Some((WeekendForecast { saturday, sunday }, note))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherMetadata {
    pub location: String,
    pub coordinates: Coordinates,
    pub forecast_period: WeekendWindow,
    pub source: String,
    pub provenance: Provenance,
    /// Why mock data was served, or which live days were estimated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Saturday and Sunday, in that order, plus where the numbers came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub days: [DailyForecast; 2],
    pub metadata: WeatherMetadata,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn weekend_forecast(
        &self,
        at: Coordinates,
        window: &WeekendWindow,
    ) -> anyhow::Result<ProviderForecast>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let base_url = config.provider_base_url(id).map(str::to_owned);

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for provider '{id}'.\n\
                     Hint: set OPENWEATHER_API_KEY or run `parkchat configure {id}`."
                )
            })?;
            Box::new(OpenWeatherProvider::new(api_key.to_owned(), base_url, PARK_TIMEZONE))
        }
        ProviderId::OpenMeteo => Box::new(OpenMeteoProvider::new(base_url, PARK_TIMEZONE)),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// Weekend weather for the park, falling back to synthetic data whenever the
/// configured provider is missing or fails.
#[derive(Debug)]
pub struct WeatherService {
    provider: Result<Box<dyn WeatherProvider>, String>,
    default_location: Coordinates,
    tz: Tz,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>, default_location: Coordinates) -> Self {
        Self {
            provider: Ok(provider),
            default_location,
            tz: PARK_TIMEZONE,
        }
    }

    /// A service that always serves mock data, explaining why.
    pub fn unavailable(reason: impl Into<String>, default_location: Coordinates) -> Self {
        Self {
            provider: Err(reason.into()),
            default_location,
            tz: PARK_TIMEZONE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        match default_provider_from_config(config) {
            Ok(provider) => Self::new(provider, config.default_location()),
            Err(err) => {
                warn!(error = %err, "weather provider unavailable; mock weather will be served");
                let reason = match config.default_provider_id() {
                    Ok(id) if !config.is_provider_configured(id) => {
                        format!("{} API key not configured", id.display_name())
                    }
                    _ => format!("{err:#}"),
                };
                Self::unavailable(reason, config.default_location())
            }
        }
    }

    pub fn default_location(&self) -> Coordinates {
        self.default_location
    }

    pub async fn weekend_weather(&self, at: Option<Coordinates>) -> Sourced<WeatherSummary> {
        self.weekend_weather_in(at, WeekendWindow::current(self.tz)).await
    }

    pub async fn weekend_weather_in(
        &self,
        at: Option<Coordinates>,
        window: WeekendWindow,
    ) -> Sourced<WeatherSummary> {
        let at = at.unwrap_or(self.default_location);

        let live = match &self.provider {
            Err(reason) => Err(reason.clone()),
            Ok(provider) => Self::fetch_live(provider.as_ref(), at, &window).await,
        };

        match live {
            Ok((forecast, source, note)) => {
                Sourced::Live(summarize(forecast, at, window, source, Provenance::Live, note))
            }
            Err(reason) => {
                let summary = summarize(
                    mock::mock_forecast(&window),
                    at,
                    window,
                    mock::MOCK_SOURCE,
                    Provenance::Fallback,
                    Some(reason.clone()),
                );
                Sourced::fallback(summary, reason)
            }
        }
    }

    /// Live forecast with any uncovered day filled in, or the reason it
    /// could not be used at all.
    async fn fetch_live(
        provider: &dyn WeatherProvider,
        at: Coordinates,
        window: &WeekendWindow,
    ) -> Result<(WeekendForecast, &'static str, Option<String>), String> {
        let source = provider.id().display_name();

        let partial = provider.weekend_forecast(at, window).await.map_err(|err| {
            warn!(
                provider = %provider.id(),
                error = %format!("{err:#}"),
                "weather fetch failed; using mock weather"
            );
            format!("{err:#}")
        })?;

        let Some((forecast, note)) = partial.complete(window) else {
            warn!(provider = %provider.id(), %window, "forecast does not reach the weekend; using mock weather");
            return Err(format!("{source} forecast does not cover {window}"));
        };

        match &note {
            Some(note) => info!(provider = %provider.id(), %window, note, "weather forecast fetched with gaps"),
            None => info!(provider = %provider.id(), %window, "weather forecast fetched"),
        }
        Ok((forecast, source, note))
    }
}

fn summarize(
    forecast: WeekendForecast,
    at: Coordinates,
    window: WeekendWindow,
    source: &str,
    provenance: Provenance,
    fallback_reason: Option<String>,
) -> WeatherSummary {
    WeatherSummary {
        days: [forecast.saturday, forecast.sunday],
        metadata: WeatherMetadata {
            location: PARK_LOCATION_NAME.to_string(),
            coordinates: at,
            forecast_period: window,
            source: source.to_string(),
            provenance,
            fallback_reason,
            timestamp: Utc::now(),
        },
    }
}

/// Upstream error bodies are cut to 200 bytes before landing in messages.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

/// Short description of a WMO weather interpretation code.
pub fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 | 48 => "fog",
        51..=57 => "drizzle",
        61..=67 => "rain",
        71..=77 => "snow",
        80..=82 => "rain showers",
        85 | 86 => "snow showers",
        95..=99 => "thunderstorms",
        _ => "unknown conditions",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::Days;

    #[derive(Debug)]
    struct FixedProvider(Option<ProviderForecast>);

    #[async_trait]
    impl WeatherProvider for FixedProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenMeteo
        }

        async fn weekend_forecast(
            &self,
            _at: Coordinates,
            _window: &WeekendWindow,
        ) -> anyhow::Result<ProviderForecast> {
            self.0
                .clone()
                .ok_or_else(|| anyhow::anyhow!("upstream returned 503"))
        }
    }

    fn window() -> WeekendWindow {
        WeekendWindow::upcoming(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap())
    }

    fn day(date: NaiveDate, min: f64, max: f64) -> DailyForecast {
        DailyForecast {
            date,
            min_temp: min,
            max_temp: max,
            precipitation_probability: 10,
            weather_code: 2,
            humidity: None,
        }
    }

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let parsed = ProviderId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn open_meteo_needs_no_key() {
        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::OpenMeteo);
        let provider = default_provider_from_config(&cfg).expect("keyless provider");
        assert_eq!(provider.id(), ProviderId::OpenMeteo);
    }

    #[tokio::test]
    async fn missing_key_serves_mock_with_reason() {
        let service = WeatherService::from_config(&Config::default());
        let sourced = service.weekend_weather_in(None, window()).await;

        assert_eq!(sourced.provenance(), Provenance::Fallback);
        assert_eq!(
            sourced.fallback_reason(),
            Some("OpenWeatherMap API key not configured")
        );

        let summary = sourced.data();
        assert_eq!(summary.metadata.provenance, Provenance::Fallback);
        assert_eq!(summary.metadata.source, mock::MOCK_SOURCE);
        assert_eq!(summary.days.len(), 2);
        for d in &summary.days {
            assert!(d.min_temp <= d.max_temp);
        }
    }

    #[tokio::test]
    async fn unknown_default_provider_is_reported_as_is() {
        let cfg = Config {
            default_provider: Some("weatherapi".into()),
            ..Config::default()
        };
        let sourced = WeatherService::from_config(&cfg)
            .weekend_weather_in(None, window())
            .await;

        let reason = sourced.fallback_reason().unwrap();
        assert!(reason.starts_with("Unknown provider 'weatherapi'"), "{reason}");
    }

    #[tokio::test]
    async fn provider_error_serves_mock_with_reason() {
        let service = WeatherService::new(Box::new(FixedProvider(None)), Coordinates::new(1.0, 2.0));
        let sourced = service.weekend_weather_in(None, window()).await;

        assert_eq!(sourced.fallback_reason(), Some("upstream returned 503"));
        let summary = sourced.into_data();
        assert_eq!(summary.metadata.coordinates, Coordinates::new(1.0, 2.0));
        assert_eq!(
            summary.metadata.fallback_reason.as_deref(),
            Some("upstream returned 503")
        );
        assert_eq!(summary.days[0].date, window().start);
        assert_eq!(summary.days[1].date, window().end);
    }

    #[tokio::test]
    async fn live_forecast_is_tagged_live() {
        let w = window();
        let forecast = WeekendForecast {
            saturday: day(w.start, 50.0, 61.0),
            sunday: day(w.start + Days::new(1), 48.0, 59.0),
        };
        let service = WeatherService::new(
            Box::new(FixedProvider(Some(ProviderForecast {
                saturday: Some(forecast.saturday.clone()),
                sunday: Some(forecast.sunday.clone()),
            }))),
            Coordinates::new(1.0, 2.0),
        );

        let at = Coordinates::new(40.0, -73.0);
        let sourced = service.weekend_weather_in(Some(at), w).await;

        assert_eq!(sourced.provenance(), Provenance::Live);
        let summary = sourced.into_data();
        assert_eq!(summary.metadata.source, "Open-Meteo");
        assert_eq!(summary.metadata.provenance, Provenance::Live);
        assert_eq!(summary.metadata.coordinates, at);
        assert_eq!(summary.metadata.fallback_reason, None);
        assert_eq!(summary.days, [forecast.saturday, forecast.sunday]);
    }

    #[tokio::test]
    async fn uncovered_sunday_keeps_live_saturday() {
        let w = window();
        let saturday = day(w.start, 50.0, 61.0);
        let service = WeatherService::new(
            Box::new(FixedProvider(Some(ProviderForecast {
                saturday: Some(saturday.clone()),
                sunday: None,
            }))),
            Coordinates::new(1.0, 2.0),
        );

        let sourced = service.weekend_weather_in(None, w).await;

        assert_eq!(sourced.provenance(), Provenance::Live);
        let summary = sourced.into_data();
        assert_eq!(summary.metadata.provenance, Provenance::Live);
        assert_eq!(summary.metadata.source, "Open-Meteo");
        assert_eq!(summary.days[0], saturday);
        assert_eq!(summary.days[1], mock::mock_forecast(&w).sunday);
        assert_eq!(
            summary.metadata.fallback_reason.as_deref(),
            Some("Sunday 2026-10-25 beyond the forecast horizon; seasonal estimate used")
        );
    }

    #[tokio::test]
    async fn forecast_missing_both_days_serves_mock() {
        let service = WeatherService::new(
            Box::new(FixedProvider(Some(ProviderForecast::default()))),
            Coordinates::new(1.0, 2.0),
        );

        let sourced = service.weekend_weather_in(None, window()).await;

        assert_eq!(sourced.provenance(), Provenance::Fallback);
        assert_eq!(
            sourced.fallback_reason(),
            Some("Open-Meteo forecast does not cover 2026-10-24 .. 2026-10-25")
        );
        assert_eq!(sourced.data().metadata.source, mock::MOCK_SOURCE);
    }

    #[test]
    fn complete_names_every_estimated_day() {
        let w = window();
        let partial = ProviderForecast {
            saturday: None,
            sunday: Some(day(w.end, 40.0, 45.0)),
        };

        let (forecast, note) = partial.complete(&w).unwrap();

        assert_eq!(forecast.saturday, mock::mock_forecast(&w).saturday);
        assert_eq!(forecast.sunday.max_temp, 45.0);
        assert!(note.unwrap().starts_with("Saturday 2026-10-24 beyond"));
        assert!(ProviderForecast::default().complete(&w).is_none());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }

    #[test]
    fn weather_codes_describe_conditions() {
        assert_eq!(describe_weather_code(0), "clear sky");
        assert_eq!(describe_weather_code(63), "rain");
        assert_eq!(describe_weather_code(96), "thunderstorms");
        assert_eq!(describe_weather_code(1000), "unknown conditions");
    }

    #[test]
    fn summary_serializes_camel_case() {
        let w = window();
        let summary = summarize(
            WeekendForecast {
                saturday: day(w.start, 50.0, 61.0),
                sunday: day(w.end, 48.0, 59.0),
            },
            Coordinates::new(40.0, -73.0),
            w,
            "Open-Meteo",
            Provenance::Live,
            None,
        );
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["days"][0]["minTemp"], 50.0);
        assert_eq!(json["days"][1]["precipitationProbability"], 10);
        assert_eq!(json["metadata"]["forecastPeriod"]["start"], "2026-10-24");
        assert_eq!(json["metadata"]["provenance"], "live");
        assert!(json["metadata"].get("fallbackReason").is_none());
    }
}
