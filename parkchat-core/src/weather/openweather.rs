use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{geo::Coordinates, weekend::WeekendWindow};

use super::{DailyForecast, ProviderForecast, ProviderId, WeatherProvider, truncate_body};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// 5-day / 3-hour forecast API. Samples are bucketed into the weekend days
/// by their local calendar date.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    tz: Tz,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: Option<String>, tz: Tz) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            tz,
            http: Client::new(),
        }
    }

    async fn fetch_forecast(&self, at: Coordinates) -> Result<OwForecastResponse> {
        let url = format!("{}/forecast", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lng.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "imperial".to_string()),
                ("cnt", "40".to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (5-day forecast)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).context("Failed to parse OpenWeather forecast JSON")
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u16,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    /// Probability of precipitation, 0.0 - 1.0.
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn weekend_forecast(
        &self,
        at: Coordinates,
        window: &WeekendWindow,
    ) -> Result<ProviderForecast> {
        let parsed = self.fetch_forecast(at).await?;
        debug!(samples = parsed.list.len(), "OpenWeather forecast received");

        Ok(forecast_days(&parsed.list, window, self.tz))
    }
}

/// The 5-day horizon often stops short of Sunday, so either day may be absent.
fn forecast_days(entries: &[OwForecastEntry], window: &WeekendWindow, tz: Tz) -> ProviderForecast {
    ProviderForecast {
        saturday: summarize_day(entries, window.saturday(), tz),
        sunday: summarize_day(entries, window.sunday(), tz),
    }
}

/// Collapse the 3-hour samples of one local day into min/max temperature,
/// peak precipitation chance and the most severe condition.
fn summarize_day(entries: &[OwForecastEntry], date: NaiveDate, tz: Tz) -> Option<DailyForecast> {
    let samples: Vec<&OwForecastEntry> = entries
        .iter()
        .filter(|e| local_date(e.dt, tz) == Some(date))
        .collect();

    if samples.is_empty() {
        return None;
    }

    let min_temp = samples.iter().map(|e| e.main.temp).fold(f64::INFINITY, f64::min);
    let max_temp = samples.iter().map(|e| e.main.temp).fold(f64::NEG_INFINITY, f64::max);
    let max_pop = samples.iter().map(|e| e.pop).fold(0.0, f64::max);

    let weather_code = samples
        .iter()
        .flat_map(|e| e.weather.iter())
        .map(|w| wmo_from_openweather(w.id))
        .max()
        .unwrap_or(1);

    let humidities: Vec<u32> = samples
        .iter()
        .filter_map(|e| e.main.humidity.map(u32::from))
        .collect();
    let humidity = if humidities.is_empty() {
        None
    } else {
        Some((humidities.iter().sum::<u32>() / humidities.len() as u32) as u8)
    };

    Some(DailyForecast {
        date,
        min_temp,
        max_temp,
        precipitation_probability: (max_pop * 100.0).round().clamp(0.0, 100.0) as u8,
        weather_code,
        humidity,
    })
}

fn local_date(ts: i64, tz: Tz) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&tz).date_naive())
}

/// Map an OpenWeather condition id onto the closest WMO code.
fn wmo_from_openweather(id: u16) -> u16 {
    match id {
        200..=299 => 95,
        300..=399 => 53,
        500..=504 => 63,
        511 => 66,
        520..=599 => 81,
        600..=699 => 73,
        700..=799 => 45,
        800 => 0,
        801 => 1,
        802 => 2,
        803 | 804 => 3,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weekend::PARK_TIMEZONE;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> i64 {
        PARK_TIMEZONE
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .timestamp()
    }

    fn fixture() -> OwForecastResponse {
        let json = serde_json::json!({
            "list": [
                { "dt": ts(2026, 10, 23, 21), "main": { "temp": 70.0, "humidity": 50 }, "weather": [{ "id": 800 }], "pop": 0.0 },
                { "dt": ts(2026, 10, 24, 8),  "main": { "temp": 52.3, "humidity": 70 }, "weather": [{ "id": 801 }], "pop": 0.1 },
                { "dt": ts(2026, 10, 24, 14), "main": { "temp": 63.8, "humidity": 60 }, "weather": [{ "id": 500 }], "pop": 0.46 },
                { "dt": ts(2026, 10, 24, 20), "main": { "temp": 57.0, "humidity": 65 }, "weather": [{ "id": 803 }] },
                { "dt": ts(2026, 10, 25, 11), "main": { "temp": 55.0 }, "weather": [{ "id": 800 }], "pop": 0.0 }
            ]
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn buckets_samples_by_local_day() {
        let parsed = fixture();
        let sat = NaiveDate::from_ymd_opt(2026, 10, 24).unwrap();

        let day = summarize_day(&parsed.list, sat, PARK_TIMEZONE).unwrap();

        assert_eq!(day.date, sat);
        assert_eq!(day.min_temp, 52.3);
        assert_eq!(day.max_temp, 63.8);
        assert_eq!(day.precipitation_probability, 46);
        assert_eq!(day.weather_code, 63);
        assert_eq!(day.humidity, Some(65));
    }

    #[test]
    fn single_sample_day_has_equal_min_and_max() {
        let parsed = fixture();
        let sun = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();

        let day = summarize_day(&parsed.list, sun, PARK_TIMEZONE).unwrap();

        assert_eq!(day.min_temp, day.max_temp);
        assert_eq!(day.precipitation_probability, 0);
        assert_eq!(day.humidity, None);
    }

    #[test]
    fn uncovered_day_is_absent() {
        let parsed = fixture();
        let later = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();

        assert!(summarize_day(&parsed.list, later, PARK_TIMEZONE).is_none());
    }

    #[test]
    fn monday_horizon_covers_saturday_only() {
        // 40 samples, 3 hours apart, from Monday afternoon: the last one
        // lands on Saturday morning.
        let first = ts(2026, 10, 19, 14);
        let list: Vec<OwForecastEntry> = (0..40)
            .map(|i| OwForecastEntry {
                dt: first + i * 3 * 3600,
                main: OwMain {
                    temp: 55.0 + i as f64 / 10.0,
                    humidity: Some(60),
                },
                weather: vec![OwWeather { id: 800 }],
                pop: 0.0,
            })
            .collect();
        let window = WeekendWindow::upcoming(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());

        let days = forecast_days(&list, &window, PARK_TIMEZONE);

        assert_eq!(days.saturday.map(|d| d.date), Some(window.saturday()));
        assert!(days.sunday.is_none());
    }

    #[test]
    fn condition_ids_map_to_wmo() {
        assert_eq!(wmo_from_openweather(211), 95);
        assert_eq!(wmo_from_openweather(601), 73);
        assert_eq!(wmo_from_openweather(800), 0);
        assert_eq!(wmo_from_openweather(804), 3);
    }
}
