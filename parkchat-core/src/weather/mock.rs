//! Deterministic stand-in forecast used when no live provider is available.

use chrono::Datelike;

use crate::weekend::WeekendWindow;

use super::{DailyForecast, WeekendForecast};

pub const MOCK_SOURCE: &str = "Mock Weather Data";

/// Central Park monthly normals as (low, high) in °F, January first.
const MONTHLY_NORMALS_F: [(f64, f64); 12] = [
    (27.0, 39.0),
    (29.0, 42.0),
    (35.0, 50.0),
    (45.0, 62.0),
    (54.0, 72.0),
    (64.0, 80.0),
    (69.0, 85.0),
    (68.0, 84.0),
    (61.0, 76.0),
    (50.0, 65.0),
    (41.0, 54.0),
    (32.0, 44.0),
];

/// Seasonal forecast for the window's month. Same input, same output.
pub fn mock_forecast(window: &WeekendWindow) -> WeekendForecast {
    let (low, high) = MONTHLY_NORMALS_F[window.saturday().month0() as usize];

    WeekendForecast {
        saturday: DailyForecast {
            date: window.saturday(),
            min_temp: low,
            max_temp: high,
            precipitation_probability: 20,
            weather_code: 1,
            humidity: Some(65),
        },
        sunday: DailyForecast {
            date: window.sunday(),
            min_temp: low - 1.0,
            max_temp: high - 2.0,
            precipitation_probability: 10,
            weather_code: 1,
            humidity: Some(60),
        },
    }
}
