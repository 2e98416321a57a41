//! Prompt templates and the keyword classification that picks between them.

use serde::Serialize;

use crate::{
    events::NormalizedEvent,
    weather::{DailyForecast, WeatherSummary},
    weekend::PARK_TIMEZONE,
};

pub const SYSTEM_PROMPT: &str = "You are NYC Chat, a helpful assistant for New York City visitors and residents.

IMPORTANT RULES:
- Be concise and friendly
- Use JSON tool outputs when provided
- NEVER hallucinate events or activities
- If events are unavailable, say so clearly and offer weather-aware suggestions instead
- Focus on Central Park and NYC-specific information
- Always consider weather context when making recommendations

Your responses should be helpful, accurate, and NYC-focused.";

pub const WEATHER_QUERY_PROMPT: &str = "The user is asking about weather in Central Park this weekend.

Please provide a clear, concise weather summary including:
- Temperature ranges (min/max) for Saturday and Sunday
- Precipitation probability
- General conditions (sunny, cloudy, etc.)
- Brief human-readable summary

Use the weather data provided to give accurate information.";

pub const EVENTS_PROMPT: &str = "The user wants to know what is going on in Central Park this weekend.

Events this weekend:
{events_list}

Please:
1. Walk the user through the weekend as a short story, in time order
2. Mention which events are free and where each one meets
3. Point out anything that needs tickets

Only mention events from the list above. If the list is empty, say so plainly.";

pub const RELAXATION_PROMPT: &str = "The user is looking for a relaxing, peaceful time in Central Park this weekend.

Weather this weekend:
{weather_summary}

Please suggest 3 quiet spots or low-key activities in Central Park that suit the weather, with a sentence on why each one is calm. Prefer less crowded times of day.";

pub const WEATHER_CONTEXT_PROMPT: &str = "Based on the weather forecast for Central Park this weekend:

{weather_summary}

Please provide:
1. A brief weather summary for the weekend
2. 3 weather-aware activity suggestions for Central Park
3. Any relevant tips based on the weather conditions

Remember: Do not invent events. Focus on general activities that would be enjoyable given the weather conditions.";

pub const EVENTS_CONTEXT_PROMPT: &str = "Scheduled events this weekend that you may weave into the plan:

{events_list}";

pub const WEATHER_UNAVAILABLE: &str = "Weather data unavailable";
pub const NO_EVENTS: &str = "No events are listed for this weekend.";

/// What the user is asking about, decided by keyword containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptIntent {
    WeatherQuery,
    Events,
    Relaxation,
    Planning,
    General,
}

impl PromptIntent {
    /// First matching rule wins, in declaration order.
    const RULES: [(PromptIntent, &'static [&'static str]); 4] = [
        (PromptIntent::WeatherQuery, &["weather"]),
        (PromptIntent::Events, &["going on", "events"]),
        (PromptIntent::Relaxation, &["relax", "peaceful", "quiet"]),
        (PromptIntent::Planning, &["plan", "suggest"]),
    ];

    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        Self::RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(intent, _)| *intent)
            .unwrap_or(PromptIntent::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptIntent::WeatherQuery => "weather_query",
            PromptIntent::Events => "events",
            PromptIntent::Relaxation => "relaxation",
            PromptIntent::Planning => "planning",
            PromptIntent::General => "general",
        }
    }
}

impl std::fmt::Display for PromptIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data the templates can draw on.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptContext<'a> {
    pub weather: Option<&'a WeatherSummary>,
    pub events: Option<&'a [NormalizedEvent]>,
}

/// System prompt plus the template for `intent`, with data interpolated.
pub fn compose_prompt(intent: PromptIntent, ctx: &PromptContext<'_>) -> String {
    let weather = || ctx.weather.map_or_else(|| WEATHER_UNAVAILABLE.to_string(), format_weather_summary);
    let events = || ctx.events.map_or_else(|| NO_EVENTS.to_string(), format_event_list);

    let section = match intent {
        PromptIntent::General => return SYSTEM_PROMPT.to_string(),
        PromptIntent::WeatherQuery => {
            format!("{WEATHER_QUERY_PROMPT}\n\nWeather data:\n{}", weather())
        }
        PromptIntent::Events => EVENTS_PROMPT.replace("{events_list}", &events()),
        PromptIntent::Relaxation => RELAXATION_PROMPT.replace("{weather_summary}", &weather()),
        PromptIntent::Planning => {
            let mut s = WEATHER_CONTEXT_PROMPT.replace("{weather_summary}", &weather());
            if let Some(list) = ctx.events.filter(|e| !e.is_empty()) {
                s.push_str("\n\n");
                s.push_str(&EVENTS_CONTEXT_PROMPT.replace("{events_list}", &format_event_list(list)));
            }
            s
        }
    };

    format!("{SYSTEM_PROMPT}\n\n{section}")
}

/// What is actually sent to the model.
pub fn full_prompt(composed: &str, message: &str) -> String {
    format!("{composed}\n\nUser: {message}")
}

/// One line per weekend day.
pub fn format_weather_summary(summary: &WeatherSummary) -> String {
    let window = &summary.metadata.forecast_period;
    summary
        .days
        .iter()
        .map(|day| format_day(window.day_label(day.date).unwrap_or("Weekend"), day))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_day(label: &str, day: &DailyForecast) -> String {
    let mut line = format!(
        "{label} ({}): {}°F to {}°F, {}% chance of rain, {}",
        day.date,
        day.min_temp.round(),
        day.max_temp.round(),
        day.precipitation_probability,
        day.condition(),
    );
    if let Some(h) = day.humidity {
        line.push_str(&format!(", {h}% humidity"));
    }
    line
}

/// Bullet list of events with local times, place and cost.
pub fn format_event_list(events: &[NormalizedEvent]) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }

    events
        .iter()
        .map(|e| {
            let start = e.start_time.with_timezone(&PARK_TIMEZONE);
            let end = e.end_time.with_timezone(&PARK_TIMEZONE);
            let mut line = format!(
                "- {} ({} {}-{})",
                e.title,
                start.format("%A"),
                start.format("%-I:%M %p"),
                end.format("%-I:%M %p"),
            );
            if let Some(place) = &e.location_description {
                line.push_str(&format!(" at {place}"));
            }
            let cost = match (&e.cost_description, e.is_free) {
                (Some(c), _) => c.clone(),
                (None, true) => "Free".to_string(),
                (None, false) => "Paid".to_string(),
            };
            line.push_str(&format!("; {cost}"));
            if let Some(url) = &e.ticket_url {
                line.push_str(&format!("; tickets: {url}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
