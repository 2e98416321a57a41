//! Plain-text presentation of chat answers, forecasts and events.

use parkchat_core::{
    ChatResult, EventsResponse, NormalizedEvent, PARK_TIMEZONE, Provenance, WeatherSummary,
    weather::DailyForecast,
};

/// Strip `**` bold markers and turn `* ` bullets into `• `.
pub fn clean_markdown(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.replace("**", "");
            let indent = line.len() - line.trim_start().len();
            let bullet = line[indent..]
                .strip_prefix("* ")
                .map(|item| format!("{}• {item}", &line[..indent]));
            bullet.unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn chat_result(result: &ChatResult) -> String {
    let mut out = clean_markdown(&result.response);
    out.push('\n');

    if let Some(weather) = &result.weather {
        out.push('\n');
        out.push_str(&weather_card(weather));
    }
    if let Some(events) = &result.events {
        out.push('\n');
        out.push_str(&events_block(events));
    }

    out.push_str(&format!(
        "\n[{} · {} ms · {}]\n",
        result.intent, result.metadata.duration_ms, result.metadata.model
    ));
    out
}

pub fn weather_card(summary: &WeatherSummary) -> String {
    let meta = &summary.metadata;
    let mut out = format!("Weather · {} ({})\n", meta.location, meta.forecast_period);

    for day in &summary.days {
        let label = meta.forecast_period.day_label(day.date).unwrap_or("Weekend");
        out.push_str(&format!("  {label:<9}{}\n", day_line(day)));
    }
    out.push_str(&source_line(&meta.source, meta.provenance, meta.fallback_reason.as_deref()));
    out
}

fn day_line(day: &DailyForecast) -> String {
    let mut line = format!(
        "{}  {}, {:.0}°F / {:.0}°F, {}% rain",
        day.date.format("%b %-d"),
        day.condition(),
        day.max_temp,
        day.min_temp,
        day.precipitation_probability,
    );
    if let Some(humidity) = day.humidity {
        line.push_str(&format!(", {humidity}% humidity"));
    }
    line
}

fn source_line(source: &str, provenance: Provenance, reason: Option<&str>) -> String {
    match (provenance, reason) {
        (Provenance::Fallback, Some(reason)) => format!("  Source: {source} (fallback: {reason})\n"),
        _ => format!("  Source: {source} ({provenance})\n"),
    }
}

pub fn events_block(response: &EventsResponse) -> String {
    let meta = &response.metadata;
    let mut out = format!("Events · {} ({})\n", meta.weekend_range, meta.total_events);

    if response.events.is_empty() {
        out.push_str("  No events found for this weekend.\n");
    }
    for event in &response.events {
        out.push_str(&event_card(event));
    }
    out.push_str(&source_line(&meta.source, meta.provenance, meta.fallback_reason.as_deref()));
    out
}

pub fn event_card(event: &NormalizedEvent) -> String {
    let start = event.start_time.with_timezone(&PARK_TIMEZONE);
    let end = event.end_time.with_timezone(&PARK_TIMEZONE);
    let cost = if event.is_free {
        "Free"
    } else {
        event.cost_description.as_deref().unwrap_or("Paid")
    };

    let mut out = format!(
        "  • {}\n    {} - {} · {cost}\n",
        event.title,
        start.format("%a %-I:%M %p"),
        end.format("%-I:%M %p"),
    );
    if let Some(description) = &event.description {
        out.push_str(&format!("    {description}\n"));
    }
    if let Some(place) = &event.location_description {
        out.push_str(&format!("    {place}\n"));
    }
    if let Some(url) = &event.ticket_url {
        out.push_str(&format!("    {url}\n"));
    }
    out
}
