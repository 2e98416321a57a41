//! Weekend events in the park: NYC Open Data records normalized, filtered to
//! the weekend window and the park's bounding box, with a fixed mock set
//! standing in when nothing usable comes back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::HashMap, fmt::Debug};
use tracing::{debug, info, warn};

use crate::{
    geo::{CENTRAL_PARK_CENTROID, Coordinates, is_within_central_park},
    model::{Provenance, Sourced},
    weekend::{PARK_TIMEZONE, WeekendWindow, localize},
};

pub mod mock;
pub mod nyc_open_data;

pub use mock::mock_events;
pub use nyc_open_data::NycOpenDataClient;

pub const NYC_PARKS_SOURCE: &str = "NYC Parks Open Data";
const TICKET_URL_BASE: &str = "https://www.nycgovparks.org/events/";

/// One row of the NYC Parks events dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEventRecord {
    pub event_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: Option<String>,
    /// Free text, usually a floating timestamp such as `2024-06-01T00:00:00.000`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    /// `"1"` for free, `"0"` for paid.
    #[serde(default)]
    pub cost_free: String,
    #[serde(default)]
    pub cost_description: Option<String>,
    #[serde(default)]
    pub location_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RawPoint {
    #[serde(deserialize_with = "number_or_string")]
    pub latitude: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub longitude: f64,
}

impl From<RawPoint> for Coordinates {
    fn from(p: RawPoint) -> Self {
        Coordinates::new(p.latitude, p.longitude)
    }
}

/// One row of the NYC Parks event locations dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawLocationRecord {
    pub event_id: String,
    #[serde(default)]
    pub location: Option<RawPoint>,
    #[serde(default)]
    pub park_name: Option<String>,
}

/// Socrata serializes numbers as strings.
fn number_or_string<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        F(f64),
        S(String),
    }

    match Num::deserialize(de)? {
        Num::F(f) => Ok(f),
        Num::S(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub location: Coordinates,
    pub source: String,
}

/// Filter and normalize raw records to this weekend's park events, sorted by
/// start time.
///
/// Location records outside the park's bounding box are discarded before
/// matching. When any location records were supplied at all, an event must
/// match one of the remaining ones to survive.
pub fn normalize_events(
    events: &[RawEventRecord],
    locations: &[RawLocationRecord],
    window: &WeekendWindow,
    tz: Tz,
) -> Vec<NormalizedEvent> {
    let lookup: HashMap<&str, Coordinates> = locations
        .iter()
        .filter_map(|loc| Some((loc.event_id.as_str(), Coordinates::from(loc.location?))))
        .filter(|(_, point)| is_within_central_park(*point))
        .collect();
    let require_location = !locations.is_empty();

    let mut out: Vec<NormalizedEvent> = events
        .iter()
        .filter_map(|event| {
            let Some((start, end)) = event_times(event, tz) else {
                debug!(event_id = %event.event_id, date = %event.date, "skipping event with unparseable date/time");
                return None;
            };
            if !window.contains(&start, tz) {
                return None;
            }

            let location = lookup.get(event.event_id.as_str()).copied();
            if require_location && location.is_none() {
                return None;
            }

            Some(normalize(event, start, end, location))
        })
        .collect();

    out.sort_by_key(|e| e.start_time);
    out
}

fn normalize(
    event: &RawEventRecord,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    location: Option<Coordinates>,
) -> NormalizedEvent {
    NormalizedEvent {
        id: event.event_id.clone(),
        title: event.title.clone(),
        description: non_empty(&event.snippet).or_else(|| non_empty(&event.description)),
        start_time: start,
        end_time: end,
        is_free: event.cost_free.trim() == "1",
        cost_description: non_empty(&event.cost_description),
        location_description: non_empty(&event.location_description),
        ticket_url: non_empty(&event.url).map(|slug| format!("{TICKET_URL_BASE}{slug}")),
        category: None,
        location: location.unwrap_or(CENTRAL_PARK_CENTROID),
        source: NYC_PARKS_SOURCE.to_string(),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Absolute start/end of an event. An end time earlier than the start falls
/// on the next day; an unusable one collapses to the start.
fn event_times(event: &RawEventRecord, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let date = parse_event_date(&event.date)?;
    let start_time = parse_time_of_day(&event.start_time)?;

    let start = localize(date.and_time(start_time), tz).with_timezone(&Utc);
    let end = parse_time_of_day(&event.end_time)
        .and_then(|t| {
            let end_date = if t < start_time { date.succ_opt()? } else { date };
            Some(localize(end_date.and_time(t), tz).with_timezone(&Utc))
        })
        .unwrap_or(start);

    Some((start, end))
}

fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    None
}

fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim().to_uppercase();

    ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&raw, fmt).ok())
}

/// Upstream source of raw event records.
#[async_trait]
pub trait EventSource: Send + Sync + Debug {
    async fn fetch_events(&self) -> anyhow::Result<Vec<RawEventRecord>>;

    async fn fetch_locations(&self) -> anyhow::Result<Vec<RawLocationRecord>>;
}

/// Options accepted by the events endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQuery {
    /// Apply the park's spatial filter using the locations dataset.
    pub locations: bool,
    /// Skip the upstream entirely and serve the mock set.
    pub mock: bool,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            locations: true,
            mock: false,
        }
    }
}

/// Location filtering that actually ran for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialFilter {
    /// Events were matched against in-park location records.
    Applied,
    /// The caller asked for date filtering only.
    Disabled,
    /// Location records were wanted but could not be used.
    Unavailable,
}

impl SpatialFilter {
    pub fn description(&self) -> &'static str {
        match self {
            SpatialFilter::Applied => "Central Park spatial filter applied",
            SpatialFilter::Disabled => "No spatial filtering",
            SpatialFilter::Unavailable => "Spatial filter unavailable; filtered by date only",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekendEvents {
    pub events: Sourced<Vec<NormalizedEvent>>,
    pub window: WeekendWindow,
    pub spatial_filter: SpatialFilter,
}

#[derive(Debug)]
pub struct EventsService {
    source: Box<dyn EventSource>,
    tz: Tz,
}

impl EventsService {
    pub fn new(source: Box<dyn EventSource>) -> Self {
        Self {
            source,
            tz: PARK_TIMEZONE,
        }
    }

    pub async fn weekend_events(&self, query: EventQuery) -> WeekendEvents {
        self.weekend_events_in(query, WeekendWindow::current(self.tz))
            .await
    }

    /// One attempt at the live source; anything short of a non-empty result
    /// becomes the mock set with a reason attached.
    pub async fn weekend_events_in(&self, query: EventQuery, window: WeekendWindow) -> WeekendEvents {
        let (events, spatial_filter) = self.fetch(query, &window).await;

        info!(
            count = events.data().len(),
            provenance = %events.provenance(),
            spatial_filter = spatial_filter.description(),
            %window,
            "weekend events ready"
        );

        WeekendEvents {
            events,
            window,
            spatial_filter,
        }
    }

    async fn fetch(
        &self,
        query: EventQuery,
        window: &WeekendWindow,
    ) -> (Sourced<Vec<NormalizedEvent>>, SpatialFilter) {
        let fallback = |reason: String| Sourced::fallback(mock_events(window, self.tz), reason);
        let skipped = if query.locations {
            SpatialFilter::Unavailable
        } else {
            SpatialFilter::Disabled
        };

        if query.mock {
            return (fallback("mock data requested".to_string()), SpatialFilter::Disabled);
        }

        let raw = match self.source.fetch_events().await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "events fetch failed; using mock events");
                return (fallback(format!("events source unavailable: {err:#}")), skipped);
            }
        };
        debug!(fetched = raw.len(), "raw events fetched");

        let locations = if query.locations {
            match self.source.fetch_locations().await {
                Ok(locations) => locations,
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "locations fetch failed; filtering by date only");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        // An empty location list leaves matching off in `normalize_events`.
        let spatial_filter = if locations.is_empty() {
            skipped
        } else {
            SpatialFilter::Applied
        };

        let events = normalize_events(&raw, &locations, window, self.tz);
        if events.is_empty() {
            return (fallback("no events found for this weekend".to_string()), spatial_filter);
        }

        (Sourced::Live(events), spatial_filter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsMetadata {
    pub total_events: usize,
    pub source: String,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub weekend_range: WeekendWindow,
    pub location_filter: String,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

/// Body of the events endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    pub events: Vec<NormalizedEvent>,
    pub metadata: EventsMetadata,
}

impl From<WeekendEvents> for EventsResponse {
    fn from(w: WeekendEvents) -> Self {
        let provenance = w.events.provenance();
        let fallback_reason = w.events.fallback_reason().map(str::to_owned);
        let events = w.events.into_data();

        let (source, note) = match provenance {
            Provenance::Live => (
                NYC_PARKS_SOURCE,
                "Events filtered to this weekend in Central Park.",
            ),
            Provenance::Fallback => (
                mock::MOCK_SOURCE,
                "Representative sample events; live NYC Open Data was unavailable or had nothing for this weekend.",
            ),
        };

        Self {
            metadata: EventsMetadata {
                total_events: events.len(),
                source: source.to_string(),
                provenance,
                fallback_reason,
                weekend_range: w.window,
                location_filter: w.spatial_filter.description().to_string(),
                timestamp: Utc::now(),
                note: note.to_string(),
            },
            events,
        }
    }
}
