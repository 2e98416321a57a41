use chrono::{Duration, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::{
    geo::Coordinates,
    weekend::{WeekendWindow, localize},
};

use super::NormalizedEvent;

pub const MOCK_SOURCE: &str = "Mock Data";

#[derive(Clone, Copy)]
enum Day {
    Saturday,
    Sunday,
}

struct Template {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    day: Day,
    minutes: i64,
    cost: Option<&'static str>,
    location_description: &'static str,
    ticket_url: Option<&'static str>,
    category: &'static str,
    lat: f64,
    source: &'static str,
}

const CONSERVANCY: &str = "Central Park Conservancy (Mock Data)";
const NYC_PARKS: &str = "NYC Parks (Mock Data)";
const TICKETS: &str = "https://www.centralparknyc.org/events";
const MOCK_LNG: f64 = -73.9719;

const TEMPLATES: [Template; 5] = [
    Template {
        id: "mock-1",
        title: "Central Park Walking Tour",
        description: "Join our expert guides for a 90-minute walking tour of Central Park's most iconic landmarks including Bethesda Fountain, Bow Bridge, and the Mall.",
        day: Day::Saturday,
        minutes: 90,
        cost: Some("Tickets: $25 per person"),
        location_description: "Meet at the Dairy Visitor Center (mid-Park between 64th and 65th Streets)",
        ticket_url: Some(TICKETS),
        category: "Walking Tour",
        lat: 40.7647,
        source: CONSERVANCY,
    },
    Template {
        id: "mock-2",
        title: "Yoga in the Park",
        description: "Free outdoor yoga session suitable for all levels. Bring your own mat and water bottle.",
        day: Day::Saturday,
        minutes: 60,
        cost: None,
        location_description: "Sheep Meadow (mid-Park between 66th and 69th Streets)",
        ticket_url: None,
        category: "Fitness",
        lat: 40.7689,
        source: NYC_PARKS,
    },
    Template {
        id: "mock-3",
        title: "Bird Watching Workshop",
        description: "Learn to identify common birds of Central Park with our experienced naturalists. Binoculars provided.",
        day: Day::Sunday,
        minutes: 90,
        cost: None,
        location_description: "The Ramble (mid-Park between 73rd and 79th Streets)",
        ticket_url: None,
        category: "Nature",
        lat: 40.7769,
        source: NYC_PARKS,
    },
    Template {
        id: "mock-4",
        title: "Central Park Photography Walk",
        description: "Capture the beauty of Central Park with professional photography tips. All skill levels welcome.",
        day: Day::Sunday,
        minutes: 120,
        cost: Some("Tickets: $35 per person"),
        location_description: "Bethesda Terrace (mid-Park at 72nd Street)",
        ticket_url: Some(TICKETS),
        category: "Photography",
        lat: 40.7739,
        source: CONSERVANCY,
    },
    Template {
        id: "mock-5",
        title: "Family Story Time",
        description: "Bring the kids for free storytelling and crafts in the heart of Central Park. Perfect for ages 3-8.",
        day: Day::Saturday,
        minutes: 45,
        cost: None,
        location_description: "Dairy Visitor Center (mid-Park between 64th and 65th Streets)",
        ticket_url: None,
        category: "Family",
        lat: 40.7647,
        source: NYC_PARKS,
    },
];

/// The five representative events, Saturday 10:00 and Sunday 14:00 local,
/// sorted by start time.
pub fn mock_events(window: &WeekendWindow, tz: Tz) -> Vec<NormalizedEvent> {
    let at = |day: Day| match day {
        Day::Saturday => localize(window.saturday().and_time(hm(10)), tz),
        Day::Sunday => localize(window.sunday().and_time(hm(14)), tz),
    };

    let mut events: Vec<NormalizedEvent> = TEMPLATES
        .iter()
        .map(|t| {
            let start = at(t.day).with_timezone(&Utc);
            NormalizedEvent {
                id: t.id.to_string(),
                title: t.title.to_string(),
                description: Some(t.description.to_string()),
                start_time: start,
                end_time: start + Duration::minutes(t.minutes),
                is_free: t.cost.is_none(),
                cost_description: Some(t.cost.unwrap_or("Free").to_string()),
                location_description: Some(t.location_description.to_string()),
                ticket_url: t.ticket_url.map(str::to_owned),
                category: Some(t.category.to_string()),
                location: Coordinates::new(t.lat, MOCK_LNG),
                source: t.source.to_string(),
            }
        })
        .collect();

    events.sort_by_key(|e| e.start_time);
    events
}

fn hm(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}
