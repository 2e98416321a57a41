//! Core library for the `parkchat` Central Park weekend assistant.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weekend window and the park's bounding box
//! - Weather providers and NYC Open Data events, each with a mock fallback
//! - Prompt selection and the Gemini client
//! - The chat orchestrator and its HTTP API
//!
//! It is used by `parkchat-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod llm;
pub mod model;
pub mod prompt;
pub mod weather;
pub mod weekend;

pub use chat::{ChatOrchestrator, ChatResult};
pub use config::{Config, ProviderConfig};
pub use error::ChatError;
pub use events::{EventQuery, EventsResponse, EventsService, NormalizedEvent};
pub use geo::Coordinates;
pub use model::{Provenance, Sourced};
pub use weather::{ProviderId, WeatherProvider, WeatherService, WeatherSummary};
pub use weekend::{PARK_TIMEZONE, WeekendWindow};
