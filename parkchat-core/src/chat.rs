use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};

use crate::{
    Config,
    error::ChatError,
    events::{EventQuery, EventsResponse, EventsService, NycOpenDataClient},
    llm::{self, GenerationParams, LanguageModel},
    prompt::{PromptContext, PromptIntent, compose_prompt, full_prompt},
    weather::{WeatherService, WeatherSummary},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMetadata {
    /// Milliseconds spent handling the request.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything the presentation layer needs for one answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResult {
    pub response: String,
    pub intent: PromptIntent,
    pub weather: Option<WeatherSummary>,
    pub events: Option<EventsResponse>,
    pub metadata: ChatMetadata,
}

/// Runs one question through weather, events, prompt composition and the
/// language model, in that order.
#[derive(Debug)]
pub struct ChatOrchestrator {
    weather: WeatherService,
    events: EventsService,
    model: Option<Box<dyn LanguageModel>>,
    params: GenerationParams,
}

impl ChatOrchestrator {
    pub fn new(
        weather: WeatherService,
        events: EventsService,
        model: Option<Box<dyn LanguageModel>>,
    ) -> Self {
        Self {
            weather,
            events,
            model,
            params: GenerationParams::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            WeatherService::from_config(config),
            EventsService::new(Box::new(NycOpenDataClient::from_config(config))),
            llm::model_from_config(config),
        )
    }

    pub fn weather(&self) -> &WeatherService {
        &self.weather
    }

    pub fn events(&self) -> &EventsService {
        &self.events
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.model_id())
    }

    pub async fn chat(&self, message: &str) -> Result<ChatResult, ChatError> {
        let started = Instant::now();

        if message.trim().is_empty() {
            return Err(ChatError::BadRequest("Message is required".to_string()));
        }
        let model = self
            .model
            .as_deref()
            .ok_or_else(|| ChatError::Config("Missing env var: GEMINI_API_KEY".to_string()))?;

        let weather = self.weather.weekend_weather(None).await;
        let weather_provenance = weather.provenance();
        let weather = weather.into_data();

        let events = EventsResponse::from(self.events.weekend_events(EventQuery::default()).await);

        let intent = PromptIntent::classify(message);
        let composed = compose_prompt(
            intent,
            &PromptContext {
                weather: Some(&weather),
                events: Some(events.events.as_slice()),
            },
        );

        let response = model
            .generate(&full_prompt(&composed, message), &self.params)
            .await
            .map_err(|err| {
                error!(model = model.model_id(), error = %err, "language model call failed");
                err
            })?;

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            duration_ms,
            message_length = message.len(),
            %intent,
            %weather_provenance,
            events_provenance = %events.metadata.provenance,
            model = model.model_id(),
            "chat request processed"
        );

        Ok(ChatResult {
            response,
            intent,
            weather: Some(weather),
            events: Some(events),
            metadata: ChatMetadata {
                duration_ms,
                model: model.model_id().to_string(),
                timestamp: Utc::now(),
            },
        })
    }
}
