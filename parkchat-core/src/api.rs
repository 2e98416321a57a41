//! HTTP surface: chat, weather and events endpoints over one shared
//! orchestrator.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{
    Config,
    chat::ChatOrchestrator,
    error::ChatError,
    events::{EventQuery, EventsResponse},
    geo::Coordinates,
};

#[derive(Debug)]
pub struct AppState {
    pub orchestrator: ChatOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: ChatOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ChatOrchestrator::from_config(config))
    }
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/weather", get(weather))
        .route("/api/events", get(events).post(search_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(config: &Config, addr: SocketAddr) -> Result<()> {
    let state = Arc::new(AppState::from_config(config));
    match state.orchestrator.model_id() {
        Some(model) => info!(model, "language model configured"),
        None => warn!("GEMINI_API_KEY not set; /api/chat will answer with a configuration error"),
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, routes(state))
        .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c()))
        .await
        .context("HTTP server error")
}

/// Resolves once `signal` fires. If the signal cannot be installed the
/// server keeps running until the process is killed.
async fn shutdown_signal(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            warn!(error = %err, "failed to listen for Ctrl-C; graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let started = Instant::now();

    let message = match payload {
        Ok(Json(body)) => body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned),
        Err(rejection) => {
            debug!(error = %rejection, "unreadable chat body");
            None
        }
    };
    let Some(message) = message else {
        return bad_request("Message is required");
    };

    match state.orchestrator.chat(&message).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => chat_error(err, started),
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn chat_error(err: ChatError, started: Instant) -> Response {
    let error = match &err {
        ChatError::BadRequest(message) => return bad_request(message),
        ChatError::Config(_) => err.to_string(),
        ChatError::Llm(_) => "Failed to process chat request".to_string(),
    };
    warn!(error = %err, "chat request failed");

    let body = json!({
        "error": error,
        "details": err.to_string(),
        "metadata": {
            "duration": u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "timestamp": Utc::now(),
        },
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    lat: Option<String>,
    lon: Option<String>,
}

impl WeatherParams {
    /// Requested point, filling gaps from `default`. Unparseable values are
    /// treated as absent.
    fn coordinates(&self, default: Coordinates) -> Coordinates {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        Coordinates::new(
            parse(&self.lat).unwrap_or(default.lat),
            parse(&self.lon).unwrap_or(default.lng),
        )
    }
}

async fn weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> impl IntoResponse {
    let service = state.orchestrator.weather();
    let at = params.coordinates(service.default_location());

    Json(service.weekend_weather(Some(at)).await.into_data())
}

#[derive(Debug, Deserialize)]
struct EventsParams {
    locations: Option<String>,
    mock: Option<String>,
}

impl From<EventsParams> for EventQuery {
    fn from(p: EventsParams) -> Self {
        Self {
            locations: p.locations.as_deref() != Some("false"),
            mock: p.mock.as_deref() == Some("true"),
        }
    }
}

async fn events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsParams>,
) -> Json<EventsResponse> {
    let found = state.orchestrator.events().weekend_events(params.into()).await;
    Json(EventsResponse::from(found))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsSearch {
    query: Option<String>,
    date_range: Option<Value>,
}

/// Accepts a search body for forward compatibility; answers like the GET.
async fn search_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsParams>,
    payload: Result<Json<EventsSearch>, JsonRejection>,
) -> Response {
    let Ok(Json(search)) = payload else {
        return bad_request("Invalid request format");
    };
    info!(query = ?search.query, date_range = ?search.date_range, "events search");

    events(State(state), Query(params)).await.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn shutdown_follows_the_signal() {
        shutdown_signal(async { Ok(()) }).await;
    }

    #[tokio::test]
    async fn failed_signal_never_shuts_down() {
        let failed = async { Err(std::io::Error::other("no signal handler")) };
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown_signal(failed)).await;
        assert!(waited.is_err());
    }

    #[test]
    fn weather_params_fall_back_per_axis() {
        let default = Coordinates::new(1.0, 2.0);
        let params = WeatherParams {
            lat: Some("40.5".into()),
            lon: Some("east".into()),
        };
        assert_eq!(params.coordinates(default), Coordinates::new(40.5, 2.0));
    }

    #[test]
    fn events_params_flags() {
        let q: EventQuery = EventsParams {
            locations: Some("false".into()),
            mock: Some("true".into()),
        }
        .into();
        assert!(!q.locations);
        assert!(q.mock);

        let q: EventQuery = EventsParams {
            locations: None,
            mock: Some("yes".into()),
        }
        .into();
        assert!(q.locations);
        assert!(!q.mock);
    }
}
