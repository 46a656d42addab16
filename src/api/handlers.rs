use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::{
    events::{ndjson_body, EventSink},
    models::{SearchRequest, SourceConfig},
};

use super::AppState;

/// Events buffered between the schedulers and the response writer before
/// producers start waiting on the consumer
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Lists the enabled catalog sources, sorted by priority
pub async fn list_sources(State(state): State<AppState>) -> Json<Vec<SourceConfig>> {
    Json(state.registry.enabled())
}

/// Streaming search endpoint.
///
/// Returns a long-lived NDJSON response: progress, results and one terminal
/// record, each on its own line, written as the pipeline produces them. The
/// response starts immediately; the run is driven by a background task that
/// stops once the client disconnects.
pub async fn search_stream(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> impl IntoResponse {
    let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);

    let pipeline = state.pipeline.clone();
    let registry = Arc::clone(&state.registry);
    tokio::spawn(async move {
        pipeline.run(&registry, request, sink).await;
    });

    (
        [
            (header::CONTENT_TYPE, "application/x-ndjson"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        ndjson_body(rx),
    )
}
