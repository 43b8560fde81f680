//! HTTP handlers streaming scan results as server-sent events

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures_util::stream::{Stream, StreamExt};
use netsweep_discovery::HostProber;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

/// Run a sweep and stream one text record per event
pub async fn stream_records<P: HostProber>(
    State(state): State<Arc<AppState<P>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("Text scan stream requested");

    let events = state
        .scanner
        .scan()
        .map(|record| Ok(Event::default().data(record.to_string())));

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Run a sweep and stream one JSON record per event
pub async fn stream_json<P: HostProber>(
    State(state): State<Arc<AppState<P>>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!("JSON scan stream requested");

    let events = state
        .scanner
        .scan()
        .map(|record| Event::default().json_data(&record));

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Get current configuration
pub async fn get_config<P: HostProber>(
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "daemon": state.config.daemon,
        "scanner": state.scanner.config(),
    }))
}
