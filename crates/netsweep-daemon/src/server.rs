//! Web server setup and routing

use anyhow::Result;
use axum::{routing::get, Router};
use netsweep_discovery::HostProber;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api;
use crate::state::AppState;

/// Build the router
pub fn router<P: HostProber>(state: Arc<AppState<P>>) -> Router {
    Router::new()
        // Text records, one event per discovered host
        .route("/", get(api::stream_records::<P>))
        .route("/api/scan", get(api::stream_json::<P>))
        .route("/api/config", get(api::get_config::<P>))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the web server
pub async fn run<P: HostProber>(state: Arc<AppState<P>>, bind: &str) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}
