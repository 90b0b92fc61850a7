//! HTTP server setup and routing
//!
//! Control endpoints, content lookups and the SSE event stream share one
//! router and one [`AppContext`].

use crate::content::ContentProvider;
use crate::engine::EngineHandle;
use crate::error::{Error, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tilawa_common::config::SyncConfig;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
///
/// Clone is cheap: every field is a handle or an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub engine: EngineHandle,
    pub content: Arc<dyn ContentProvider>,
    pub config: Arc<SyncConfig>,
}

/// Build the router with all routes attached
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))

        // Playback control
        .route("/playback/state", get(super::handlers::get_playback_state))
        .route("/playback/toggle", post(super::handlers::toggle_play_pause))
        .route("/playback/next", post(super::handlers::next_unit))
        .route("/playback/previous", post(super::handlers::previous_unit))
        .route("/playback/seek", post(super::handlers::seek))
        .route("/playback/select", post(super::handlers::select_unit))

        // Section and voice selection
        .route("/section", post(super::handlers::load_section))
        .route("/sections", get(super::handlers::list_sections))
        .route("/voices", get(super::handlers::list_voices))

        // Rendering surface and platform controls
        .route("/scroll", post(super::handlers::report_scroll))
        .route("/media/action", post(super::handlers::media_action))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run<F>(ctx: AppContext, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(ctx);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
