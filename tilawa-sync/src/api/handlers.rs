//! HTTP request handlers
//!
//! Control endpoints answer as soon as the engine has accepted the command;
//! the resulting state changes arrive on the event stream.

use crate::api::server::AppContext;
use crate::engine::EngineStatus;
use crate::error::Error;
use crate::media_session::MediaControlAction;
use crate::scroll::ScrollEvent;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tilawa_common::model::{SectionId, SectionSummary, Voice};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    /// Position as a fraction of the active track
    fraction: f64,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    index: usize,
}

#[derive(Debug, Deserialize)]
pub struct SectionRequest {
    section_id: SectionId,
    /// Defaults to the current voice, then the configured default
    voice_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SectionListResponse {
    sections: Vec<SectionSummary>,
}

#[derive(Debug, Serialize)]
pub struct VoiceListResponse {
    voices: Vec<Voice>,
}

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<T, ApiError>;

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

fn api_error(e: Error) -> ApiError {
    let code = match &e {
        Error::NotFound(_) | Error::Common(tilawa_common::Error::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        Error::BadRequest(_) | Error::Common(tilawa_common::Error::InvalidInput(_)) => {
            StatusCode::BAD_REQUEST
        }
        Error::Network(_) | Error::Content(_) => StatusCode::BAD_GATEWAY,
        Error::EngineStopped => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if code.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (
        code,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "tilawa-sync".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback/state - Transport snapshot, scroll state and metadata
pub async fn get_playback_state(State(ctx): State<AppContext>) -> ApiResult<Json<EngineStatus>> {
    ctx.engine.status().await.map(Json).map_err(api_error)
}

/// POST /playback/toggle
pub async fn toggle_play_pause(State(ctx): State<AppContext>) -> ApiResult<Json<StatusResponse>> {
    ctx.engine.toggle_play_pause().await.map_err(api_error)?;
    Ok(ok())
}

/// POST /playback/next - No effect in continuous mode or on the last unit
pub async fn next_unit(State(ctx): State<AppContext>) -> ApiResult<Json<StatusResponse>> {
    ctx.engine.advance().await.map_err(api_error)?;
    Ok(ok())
}

/// POST /playback/previous
pub async fn previous_unit(State(ctx): State<AppContext>) -> ApiResult<Json<StatusResponse>> {
    ctx.engine.retreat().await.map_err(api_error)?;
    Ok(ok())
}

/// POST /playback/seek
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<Json<StatusResponse>> {
    if !req.fraction.is_finite() || !(0.0..=1.0).contains(&req.fraction) {
        return Err(api_error(Error::BadRequest(format!(
            "seek fraction {} outside 0..=1",
            req.fraction
        ))));
    }
    ctx.engine.seek(req.fraction).await.map_err(api_error)?;
    Ok(ok())
}

/// POST /playback/select - Jump to a unit (clamped to the section)
pub async fn select_unit(
    State(ctx): State<AppContext>,
    Json(req): Json<SelectRequest>,
) -> ApiResult<Json<StatusResponse>> {
    ctx.engine.select_unit(req.index).await.map_err(api_error)?;
    Ok(ok())
}

// ============================================================================
// Content Endpoints
// ============================================================================

/// POST /section - Open a section, or switch voice within the current one
pub async fn load_section(
    State(ctx): State<AppContext>,
    Json(req): Json<SectionRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let voice_id = match req.voice_id {
        Some(voice_id) => voice_id,
        None => ctx
            .engine
            .status()
            .await
            .map_err(api_error)?
            .voice
            .unwrap_or_else(|| ctx.config.content.default_voice.clone()),
    };

    info!(section_id = req.section_id, voice_id = %voice_id, "Section requested");
    ctx.engine
        .open_section(ctx.content.as_ref(), req.section_id, &voice_id)
        .await
        .map_err(api_error)?;
    Ok(ok())
}

/// GET /sections
pub async fn list_sections(State(ctx): State<AppContext>) -> ApiResult<Json<SectionListResponse>> {
    let sections = ctx.content.list_sections().await.map_err(api_error)?;
    Ok(Json(SectionListResponse { sections }))
}

/// GET /voices
pub async fn list_voices(State(ctx): State<AppContext>) -> ApiResult<Json<VoiceListResponse>> {
    let voices = ctx.content.list_voices().await.map_err(api_error)?;
    Ok(Json(VoiceListResponse { voices }))
}

// ============================================================================
// Surface Endpoints
// ============================================================================

/// POST /scroll - Scroll position report from the rendering surface
pub async fn report_scroll(
    State(ctx): State<AppContext>,
    Json(event): Json<ScrollEvent>,
) -> ApiResult<Json<StatusResponse>> {
    ctx.engine.scroll(event).await.map_err(api_error)?;
    Ok(ok())
}

/// POST /media/action - Platform media-control action
pub async fn media_action(
    State(ctx): State<AppContext>,
    Json(action): Json<MediaControlAction>,
) -> ApiResult<Json<StatusResponse>> {
    ctx.engine.media_action(action).await.map_err(api_error)?;
    Ok(ok())
}
