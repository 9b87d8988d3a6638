//! Playback request handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use vantage_core::models::{PlayableUrl, RequestPurpose, ResolutionSpec, StreamRequestParams};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "PascalCase")]
#[into_params(parameter_in = Query)]
pub struct PlaybackQuery {
    pub camera_id: Uuid,
    /// Per-camera opaque stream token; base of the derived stream name.
    pub stream_hash: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Resolution label, e.g. "720p".
    pub resolution: String,
    /// When true, the edge device may renegotiate the resolution.
    pub dynamic_resolution: Option<bool>,
    pub retention_days: Option<i64>,
    pub purpose: RequestPurpose,
}

#[utoipa::path(
    get,
    path = "/playback",
    tag = "playback",
    params(PlaybackQuery),
    responses(
        (status = 200, description = "Playable gateway URL with a recorded session", body = PlayableUrl),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 500, description = "Clip record is in an inconsistent state", body = ErrorResponse),
        (status = 503, description = "Edge upload request failed", body = ErrorResponse)
    )
)]
pub async fn playback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaybackQuery>,
) -> Result<Json<PlayableUrl>, HttpAppError> {
    let resolution = if query.dynamic_resolution.unwrap_or(false) {
        ResolutionSpec::Dynamic {
            preferred: query.resolution,
        }
    } else {
        ResolutionSpec::Static {
            resolution: query.resolution,
        }
    };

    let params = StreamRequestParams {
        camera_id: query.camera_id,
        stream_hash: query.stream_hash,
        start_time: query.start_time,
        end_time: query.end_time,
        resolution,
        retention_days: query.retention_days,
        purpose: query.purpose,
    };

    tracing::debug!(
        camera_id = %params.camera_id,
        purpose = %params.purpose,
        "Playback requested"
    );

    let playable = state
        .gateway
        .orchestrator
        .ensure_playable(&params)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(playable))
}
