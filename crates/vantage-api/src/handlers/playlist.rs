//! Playlist relay handlers.
//!
//! These serve the URLs the gateway itself wrote into playable URLs and
//! rewritten master playlists. Both validate the session before touching the
//! provider; the clip window comes from the recorded session, so the
//! `StartTime`/`EndTime` query parameters are accepted for URL compatibility
//! but never trusted.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const M3U8_CONTENT_TYPE: &str = "application/x-mpegURL";

/// `StartTime`/`EndTime` are declared only so the documented URL shape is
/// complete; the recorded session supplies the window.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "PascalCase")]
#[into_params(parameter_in = Query)]
#[allow(dead_code)]
pub struct MasterPlaylistQuery {
    pub session_token: String,
    /// Presigned provider URL for the master playlist.
    pub original_url: String,
    pub stream_name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// `StartTime`/`EndTime` are declared only so the documented URL shape is
/// complete; the recorded session supplies the window.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "PascalCase")]
#[into_params(parameter_in = Query)]
#[allow(dead_code)]
pub struct MediaPlaylistQuery {
    pub session_token: String,
    pub stream_name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub track_number: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/master-playlist",
    tag = "playlists",
    params(MasterPlaylistQuery),
    responses(
        (status = 200, description = "Rewritten HLS master playlist", content_type = "application/x-mpegURL"),
        (status = 400, description = "Unknown or expired session", body = ErrorResponse),
        (status = 502, description = "Provider fetch failed", body = ErrorResponse)
    )
)]
pub async fn master_playlist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MasterPlaylistQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let body = state
        .gateway
        .relay
        .master_playlist(&query.session_token, &query.stream_name, &query.original_url)
        .await
        .map_err(HttpAppError::from)?;

    Ok(([(header::CONTENT_TYPE, M3U8_CONTENT_TYPE)], body))
}

#[utoipa::path(
    get,
    path = "/media-playlist",
    tag = "playlists",
    params(MediaPlaylistQuery),
    responses(
        (status = 200, description = "Rewritten HLS media playlist", content_type = "application/x-mpegURL"),
        (status = 400, description = "Unknown or expired session", body = ErrorResponse),
        (status = 502, description = "Provider fetch failed", body = ErrorResponse)
    )
)]
pub async fn media_playlist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MediaPlaylistQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let body = state
        .gateway
        .relay
        .media_playlist(
            &query.session_token,
            &query.stream_name,
            query.track_number,
        )
        .await
        .map_err(HttpAppError::from)?;

    Ok(([(header::CONTENT_TYPE, M3U8_CONTENT_TYPE)], body))
}
