//! HLS playlist relay.
//!
//! Serves the two playlist endpoints the rewritten URLs point at. Both
//! validate the `(session token, stream name)` pair against the session
//! store before touching the provider and fail closed when no session is
//! found. The recorded session, not the request, supplies the clip window,
//! so a tampered query string cannot widen what a token can fetch.

use std::sync::Arc;

use chrono::Duration;

use vantage_core::AppError;

use crate::playlist::{self, MasterRewrite};
use crate::provider::StreamingProvider;
use crate::session::SessionRegistry;

/// Fragment fetches extend the window slightly so the provider returns the
/// final fragment even when its timestamps land right on the boundary.
const FRAGMENT_WINDOW_PAD_SECS: i64 = 2;

pub struct PlaylistRelay {
    provider: Arc<dyn StreamingProvider>,
    sessions: SessionRegistry,
    public_base_url: String,
    media_path_prefix: String,
}

impl PlaylistRelay {
    pub fn new(
        provider: Arc<dyn StreamingProvider>,
        sessions: SessionRegistry,
        public_base_url: String,
        media_path_prefix: String,
    ) -> Self {
        Self {
            provider,
            sessions,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            media_path_prefix,
        }
    }

    /// Fetch the provider's master playlist through its presigned URL and
    /// rewrite it so media-playlist references route back through the
    /// gateway. Re-records the session, refreshing its TTL.
    pub async fn master_playlist(
        &self,
        session_token: &str,
        stream_name: &str,
        original_url: &str,
    ) -> Result<String, AppError> {
        let session = self.sessions.check(session_token, stream_name).await?;

        let body = self.provider.fetch_playlist(original_url).await?;

        let media_endpoint = format!("{}/media-playlist", self.public_base_url);
        let rewritten = playlist::rewrite_master(
            &body,
            &MasterRewrite {
                media_endpoint: &media_endpoint,
                media_path_prefix: &self.media_path_prefix,
                session_token: &session.session_token,
                stream_name: &session.stream_name,
                start_time: session.start_time,
                end_time: session.end_time,
            },
        )?;

        self.sessions.record(&session).await?;
        Ok(rewritten)
    }

    /// Fetch the fragment playlist for the session's window, absolutize its
    /// fragment paths, and keep it live while the upload is still catching
    /// up. Read-only with respect to the session.
    pub async fn media_playlist(
        &self,
        session_token: &str,
        stream_name: &str,
        track: Option<u32>,
    ) -> Result<String, AppError> {
        let session = self.sessions.check(session_token, stream_name).await?;

        let padded_end = session.end_time + Duration::seconds(FRAGMENT_WINDOW_PAD_SECS);
        let fetched = self
            .provider
            .fetch_fragment_playlist(&session.stream_name, session.start_time, padded_end, track)
            .await?;

        let absolute = playlist::rewrite_media(&fetched.body, &fetched.fragment_base);
        Ok(playlist::adapt_live_replay(&absolute, session.end_time))
    }
}
