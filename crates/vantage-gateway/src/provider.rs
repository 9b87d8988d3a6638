//! Streaming provider client.
//!
//! The provider stores uploaded clip streams and serves them as HLS. The
//! gateway talks to it two ways: presigned bucket URLs for the master
//! playlist (signed locally, no round trip) and authenticated API calls for
//! fragment listings and retention updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vantage_core::AppError;

use crate::signer::Signer;

/// A fragment (media) playlist fetched from the provider, plus the absolute
/// base URL its relative fragment paths resolve against.
#[derive(Debug, Clone)]
pub struct FragmentPlaylist {
    pub body: String,
    pub fragment_base: String,
}

/// Everything the gateway asks of the streaming provider.
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    /// Presigned URL for a stream's master playlist. Pure computation.
    fn playback_url(&self, stream_name: &str, now: DateTime<Utc>) -> Result<String, AppError>;

    /// Fetch an already-signed playlist URL verbatim.
    async fn fetch_playlist(&self, url: &str) -> Result<String, AppError>;

    /// Fetch the fragment playlist for a stream over a time window,
    /// optionally restricted to one track.
    async fn fetch_fragment_playlist(
        &self,
        stream_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        track: Option<u32>,
    ) -> Result<FragmentPlaylist, AppError>;

    /// Extend (or set) the retention deadline of a stored stream.
    async fn update_retention(
        &self,
        stream_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// HTTP client for the provider API, with a SigV4 signer for bucket reads.
pub struct ProviderClient {
    http: reqwest::Client,
    endpoint: String,
    signer: Signer,
}

impl ProviderClient {
    pub fn new(http: reqwest::Client, endpoint: String, signer: Signer) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            signer,
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, AppError> {
        let response = self.http.get(url).send().await.map_err(|e| {
            AppError::UpstreamFetch {
                status: None,
                message: format!("request to provider failed: {}", e),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamFetch {
                status: Some(status.as_u16()),
                message: format!("provider returned {} for {}", status, url),
            });
        }

        response.text().await.map_err(|e| AppError::UpstreamFetch {
            status: Some(status.as_u16()),
            message: format!("failed to read provider response body: {}", e),
        })
    }
}

#[async_trait]
impl StreamingProvider for ProviderClient {
    fn playback_url(&self, stream_name: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        self.signer
            .presigned_get(&format!("{}/master.m3u8", stream_name), now)
    }

    async fn fetch_playlist(&self, url: &str) -> Result<String, AppError> {
        self.get_text(url).await
    }

    async fn fetch_fragment_playlist(
        &self,
        stream_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        track: Option<u32>,
    ) -> Result<FragmentPlaylist, AppError> {
        let fragment_base = format!("{}/streams/{}", self.endpoint, stream_name);

        let mut url = url::Url::parse(&format!("{}/fragments", fragment_base)).map_err(|e| {
            AppError::Internal(format!("invalid provider endpoint: {}", e))
        })?;
        url.query_pairs_mut()
            .append_pair("StartTimestamp", &start.to_rfc3339())
            .append_pair("EndTimestamp", &end.to_rfc3339());
        if let Some(track) = track {
            url.query_pairs_mut()
                .append_pair("TrackNumber", &track.to_string());
        }

        let body = self.get_text(url.as_str()).await?;
        Ok(FragmentPlaylist {
            body,
            fragment_base,
        })
    }

    async fn update_retention(
        &self,
        stream_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let url = format!("{}/streams/{}/retention", self.endpoint, stream_name);
        let response = self
            .http
            .put(&url)
            .json(&serde_json::json!({ "expiresAt": expires_at.to_rfc3339() }))
            .send()
            .await
            .map_err(|e| AppError::UpstreamFetch {
                status: None,
                message: format!("retention update failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamFetch {
                status: Some(status.as_u16()),
                message: format!("provider rejected retention update for {}", stream_name),
            });
        }
        Ok(())
    }
}
