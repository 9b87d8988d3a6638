//! Clip upload orchestration.
//!
//! `ensure_playable` is the gateway's central operation: given a camera,
//! time window, and purpose, it guarantees a remote stream exists (or is
//! being uploaded) for that clip and hands back a gateway playback URL plus
//! a recorded session.
//!
//! Persisted state drives every decision:
//!
//! * no stream name yet: resolve a name, command the edge upload, then
//!   claim the record; when a concurrent request claimed it first, its
//!   persisted name is forwarded instead;
//! * stream name but no expiration: the record is corrupt, fail loudly;
//! * stream expired: re-upload under the same name, bump the expiration;
//! * stream valid: sync the provider's retention for non-view replays and
//!   record the new expiration on the clip.
//!
//! The edge command is sent before anything is persisted, so a transport
//! failure leaves the record exactly as it was found.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use vantage_core::models::{ClipRecord, HlsSession, PlayableUrl, StreamRequestParams};
use vantage_core::AppError;
use vantage_db::ClipRepository;

use crate::edge::EdgeMessenger;
use crate::identity;
use crate::provider::StreamingProvider;
use crate::retention::RetentionSynchronizer;
use crate::session::SessionRegistry;

/// Persistence surface the orchestrator needs from the clip repository.
#[async_trait]
pub trait ClipStore: Send + Sync {
    async fn get_or_create(
        &self,
        camera_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<ClipRecord, AppError>;

    async fn claim_stream_assignment(
        &self,
        record_id: Uuid,
        remote_stream_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    async fn update_stream_name_and_expiration(
        &self,
        record_id: Uuid,
        remote_stream_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;
}

#[async_trait]
impl ClipStore for ClipRepository {
    async fn get_or_create(
        &self,
        camera_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<ClipRecord, AppError> {
        ClipRepository::get_or_create(self, camera_id, start_time, end_time).await
    }

    async fn claim_stream_assignment(
        &self,
        record_id: Uuid,
        remote_stream_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        ClipRepository::claim_stream_assignment(self, record_id, remote_stream_name, expires_at)
            .await
    }

    async fn update_stream_name_and_expiration(
        &self,
        record_id: Uuid,
        remote_stream_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        ClipRepository::update_stream_name_and_expiration(
            self,
            record_id,
            remote_stream_name,
            expires_at,
        )
        .await
    }
}

pub struct ClipUploadOrchestrator {
    clips: Arc<dyn ClipStore>,
    edge: Arc<dyn EdgeMessenger>,
    provider: Arc<dyn StreamingProvider>,
    sessions: SessionRegistry,
    retention: RetentionSynchronizer,
    default_retention_days: i64,
    public_base_url: String,
}

impl ClipUploadOrchestrator {
    pub fn new(
        clips: Arc<dyn ClipStore>,
        edge: Arc<dyn EdgeMessenger>,
        provider: Arc<dyn StreamingProvider>,
        sessions: SessionRegistry,
        default_retention_days: i64,
        public_base_url: String,
    ) -> Self {
        let retention = RetentionSynchronizer::new(provider.clone());
        Self {
            clips,
            edge,
            provider,
            sessions,
            retention,
            default_retention_days,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Guarantee a playable remote stream for the requested window and hand
    /// back the gateway playback URL with its session recorded.
    pub async fn ensure_playable(
        &self,
        params: &StreamRequestParams,
    ) -> Result<PlayableUrl, AppError> {
        params.validate()?;
        let now = Utc::now();

        let record = self
            .clips
            .get_or_create(params.camera_id, params.start_time, params.end_time)
            .await?;

        let stream_name = match (&record.remote_stream_name, record.expires_at) {
            (None, _) => self.upload_fresh(params, &record, now).await?,
            (Some(name), None) => {
                return Err(AppError::InconsistentClipState(format!(
                    "clip {} has stream name {} but no expiration",
                    record.id, name
                )));
            }
            (Some(name), Some(_)) => {
                let stored = self.reconcile_base_name(params, name);
                if record.is_expired(now) {
                    self.upload_again(params, &record, &stored, now).await?;
                    stored
                } else {
                    if !params.purpose.is_view_only() {
                        self.sync_retention(&stored, &record, params, now).await;
                    }
                    stored
                }
            }
        };

        self.issue_playable_url(params, &stream_name, now).await
    }

    /// First upload for a clip: derive a name, command the edge device, then
    /// claim the record with name and expiration in one conditional write.
    /// A concurrent request can win the claim between the read and the
    /// write; the loser forwards the winner's persisted name. Both edge
    /// commands then carry the same deterministic name for shared windows,
    /// so the edge performs a single upload.
    async fn upload_fresh(
        &self,
        params: &StreamRequestParams,
        record: &ClipRecord,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let stream_name = identity::resolve(
            &params.stream_hash,
            params.start_time,
            params.end_time,
            params.purpose,
        );
        let expires_at = now + Duration::days(self.retention_days(params));

        self.edge
            .request_upload(
                params.camera_id,
                &stream_name,
                &params.resolution,
                self.retention_days(params),
            )
            .await?;

        let claimed = self
            .clips
            .claim_stream_assignment(record.id, &stream_name, expires_at)
            .await?;
        if !claimed {
            let current = self
                .clips
                .get_or_create(params.camera_id, params.start_time, params.end_time)
                .await?;
            return match current.remote_stream_name {
                Some(existing) => {
                    tracing::info!(
                        clip_id = %record.id,
                        stream_name = %existing,
                        "Concurrent request assigned the stream first, forwarding its name"
                    );
                    Ok(existing)
                }
                None => Err(AppError::InconsistentClipState(format!(
                    "clip {} vanished while assigning stream name",
                    record.id
                ))),
            };
        }

        Ok(stream_name)
    }

    /// Re-upload an expired clip under its existing name so prior share
    /// links keep working.
    async fn upload_again(
        &self,
        params: &StreamRequestParams,
        record: &ClipRecord,
        stream_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        tracing::info!(
            clip_id = %record.id,
            stream_name = %stream_name,
            "Remote stream expired, requesting re-upload"
        );
        let expires_at = now + Duration::days(self.retention_days(params));

        self.edge
            .request_upload(
                params.camera_id,
                stream_name,
                &params.resolution,
                self.retention_days(params),
            )
            .await?;

        let updated = self
            .clips
            .update_stream_name_and_expiration(record.id, stream_name, expires_at)
            .await?;
        if !updated {
            return Err(AppError::InconsistentClipState(format!(
                "clip {} vanished while refreshing expiration",
                record.id
            )));
        }
        Ok(())
    }

    /// Cameras can be reassigned between requests, leaving the persisted
    /// stream name carrying an old base. The persisted name stays
    /// authoritative: keep using it, but log the mismatch so the drift is
    /// visible.
    fn reconcile_base_name(&self, params: &StreamRequestParams, stored: &str) -> String {
        let expected_prefix = format!(
            "{}{}",
            identity::sanitize_base(&params.stream_hash),
            identity::time_window_suffix(params.start_time, params.end_time)
        );
        if !stored.starts_with(&expected_prefix) {
            tracing::warn!(
                camera_id = %params.camera_id,
                stored_stream = %stored,
                "Persisted stream name predates a camera reassignment, forwarding it"
            );
        }
        stored.to_string()
    }

    /// Bring the provider's retention in line with a non-view replay and
    /// record the new expiration on the clip. The remote bump and the local
    /// write are not atomic; when the local write fails the record expires
    /// early and the next replay re-uploads. Failures are logged, never
    /// surfaced: playback must not depend on the retention API.
    async fn sync_retention(
        &self,
        stream_name: &str,
        record: &ClipRecord,
        params: &StreamRequestParams,
        now: DateTime<Utc>,
    ) {
        let expires_at = now + Duration::days(self.retention_days(params));
        if let Err(e) = self.retention.bump(stream_name, expires_at).await {
            tracing::warn!(
                stream_name = %stream_name,
                error = %e,
                "Failed to synchronize provider retention"
            );
            return;
        }

        match self
            .clips
            .update_stream_name_and_expiration(record.id, stream_name, expires_at)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                clip_id = %record.id,
                "Clip record disappeared while recording the bumped expiration"
            ),
            Err(e) => tracing::warn!(
                clip_id = %record.id,
                error = %e,
                "Failed to record the bumped expiration locally"
            ),
        }
    }

    /// Build the gateway playback URL and record its session. The session
    /// is recorded before the URL is returned so the playlist relay can
    /// fail closed on everything it has never seen.
    async fn issue_playable_url(
        &self,
        params: &StreamRequestParams,
        stream_name: &str,
        now: DateTime<Utc>,
    ) -> Result<PlayableUrl, AppError> {
        let session_token = Uuid::new_v4().to_string();
        let original_url = self.provider.playback_url(stream_name, now)?;

        let mut url = url::Url::parse(&format!("{}/master-playlist", self.public_base_url))
            .map_err(|e| AppError::Internal(format!("invalid public base URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("SessionToken", &session_token)
            .append_pair("OriginalUrl", &original_url)
            .append_pair("StreamName", stream_name)
            .append_pair("StartTime", &params.start_time.to_rfc3339())
            .append_pair("EndTime", &params.end_time.to_rfc3339());

        let session = HlsSession {
            session_token: session_token.clone(),
            stream_name: stream_name.to_string(),
            start_time: params.start_time,
            end_time: params.end_time,
        };
        self.sessions.record(&session).await?;

        Ok(PlayableUrl {
            url: url.to_string(),
            stream_name: stream_name.to_string(),
            session_token,
        })
    }

    fn retention_days(&self, params: &StreamRequestParams) -> i64 {
        params.retention_days.unwrap_or(self.default_retention_days)
    }
}
