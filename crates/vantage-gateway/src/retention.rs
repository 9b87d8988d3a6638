//! Retention synchronization.
//!
//! The clip repository is the source of truth for how long a remote stream
//! must be kept; the provider enforces its own copy of that deadline. When a
//! persisted clip is replayed with a retention window that outlives the
//! provider's, the provider side is bumped to match.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use vantage_core::AppError;

use crate::provider::StreamingProvider;

pub struct RetentionSynchronizer {
    provider: Arc<dyn StreamingProvider>,
}

impl RetentionSynchronizer {
    pub fn new(provider: Arc<dyn StreamingProvider>) -> Self {
        Self { provider }
    }

    /// Push a new retention deadline to the provider. A failure here must
    /// not fail playback, so callers log and continue; the persisted
    /// deadline is re-pushed on the next replay.
    pub async fn bump(
        &self,
        stream_name: &str,
        new_expiration: DateTime<Utc>,
    ) -> Result<(), AppError> {
        tracing::debug!(
            stream_name = %stream_name,
            expires_at = %new_expiration,
            "Synchronizing provider retention"
        );
        self.provider
            .update_retention(stream_name, new_expiration)
            .await
    }
}
