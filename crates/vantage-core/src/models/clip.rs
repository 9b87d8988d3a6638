use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AppError;

/// Why a playback URL is being requested. Shared-style purposes (shared,
/// anonymous, alert) reuse one deterministic remote stream per clip window;
/// the others get a fresh stream name per request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestPurpose {
    /// Create the clip (operator export).
    Create,
    /// View an existing clip; never bumps retention.
    View,
    /// Link shared with another user.
    Shared,
    /// Anonymous/public share link.
    Anonymous,
    /// Clip attached to an alert notification.
    Alert,
}

impl RequestPurpose {
    /// Shared-style purposes reuse the deterministic `_shared` stream name.
    pub fn uses_shared_name(self) -> bool {
        matches!(
            self,
            RequestPurpose::Shared | RequestPurpose::Anonymous | RequestPurpose::Alert
        )
    }

    /// View-only requests never extend the remote retention window.
    pub fn is_view_only(self) -> bool {
        matches!(self, RequestPurpose::View)
    }
}

impl Display for RequestPurpose {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RequestPurpose::Create => write!(f, "create"),
            RequestPurpose::View => write!(f, "view"),
            RequestPurpose::Shared => write!(f, "shared"),
            RequestPurpose::Anonymous => write!(f, "anonymous"),
            RequestPurpose::Alert => write!(f, "alert"),
        }
    }
}

impl std::str::FromStr for RequestPurpose {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(RequestPurpose::Create),
            "view" => Ok(RequestPurpose::View),
            "shared" => Ok(RequestPurpose::Shared),
            "anonymous" => Ok(RequestPurpose::Anonymous),
            "alert" => Ok(RequestPurpose::Alert),
            other => Err(AppError::InvalidInput(format!(
                "Unknown request purpose '{}'",
                other
            ))),
        }
    }
}

/// Requested stream resolution: either pinned for the lifetime of the
/// request or a preference the edge device may renegotiate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ResolutionSpec {
    Static { resolution: String },
    Dynamic { preferred: String },
}

impl ResolutionSpec {
    /// The resolution label sent to the edge device (e.g. "1080p").
    pub fn label(&self) -> &str {
        match self {
            ResolutionSpec::Static { resolution } => resolution,
            ResolutionSpec::Dynamic { preferred } => preferred,
        }
    }
}

/// Input to every gateway operation: which camera, which time window, at
/// what resolution, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRequestParams {
    pub camera_id: Uuid,
    /// Per-camera opaque stream token ("stream hash"); the base of every
    /// derived remote stream name.
    pub stream_hash: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resolution: ResolutionSpec,
    /// Retention override in days; falls back to the configured default.
    pub retention_days: Option<i64>,
    pub purpose: RequestPurpose,
}

impl StreamRequestParams {
    /// Reject windows that end before they start.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.end_time < self.start_time {
            return Err(AppError::InvalidInput(format!(
                "end_time {} is before start_time {}",
                self.end_time, self.start_time
            )));
        }
        Ok(())
    }
}

/// A clip metadata record as persisted by the clip repository.
///
/// Created at most once per (camera, start, end) tuple; the remote stream
/// name and expiration stay unset until the first upload is requested.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClipRecord {
    pub id: Uuid,
    pub camera_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub remote_stream_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClipRecord {
    /// Whether the persisted expiration has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at < now,
            None => false,
        }
    }
}

/// The gateway's answer to a playback request: a URL the player can open,
/// plus the session token the playlist relay will validate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlayableUrl {
    pub url: String,
    pub stream_name: String,
    pub session_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_purpose_shared_name_classification() {
        assert!(RequestPurpose::Shared.uses_shared_name());
        assert!(RequestPurpose::Anonymous.uses_shared_name());
        assert!(RequestPurpose::Alert.uses_shared_name());
        assert!(!RequestPurpose::Create.uses_shared_name());
        assert!(!RequestPurpose::View.uses_shared_name());
    }

    #[test]
    fn test_purpose_parse_round_trip() {
        for purpose in [
            RequestPurpose::Create,
            RequestPurpose::View,
            RequestPurpose::Shared,
            RequestPurpose::Anonymous,
            RequestPurpose::Alert,
        ] {
            let parsed: RequestPurpose = purpose.to_string().parse().expect("parse");
            assert_eq!(parsed, purpose);
        }
        assert!("replay".parse::<RequestPurpose>().is_err());
    }

    #[test]
    fn test_params_validate_rejects_inverted_window() {
        let params = StreamRequestParams {
            camera_id: Uuid::new_v4(),
            stream_hash: "cam1".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            resolution: ResolutionSpec::Static {
                resolution: "720p".to_string(),
            },
            retention_days: None,
            purpose: RequestPurpose::View,
        };
        assert!(params.validate().is_err());
    }
}
