use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded playlist session. Written to the session cache when a playable
/// URL is handed out, refreshed when the master playlist is served, and
/// consulted (never mutated) by media-playlist fetches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HlsSession {
    pub session_token: String,
    pub stream_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl HlsSession {
    /// Cache key for a (token, stream) pair. A token recorded for stream A
    /// must never validate a fetch for stream B.
    pub fn cache_key(session_token: &str, stream_name: &str) -> String {
        format!("{}-{}", session_token, stream_name)
    }

    pub fn key(&self) -> String {
        Self::cache_key(&self.session_token, &self.stream_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_binds_token_to_stream() {
        let a = HlsSession::cache_key("tok", "stream-a");
        let b = HlsSession::cache_key("tok", "stream-b");
        assert_ne!(a, b);
        assert_eq!(a, "tok-stream-a");
    }
}
