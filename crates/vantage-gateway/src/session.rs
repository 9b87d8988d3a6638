//! Session store: a thin wrapper over a shared TTL key-value cache.
//!
//! Playlist sessions live under `{token}-{stream_name}` keys with a 24-hour
//! TTL. Expiry is advisory: the backing store's clock decides, and callers
//! must tolerate a session dropping slightly before or after its nominal
//! boundary.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use vantage_core::models::HlsSession;
use vantage_core::AppError;

/// Generic per-key TTL cache contract. Keys are plain strings; values are
/// serialized JSON.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
}

/// Redis-backed store for multi-node deployments.
#[derive(Clone)]
pub struct RedisSessionStore {
    manager: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Cache(format!("invalid redis URL: {}", e)))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Cache(format!("redis connection failed: {}", e)))?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|e| AppError::Cache(format!("redis SETEX failed: {}", e)))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| AppError::Cache(format!("redis GET failed: {}", e)))
    }
}

/// In-process store for tests and single-node deployments. Entries are
/// evicted lazily on read.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut entries = self.entries.lock().expect("session store poisoned");
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut entries = self.entries.lock().expect("session store poisoned");
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Records and validates playlist sessions on top of a [`SessionStore`].
#[derive(Clone)]
pub struct SessionRegistry {
    store: std::sync::Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(store: std::sync::Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Write (or refresh) a session under its `{token}-{stream}` key.
    pub async fn record(&self, session: &HlsSession) -> Result<(), AppError> {
        let value = serde_json::to_string(session)?;
        self.store.set(&session.key(), &value, self.ttl).await
    }

    /// Validate a (token, stream) pair; fails closed when the key is absent
    /// or unreadable.
    pub async fn check(
        &self,
        session_token: &str,
        stream_name: &str,
    ) -> Result<HlsSession, AppError> {
        let key = HlsSession::cache_key(session_token, stream_name);
        let value = self.store.get(&key).await?.ok_or_else(|| {
            AppError::SessionNotFound(format!(
                "no session for token {} and stream {}",
                session_token, stream_name
            ))
        })?;
        let session: HlsSession = serde_json::from_str(&value)
            .map_err(|e| AppError::Cache(format!("corrupt session record: {}", e)))?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use std::sync::Arc;

    fn session(token: &str, stream: &str) -> HlsSession {
        HlsSession {
            session_token: token.to_string(),
            stream_name: stream.to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap(),
        }
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(MemorySessionStore::new()),
            Duration::from_secs(86_400),
        )
    }

    #[tokio::test]
    async fn test_unknown_token_fails_for_every_stream() {
        let registry = registry();
        for stream in ["stream-a", "stream-b"] {
            let err = registry.check("never-written", stream).await.unwrap_err();
            assert!(matches!(err, AppError::SessionNotFound(_)));
        }
    }

    #[tokio::test]
    async fn test_token_is_bound_to_its_stream() {
        let registry = registry();
        registry.record(&session("tok", "stream-a")).await.unwrap();

        let found = registry.check("tok", "stream-a").await.unwrap();
        assert_eq!(found.stream_name, "stream-a");

        let err = registry.check("tok", "stream-b").await.unwrap_err();
        assert!(matches!(err, AppError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_expired_entries_read_as_absent() {
        let store = MemorySessionStore::new();
        store
            .set("k", "v", Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
