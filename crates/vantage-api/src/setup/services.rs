//! Gateway service wiring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::PgPool;

use vantage_core::Config;
use vantage_db::ClipRepository;
use vantage_gateway::{
    ClipUploadOrchestrator, EdgeMessenger, HttpEdgeMessenger, MemorySessionStore, PlaylistRelay,
    ProviderClient, RedisSessionStore, SessionRegistry, SessionStore, Signer, SigningCredentials,
    StreamingProvider,
};

use crate::state::{AppState, DbState, GatewayState};

/// Build all gateway services and assemble the application state.
pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs()))
        .build()?;

    let signer = Signer::new(
        config.provider_bucket().to_string(),
        config.provider_region().to_string(),
        SigningCredentials {
            access_key: config.aws_access_key_id().to_string(),
            secret_key: config.aws_secret_access_key().to_string(),
            session_token: config.aws_session_token().map(String::from),
        },
    );

    let provider: Arc<dyn StreamingProvider> = Arc::new(ProviderClient::new(
        http.clone(),
        config.provider_endpoint().to_string(),
        signer,
    ));

    let edge: Arc<dyn EdgeMessenger> = Arc::new(HttpEdgeMessenger::new(
        http,
        config.edge_broker_url().to_string(),
    ));

    let store: Arc<dyn SessionStore> = match config.redis_url() {
        Some(redis_url) => {
            tracing::info!("Using Redis session store");
            Arc::new(RedisSessionStore::connect(redis_url).await?)
        }
        None => {
            tracing::warn!("REDIS_URL not set, sessions are held in process memory");
            Arc::new(MemorySessionStore::new())
        }
    };
    let sessions = SessionRegistry::new(store, Duration::from_secs(config.session_ttl_secs()));

    let clip_repository = ClipRepository::new(pool.clone());

    let orchestrator = Arc::new(ClipUploadOrchestrator::new(
        Arc::new(clip_repository.clone()),
        edge,
        provider.clone(),
        sessions.clone(),
        config.default_retention_days(),
        config.public_base_url().to_string(),
    ));

    let relay = Arc::new(PlaylistRelay::new(
        provider,
        sessions,
        config.public_base_url().to_string(),
        config.media_playlist_path_prefix().to_string(),
    ));

    Ok(Arc::new(AppState {
        db: DbState {
            pool,
            clip_repository,
        },
        gateway: GatewayState {
            orchestrator,
            relay,
        },
        config: config.clone(),
        is_production: config.is_production(),
    }))
}
