//! Application state and sub-state extractors.
//!
//! AppState is split into sub-states so handlers can extract only what they
//! need via Axum's `FromRef`.

use std::sync::Arc;

use sqlx::PgPool;

use vantage_core::Config;
use vantage_db::ClipRepository;
use vantage_gateway::{ClipUploadOrchestrator, PlaylistRelay};

// ----- Sub-state types -----

/// Database pool and clip repository.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub clip_repository: ClipRepository,
}

/// Gateway services driving playback and playlist relaying.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<ClipUploadOrchestrator>,
    pub relay: Arc<PlaylistRelay>,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub gateway: GatewayState,
    pub config: Config,
    pub is_production: bool,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for GatewayState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.gateway.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
