//! Configuration module
//!
//! Configuration for the video access gateway, loaded from environment
//! variables (with `.env` support via dotenvy). Provider credentials and the
//! database URL are required; everything else has a sensible default.

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETENTION_DAYS: i64 = 30;
const SESSION_TTL_SECS: u64 = 86_400;
const HTTP_TIMEOUT_SECS: u64 = 15;

/// Gateway configuration assembled from the environment.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    // Persistence
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Session cache
    pub redis_url: Option<String>,
    pub session_ttl_secs: u64,
    // Streaming provider
    pub provider_bucket: String,
    pub provider_region: String,
    pub provider_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_session_token: Option<String>,
    // Edge messaging
    pub edge_broker_url: String,
    // Gateway surface
    pub public_base_url: String,
    pub media_playlist_path_prefix: String,
    // Behavior
    pub default_retention_days: i64,
    pub http_timeout_secs: u64,
}

/// Application configuration wrapper.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GatewayConfig>);

impl Config {
    fn inner(&self) -> &GatewayConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let config = GatewayConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            database_url: env::var("GATEWAY_DATABASE_URL")
                .or_else(|_| env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("GATEWAY_DATABASE_URL or DATABASE_URL must be set")
                })?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            redis_url: env::var("REDIS_URL").ok(),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| SESSION_TTL_SECS.to_string())
                .parse()
                .unwrap_or(SESSION_TTL_SECS),
            provider_bucket: env::var("PROVIDER_BUCKET")
                .map_err(|_| anyhow::anyhow!("PROVIDER_BUCKET must be set"))?,
            provider_region: env::var("PROVIDER_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| "us-east-1".to_string()),
            provider_endpoint: env::var("PROVIDER_ENDPOINT")
                .map_err(|_| anyhow::anyhow!("PROVIDER_ENDPOINT must be set"))?,
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID")
                .map_err(|_| anyhow::anyhow!("AWS_ACCESS_KEY_ID must be set"))?,
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY")
                .map_err(|_| anyhow::anyhow!("AWS_SECRET_ACCESS_KEY must be set"))?,
            aws_session_token: env::var("AWS_SESSION_TOKEN").ok(),
            edge_broker_url: env::var("EDGE_BROKER_URL")
                .map_err(|_| anyhow::anyhow!("EDGE_BROKER_URL must be set"))?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string())
                .trim_end_matches('/')
                .to_string(),
            media_playlist_path_prefix: env::var("MEDIA_PLAYLIST_PATH_PREFIX")
                .unwrap_or_else(|_| "getHLSMediaPlaylist.m3u8".to_string()),
            default_retention_days: env::var("DEFAULT_RETENTION_DAYS")
                .unwrap_or_else(|_| DEFAULT_RETENTION_DAYS.to_string())
                .parse()
                .unwrap_or(DEFAULT_RETENTION_DAYS),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HTTP_TIMEOUT_SECS),
        };

        Ok(Config(Box::new(config)))
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.inner().redis_url.as_deref()
    }

    pub fn session_ttl_secs(&self) -> u64 {
        self.inner().session_ttl_secs
    }

    pub fn provider_bucket(&self) -> &str {
        &self.inner().provider_bucket
    }

    pub fn provider_region(&self) -> &str {
        &self.inner().provider_region
    }

    pub fn provider_endpoint(&self) -> &str {
        &self.inner().provider_endpoint
    }

    pub fn aws_access_key_id(&self) -> &str {
        &self.inner().aws_access_key_id
    }

    pub fn aws_secret_access_key(&self) -> &str {
        &self.inner().aws_secret_access_key
    }

    pub fn aws_session_token(&self) -> Option<&str> {
        self.inner().aws_session_token.as_deref()
    }

    pub fn edge_broker_url(&self) -> &str {
        &self.inner().edge_broker_url
    }

    pub fn public_base_url(&self) -> &str {
        &self.inner().public_base_url
    }

    pub fn media_playlist_path_prefix(&self) -> &str {
        &self.inner().media_playlist_path_prefix
    }

    pub fn default_retention_days(&self) -> i64 {
        self.inner().default_retention_days
    }

    pub fn http_timeout_secs(&self) -> u64 {
        self.inner().http_timeout_secs
    }
}
