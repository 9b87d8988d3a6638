//! Edge upload messaging.
//!
//! Clip uploads are initiated by telling the camera's edge device, via the
//! message broker, to push a named stream to the provider. Delivery is
//! at-most-once: a transport failure surfaces as `UploadRequestError` and the
//! caller must not persist any state that assumes the command was received.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use vantage_core::models::ResolutionSpec;
use vantage_core::AppError;

/// Command published to the edge device.
#[derive(Debug, Serialize)]
struct UploadCommand<'a> {
    stream_name: &'a str,
    resolution: &'a str,
    dynamic_resolution: bool,
    retention_days: i64,
}

/// Sends upload commands toward a camera's edge device.
#[async_trait]
pub trait EdgeMessenger: Send + Sync {
    async fn request_upload(
        &self,
        camera_id: Uuid,
        stream_name: &str,
        resolution: &ResolutionSpec,
        retention_days: i64,
    ) -> Result<(), AppError>;
}

/// Broker-backed messenger. Publishes over HTTP to the broker, which relays
/// the command down the camera's persistent connection.
pub struct HttpEdgeMessenger {
    client: reqwest::Client,
    broker_url: String,
}

impl HttpEdgeMessenger {
    pub fn new(client: reqwest::Client, broker_url: String) -> Self {
        Self {
            client,
            broker_url: broker_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EdgeMessenger for HttpEdgeMessenger {
    async fn request_upload(
        &self,
        camera_id: Uuid,
        stream_name: &str,
        resolution: &ResolutionSpec,
        retention_days: i64,
    ) -> Result<(), AppError> {
        let command = UploadCommand {
            stream_name,
            resolution: resolution.label(),
            dynamic_resolution: matches!(resolution, ResolutionSpec::Dynamic { .. }),
            retention_days,
        };
        let url = format!("{}/cameras/{}/uploads", self.broker_url, camera_id);

        tracing::info!(
            camera_id = %camera_id,
            stream_name = %stream_name,
            "Requesting clip upload from edge device"
        );

        let response = self
            .client
            .post(&url)
            .json(&command)
            .send()
            .await
            .map_err(|e| AppError::UploadRequest(format!("broker unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UploadRequest(format!(
                "broker rejected upload command with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
