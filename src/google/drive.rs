//! Drive file download: file id → raw bytes.
//!
//! The fetcher drains the whole media download before returning — callers
//! never see a partial file, so a truncated image cannot masquerade as a
//! decodable one further down the pipeline. Requests carry a client-level
//! timeout.

use crate::error::IntakeError;
use crate::google::auth::ServiceAccountAuth;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Seam between the pipeline and cloud file storage.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Download the file's full contents.
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, IntakeError>;
}

/// Drive v3 `files/{id}?alt=media` client.
pub struct DriveFiles {
    auth: Arc<ServiceAccountAuth>,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl DriveFiles {
    pub fn new(auth: Arc<ServiceAccountAuth>, timeout_secs: u64) -> Result<Self, IntakeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| IntakeError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            auth,
            client,
            timeout_secs,
        })
    }
}

#[async_trait]
impl FileStore for DriveFiles {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, IntakeError> {
        info!("Downloading Drive file {}", file_id);
        let token = self.auth.access_token().await?;

        let url = format!(
            "https://www.googleapis.com/drive/v3/files/{file_id}?alt=media"
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IntakeError::DownloadTimeout {
                        file_id: file_id.to_string(),
                        secs: self.timeout_secs,
                    }
                } else {
                    IntakeError::DownloadFailed {
                        file_id: file_id.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(IntakeError::DownloadFailed {
                file_id: file_id.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        // Drain the full body; partial reads are never exposed.
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                IntakeError::DownloadTimeout {
                    file_id: file_id.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                IntakeError::DownloadFailed {
                    file_id: file_id.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        debug!("Downloaded {} bytes for file {}", bytes.len(), file_id);
        Ok(bytes.to_vec())
    }
}
