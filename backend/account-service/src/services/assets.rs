//! External binary-asset host collaborator.
//!
//! The service never stores image bytes itself; uploads are forwarded to a
//! third-party asset host and only the returned URL is persisted.
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::AssetHostConfig;
use crate::error::{AppError, Result};

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub url: String,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload raw bytes under the given filename and return the hosted URL.
    async fn upload(&self, data: Vec<u8>, filename: &str) -> Result<UploadedAsset>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// HTTP client for the asset host's multipart upload endpoint.
pub struct HttpAssetStore {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
}

impl HttpAssetStore {
    pub fn new(config: &AssetHostConfig) -> Self {
        HttpAssetStore {
            client: reqwest::Client::new(),
            upload_url: config.upload_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, data: Vec<u8>, filename: &str) -> Result<UploadedAsset> {
        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.client.post(&self.upload_url).multipart(form);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Asset host unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Asset host returned status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Malformed asset host response: {}", e)))?;

        tracing::debug!(url = %body.secure_url, "asset uploaded");
        Ok(UploadedAsset {
            url: body.secure_url,
        })
    }
}
