//! Image upload to the external object-storage service.
//!
//! The core depends on the `ObjectStorage` trait; production talks to a
//! Cloudinary-style HTTP API. Upload failures return `None` rather than an
//! error, so callers degrade to "no image" instead of failing the operation.

use crate::config::StorageConfig;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

/// Object-storage collaborator.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads the file and returns its public URL, or `None` on failure.
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Option<String>;

    /// Deletes a previously uploaded object. Best-effort.
    async fn delete(&self, public_id: &str);
}

/// Derives the storage public id from a delivery URL.
///
/// Example: `https://res.cloudinary.com/demo/image/upload/v1/sample.jpg`
/// yields `sample`.
pub fn extract_public_id(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    let last = url.rsplit('/').next()?;
    let id = last.split('.').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

pub struct StorageService {
    client: reqwest::Client,
    config: StorageConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl StorageService {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/auto/upload",
            self.config.cloud_name
        )
    }

    fn destroy_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/resources/image/upload",
            self.config.cloud_name
        )
    }
}

#[async_trait]
impl ObjectStorage for StorageService {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Option<String> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .part("file", part);

        let result = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<UploadResponse>().await {
                    Ok(body) => Some(body.secure_url),
                    Err(e) => {
                        warn!("Unexpected upload response: {e}");
                        None
                    }
                }
            }
            Ok(response) => {
                warn!("Image upload rejected with status {}", response.status());
                None
            }
            Err(e) => {
                warn!("Image upload failed: {e}");
                None
            }
        }
    }

    async fn delete(&self, public_id: &str) {
        if public_id.is_empty() {
            return;
        }

        let result = self
            .client
            .delete(self.destroy_url())
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&[("public_ids[]", public_id), ("invalidate", "true")])
            .send()
            .await;

        if let Err(e) = result {
            warn!("Failed to delete stored image {public_id}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_public_id() {
        assert_eq!(
            extract_public_id("https://res.cloudinary.com/demo/image/upload/v1570979139/sample.jpg")
                .as_deref(),
            Some("sample")
        );
        assert_eq!(extract_public_id("plain"), Some("plain".to_string()));
        assert_eq!(extract_public_id(""), None);
    }
}
