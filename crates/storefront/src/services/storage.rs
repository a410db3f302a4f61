//! Hosted object storage client for product and slide images.
//!
//! Uploads use the service-role key and overwrite existing objects. Images are
//! served straight from the bucket's public URL.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::BackendConfig;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/avif",
];

/// Errors from storage uploads.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage answered with an error status.
    #[error("storage error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Not an accepted image type.
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    /// Upload exceeds [`MAX_UPLOAD_BYTES`].
    #[error("file too large: {0} bytes")]
    TooLarge(usize),

    #[error("file is empty")]
    Empty,
}

/// Check an upload before it is sent.
///
/// # Errors
///
/// Returns the first rule the upload breaks.
pub fn validate_upload(content_type: &str, len: usize) -> Result<(), StorageError> {
    if len == 0 {
        return Err(StorageError::Empty);
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(StorageError::TooLarge(len));
    }
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
        return Err(StorageError::UnsupportedType(content_type.to_string()));
    }
    Ok(())
}

/// Object path for an uploaded file: `products/<uuid>.<ext>`.
///
/// Only a short alphanumeric extension from the original name survives.
#[must_use]
pub fn object_path_for(file_name: &str) -> String {
    let id = uuid::Uuid::new_v4();
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });
    match extension {
        Some(ext) => format!("products/{id}.{ext}"),
        None => format!("products/{id}"),
    }
}

/// Client for the hosted object storage API.
#[derive(Clone)]
pub struct StorageClient {
    inner: Arc<StorageClientInner>,
}

struct StorageClientInner {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: SecretString,
}

impl StorageClient {
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            inner: Arc::new(StorageClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.trim_end_matches('/').to_string(),
                bucket: config.storage_bucket.clone(),
                service_key: config.service_key.clone(),
            }),
        }
    }

    /// Upload `bytes` to `path` in the configured bucket, replacing any
    /// existing object. Returns the stored path.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid uploads or when storage rejects the request.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_upload(content_type, bytes.len())?;

        let url = format!(
            "{}/storage/v1/object/{}/{path}",
            self.inner.base_url, self.inner.bucket
        );
        let key = self.inner.service_key.expose_secret();
        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(key)
            .header("apikey", key)
            .header("x-upsert", "true")
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api { status, message });
        }

        tracing::info!(path, "Uploaded object");
        Ok(path.to_string())
    }

    /// Public URL of an object in the configured bucket.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.inner.base_url,
            self.inner.bucket,
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_object_path_keeps_sanitized_extension() {
        let path = object_path_for("Summer Sale.JPG");
        assert!(path.starts_with("products/"));
        assert!(path.ends_with(".jpg"));

        let path = object_path_for("../../etc/passwd");
        assert!(!path.contains(".."));
        assert!(!path.contains("etc"));

        let path = object_path_for("photo.php%00.png.exe<script>");
        assert_eq!(path.matches('.').count(), 0);
    }

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload("image/png", 1024).is_ok());
        assert!(validate_upload("image/jpeg; charset=binary", 1024).is_ok());
        assert!(matches!(validate_upload("image/png", 0), Err(StorageError::Empty)));
        assert!(matches!(
            validate_upload("image/png", MAX_UPLOAD_BYTES + 1),
            Err(StorageError::TooLarge(_))
        ));
        assert!(matches!(
            validate_upload("image/svg+xml", 1024),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_public_url() {
        let client = StorageClient::new(&test_config().backend);
        assert_eq!(
            client.public_url("products/a.png"),
            "https://abc.backend.test/storage/v1/object/public/product-images/products/a.png"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_before_network() {
        let client = StorageClient::new(&test_config().backend);
        let result = client.upload("products/a.txt", b"hello".to_vec(), "text/plain").await;
        assert!(matches!(result, Err(StorageError::UnsupportedType(_))));
    }
}
