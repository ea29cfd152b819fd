//! Object store client for gallery uploads.
//!
//! Speaks the storage HTTP API directly: an authenticated POST puts the
//! bytes under a bucket path, and the public URL for that path is a stable
//! address that never changes meaning once issued (no signing, no expiry).
//!
//! Object keys carry a millisecond timestamp plus a random token, so
//! concurrent uploads from the same editing session can never collide on a
//! storage key.
//!
//! This client does not retry. A failed upload surfaces as [`StoreError`]
//! and the editor tells the user to try again; the rest of the gallery edit
//! is unaffected.

use rand::distr::{Alphanumeric, SampleString};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use tandem_core::AssetLocator;

use crate::config::BlobStoreConfig;

/// Cache policy for stored assets: immutable content under unique keys.
const CACHE_MAX_AGE_SECS: u64 = 31_536_000;

/// Length of the random token in object keys.
const KEY_TOKEN_LEN: usize = 8;

/// Errors from the object store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request never completed (DNS, connect, timeout).
    #[error("upload request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("object store rejected upload ({status}): {body}")]
    Backend { status: u16, body: String },
}

/// Client for the gallery image bucket.
#[derive(Clone)]
pub struct BlobStoreClient {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: SecretString,
}

impl std::fmt::Debug for BlobStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStoreClient")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("service_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl BlobStoreClient {
    /// Create a new client from configuration.
    #[must_use]
    pub fn new(config: &BlobStoreConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
        }
    }

    /// Upload bytes under `path` and return the stored path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on transport failure or a non-success backend
    /// response. Never retries.
    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, path = %path, size = bytes.len()))]
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let url = format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.service_key.expose_secret())
            .header("content-type", content_type)
            .header(
                "cache-control",
                format!("max-age={CACHE_MAX_AGE_SECS}, immutable"),
            )
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        debug!(path = %path, "asset uploaded");

        Ok(path.to_string())
    }

    /// Public, stable retrieval URL for a stored path.
    #[must_use]
    pub fn public_url(&self, stored_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{stored_path}",
            self.base_url, self.bucket
        )
    }

    /// Transcoded bytes in, stable locator out.
    ///
    /// Composes a collision-resistant object key under `folder`, uploads,
    /// and returns the public locator for the gallery to reference.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the upload fails.
    pub async fn store(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        extension: &str,
        folder: &str,
    ) -> Result<AssetLocator, StoreError> {
        let key = object_key(folder, extension);
        let stored_path = self.upload(&key, bytes, content_type).await?;
        Ok(AssetLocator::new(self.public_url(&stored_path)))
    }
}

/// Build an object key: `{folder}/{unix_millis}-{token}.{extension}`.
fn object_key(folder: &str, extension: &str) -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let token = Alphanumeric
        .sample_string(&mut rand::rng(), KEY_TOKEN_LEN)
        .to_lowercase();

    format!("{folder}/{millis}-{token}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> BlobStoreClient {
        BlobStoreClient::new(&BlobStoreConfig {
            base_url: "https://blob.test".to_string(),
            bucket: "images".to_string(),
            service_key: SecretString::from("test-service-key"),
        })
    }

    #[test]
    fn test_object_key_shape() {
        let key = object_key("products", "jpg");

        let (folder, file) = key.split_once('/').expect("folder separator");
        assert_eq!(folder, "products");
        assert!(file.ends_with(".jpg"));

        let stem = file.trim_end_matches(".jpg");
        let (millis, token) = stem.split_once('-').expect("timestamp separator");
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(token.len(), KEY_TOKEN_LEN);
    }

    #[test]
    fn test_object_keys_do_not_collide() {
        let a = object_key("products", "png");
        let b = object_key("products", "png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_public_url_is_stable_and_unsigned() {
        let client = test_client();
        let url = client.public_url("products/123-abcd1234.png");

        assert_eq!(
            url,
            "https://blob.test/storage/v1/object/public/images/products/123-abcd1234.png"
        );
        // Same input, same address - nothing time-dependent in the URL.
        assert_eq!(url, client.public_url("products/123-abcd1234.png"));
    }

    #[test]
    fn test_debug_redacts_service_key() {
        let output = format!("{:?}", test_client());
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("test-service-key"));
    }
}
