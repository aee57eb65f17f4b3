use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::common::DEFAULT_SOURCE_CONTENT_TYPE;
use crate::storage::{BlobStore, SourceImage, ensure_success};

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// One bucket of the object storage API exposed under `/storage/v1`.
#[derive(Clone)]
pub struct StorageBucket {
    storage_url: String,
    bucket: String,
    service_key: String,
    client: Client,
}

impl StorageBucket {
    pub fn new(
        base_url: impl AsRef<str>,
        bucket: impl Into<String>,
        service_key: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            storage_url: format!("{}/storage/v1", base_url.as_ref().trim_end_matches('/')),
            bucket: bucket.into(),
            service_key: service_key.into(),
            client,
        }
    }

    fn object_url(&self, path: &str) -> Result<Url> {
        self.encoded_url(&["object"], path)
    }

    fn sign_url(&self, path: &str) -> Result<Url> {
        self.encoded_url(&["object", "sign"], path)
    }

    /// `{storage}/{prefix..}/{bucket}/{path}` with every path segment
    /// percent-encoded, so `?` and `#` stay part of the object name.
    fn encoded_url(&self, prefix: &[&str], path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.storage_url)
            .with_context(|| format!("Invalid storage URL: {}", self.storage_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Storage URL cannot carry a path: {}", self.storage_url))?
            .pop_if_empty()
            .extend(prefix.iter().copied())
            .push(&self.bucket)
            .extend(path.trim_start_matches('/').split('/'));
        Ok(url)
    }

    /// The API answers with a URL relative to the storage root.
    fn absolute_signed_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else {
            format!("{}/{}", self.storage_url, signed.trim_start_matches('/'))
        }
    }
}

#[rocket::async_trait]
impl BlobStore for StorageBucket {
    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String> {
        let response = self
            .client
            .post(self.sign_url(path)?)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({ "expiresIn": ttl.as_secs().max(1) }))
            .send()
            .await
            .with_context(|| format!("Failed to reach storage to sign {}", path))?;

        let response = ensure_success(response, "Signing").await?;
        let signed: SignedUrlResponse = response
            .json()
            .await
            .context("Failed to decode signed URL response")?;

        if signed.signed_url.is_empty() {
            return Err(anyhow!("Storage returned an empty signed URL for {}", path));
        }
        Ok(self.absolute_signed_url(&signed.signed_url))
    }

    async fn download(&self, signed_url: &str) -> Result<SourceImage> {
        let response = self
            .client
            .get(signed_url)
            .send()
            .await
            .context("Failed to reach storage for download")?;

        let response = ensure_success(response, "Download").await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_SOURCE_CONTENT_TYPE)
            .to_string();
        let bytes = response
            .bytes()
            .await
            .context("Failed to read downloaded image body")?;

        Ok(SourceImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let response = self
            .client
            .post(self.object_url(path)?)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("Failed to reach storage to upload {}", path))?;

        ensure_success(response, "Upload").await?;
        Ok(())
    }
}
