//! Outbound storage adapters.
//!
//! The orchestrator talks to two collaborators:
//! - a metadata store holding the `items` rows
//! - a blob store holding the original and cutout images
//!
//! Both are traits so the pipeline can run against the hosted HTTP APIs in
//! production and against in-memory doubles in tests.

pub mod bucket;
pub mod item;
pub mod rest;

use anyhow::{Result, bail};
use std::time::Duration;

pub use bucket::StorageBucket;
pub use item::{ImageProcessingStatus, ItemId, ItemRecord, ItemUpdate};
pub use rest::RestMetadataStore;

/// Raw bytes of the original image together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[rocket::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read one item by id. `Ok(None)` means the row does not exist.
    async fn fetch_item(&self, id: &ItemId) -> Result<Option<ItemRecord>>;

    /// Apply `update` to the item in a single write.
    async fn update_item(&self, id: &ItemId, update: &ItemUpdate) -> Result<()>;
}

#[rocket::async_trait]
pub trait BlobStore: Send + Sync {
    /// Issue a credential-free read URL for `path`, valid for `ttl`.
    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String>;

    /// Download the object behind a URL previously returned by
    /// [`BlobStore::create_signed_url`].
    async fn download(&self, signed_url: &str) -> Result<SourceImage>;

    /// Store `bytes` at `path`, replacing any existing object.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
}

/// Turn a non-2xx response into an error carrying the status and body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("{} failed with status {}: {}", what, status, body.trim());
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}
