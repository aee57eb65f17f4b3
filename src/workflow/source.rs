use log::{error, info};
use std::time::Duration;

use crate::storage::{BlobStore, ItemId, ItemRecord, MetadataStore, SourceImage};
use crate::workflow::error::StageError;

/// An item that has a usable original asset.
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub id: ItemId,
    pub original_path: String,
    pub record: ItemRecord,
}

/// Load the item row. Missing rows, blank `original_path` and failed lookups
/// all end the run as `SourceNotFound` before anything is written.
pub async fn resolve_item(
    metadata: &dyn MetadataStore,
    id: &ItemId,
) -> Result<ResolvedItem, StageError> {
    let record = match metadata.fetch_item(id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            info!(item_id = id.as_str(); "Item not found");
            return Err(StageError::SourceNotFound(id.clone()));
        }
        Err(err) => {
            error!(item_id = id.as_str(); "Item fetch error: {:#}", err);
            return Err(StageError::SourceNotFound(id.clone()));
        }
    };

    let Some(original_path) = record.source_path().map(str::to_string) else {
        info!(item_id = id.as_str(); "Item has no original_path yet");
        return Err(StageError::SourceNotFound(id.clone()));
    };

    Ok(ResolvedItem {
        id: id.clone(),
        original_path,
        record,
    })
}

/// Sign a short-lived read URL for the original and download it.
pub async fn fetch_source(
    blobs: &dyn BlobStore,
    item: &ResolvedItem,
    ttl: Duration,
) -> Result<SourceImage, StageError> {
    let signed_url = blobs
        .create_signed_url(&item.original_path, ttl)
        .await
        .map_err(|err| StageError::SourceUnavailable(err.context("Cannot sign image")))?;

    let source = blobs
        .download(&signed_url)
        .await
        .map_err(|err| StageError::SourceUnavailable(err.context("Cannot download image")))?;

    info!(
        item_id = item.id.as_str();
        "Downloaded original {} ({} bytes, {})",
        item.original_path,
        source.bytes.len(),
        source.content_type
    );
    Ok(source)
}
