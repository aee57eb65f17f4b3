use log::{info, warn};
use regex::Regex;
use std::sync::LazyLock;

use crate::common::CUTOUT_SUFFIX;
use crate::storage::{BlobStore, ItemUpdate, MetadataStore};
use crate::transform::CutoutImage;
use crate::workflow::error::StageError;
use crate::workflow::source::ResolvedItem;

// Trailing extension: a dot followed by anything but dots and slashes.
static TRAILING_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.[^./]+)?$").expect("valid extension pattern"));

/// Storage path of the cutout derived from the original path, e.g.
/// `a/b/photo.jpg` becomes `a/b/photo-cutout.png`.
pub fn cutout_path_for(original_path: &str) -> String {
    TRAILING_EXTENSION
        .replace(original_path, CUTOUT_SUFFIX)
        .into_owned()
}

/// What the commit step wrote.
#[derive(Debug)]
pub struct CommittedAsset {
    pub path: String,
    /// True when `path` points at a freshly uploaded cutout.
    pub cutout: bool,
    /// Set when a cutout existed but could not be stored.
    pub upload_error: Option<StageError>,
}

/// Upload the cutout (if any) and write the final paths and `ready` status in
/// one metadata update. Only a failure of that final write is returned as an
/// error; a failed upload degrades to the original asset.
pub async fn commit_result(
    metadata: &dyn MetadataStore,
    blobs: &dyn BlobStore,
    item: &ResolvedItem,
    candidate: Option<CutoutImage>,
) -> Result<CommittedAsset, StageError> {
    let mut upload_error = None;
    let mut final_path = item.original_path.clone();
    let mut cutout_stored = false;

    if let Some(cutout) = candidate {
        let cutout_path = cutout_path_for(&item.original_path);
        match blobs
            .upload(&cutout_path, cutout.bytes, &cutout.content_type)
            .await
        {
            Ok(()) => {
                final_path = cutout_path;
                cutout_stored = true;
            }
            Err(err) => {
                let error = StageError::CommitUnavailable(
                    err.context(format!("Upload cutout failed for {}", cutout_path)),
                );
                warn!(item_id = item.id.as_str(); "{}; keeping original", error.report());
                upload_error = Some(error);
            }
        }
    }

    metadata
        .update_item(&item.id, &ItemUpdate::committed(final_path.clone()))
        .await
        .map_err(|err| StageError::CommitUnavailable(err.context("Final item update failed")))?;

    info!(item_id = item.id.as_str(); "Committed {} as cover", final_path);
    Ok(CommittedAsset {
        path: final_path,
        cutout: cutout_stored,
        upload_error,
    })
}
