use futures::FutureExt;
use log::{error, info};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::storage::{ItemUpdate, MetadataStore};
use crate::workflow::error::StageError;
use crate::workflow::source::ResolvedItem;

/// Result of the best-effort recovery write.
#[derive(Debug)]
pub enum Recovery {
    /// The item was put back to `ready`.
    Restored,
    /// The recovery write failed too; the item may still read `processing`.
    Unrecoverable(anyhow::Error),
}

/// Run `stages`, turning a panic into [`StageError::Internal`].
pub async fn catch_internal<T, F>(stages: F) -> Result<T, StageError>
where
    F: Future<Output = Result<T, StageError>>,
{
    match AssertUnwindSafe(stages).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(StageError::Internal(anyhow::anyhow!(
            "Pipeline panicked: {}",
            panic_message(&*payload)
        ))),
    }
}

/// Force the item back to `ready` after `failure`, keeping the committed
/// paths. Never fails; a failed write is logged and reported.
pub async fn restore_ready(
    metadata: &dyn MetadataStore,
    item: &ResolvedItem,
    failure: &StageError,
) -> Recovery {
    error!(
        item_id = item.id.as_str();
        "Function error ({}): {}",
        failure.kind(),
        failure.report()
    );

    let update = ItemUpdate::recovered(&item.record, &item.original_path);
    match metadata.update_item(&item.id, &update).await {
        Ok(()) => {
            info!(item_id = item.id.as_str(); "Item restored to ready with its last committed asset");
            Recovery::Restored
        }
        Err(err) => {
            error!(
                item_id = item.id.as_str();
                "Unrecoverable: failed to restore item to ready: {:#}",
                err
            );
            Recovery::Unrecoverable(err)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
