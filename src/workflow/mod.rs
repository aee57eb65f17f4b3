//! The image processing pipeline for a single item.
//!
//! Stages run strictly in sequence, each awaiting the previous one:
//!
//! ```text
//! validate ─> resolve item ─> sign + download ─> transform ─> upload + commit
//!                             └──────────── fallback guard ───────────────┘
//! ```
//!
//! Once the item is resolved, every failure is absorbed: the fallback guard
//! writes `ready` back so the item never stays in `processing`, and the caller
//! still gets a successful answer.

pub mod commit;
pub mod error;
pub mod fallback;
pub mod invoke;
pub mod source;
pub mod types;
pub mod validate;

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::storage::{
    BlobStore, ImageProcessingStatus, ItemId, ItemUpdate, MetadataStore, RestMetadataStore,
    StorageBucket, build_http_client,
};
use crate::transform::{HttpTransformer, ImageTransformer};

pub use error::StageError;
pub use fallback::Recovery;
pub use invoke::TransformOutcome;
pub use source::ResolvedItem;

use fallback::{catch_internal, restore_ready};
use types::try_acquire;

/// Knobs of one pipeline run, taken from [`AppConfig`] at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub signed_url_ttl: Duration,
    pub transform_timeout: Duration,
    pub mark_processing: bool,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            signed_url_ttl: config.signed_url_ttl,
            transform_timeout: config.transform_timeout,
            mark_processing: config.mark_processing,
        }
    }
}

/// How a run that reached the item ended. All of these answer `200`.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The cutout was stored and is now the cover.
    Cutout { path: String },
    /// The original stays the cover because transform or upload failed.
    Original { path: String, reason: StageError },
    /// A stage failed and the fallback guard ran.
    Recovered { error: StageError, recovery: Recovery },
    /// Another run for the same item is in flight in this process.
    AlreadyRunning,
}

impl ProcessOutcome {
    pub fn response_body(&self) -> &'static str {
        match self {
            Self::Cutout { .. } | Self::Original { .. } => "OK",
            Self::Recovered { .. } => "Internal error, fallback to original if possible",
            Self::AlreadyRunning => "Already processing",
        }
    }

    /// The path committed as cover, when the run got that far.
    pub fn committed_path(&self) -> Option<&str> {
        match self {
            Self::Cutout { path } | Self::Original { path, .. } => Some(path),
            Self::Recovered { .. } | Self::AlreadyRunning => None,
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    transformer: Arc<dyn ImageTransformer>,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        transformer: Arc<dyn ImageTransformer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            metadata,
            blobs,
            transformer,
            settings,
        }
    }

    /// Wire the HTTP adapters described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store_client = build_http_client(config.http_timeout)?;
        let transform_client = build_http_client(config.transform_timeout)?;

        let metadata = RestMetadataStore::new(
            &config.db_url,
            config.service_role_key.clone(),
            store_client.clone(),
        );
        let blobs = StorageBucket::new(
            &config.db_url,
            config.bucket.clone(),
            config.service_role_key.clone(),
            store_client,
        );
        let transformer = HttpTransformer::new(config.transform_url.clone(), transform_client);

        Ok(Self::new(
            Arc::new(metadata),
            Arc::new(blobs),
            Arc::new(transformer),
            PipelineSettings::from(config),
        ))
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Process one item. `Err` is returned only for request errors
    /// (`MissingIdentifier`, `SourceNotFound`); everything after the item is
    /// resolved ends in an `Ok` outcome.
    pub async fn process(&self, raw_id: Option<&str>) -> Result<ProcessOutcome, StageError> {
        let id = validate::require_item_id(raw_id)?;

        let Some(_guard) = try_acquire(&id) else {
            warn!(item_id = id.as_str(); "Processing already in progress");
            return Ok(ProcessOutcome::AlreadyRunning);
        };

        let started = Instant::now();
        info!(item_id = id.as_str(); "Processing item image");
        let item = source::resolve_item(self.metadata.as_ref(), &id).await?;

        if self.settings.mark_processing {
            self.mark_processing(&id).await;
        }

        let outcome = match catch_internal(self.run_stages(&item)).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let recovery = restore_ready(self.metadata.as_ref(), &item, &error).await;
                ProcessOutcome::Recovered { error, recovery }
            }
        };

        info!(
            item_id = id.as_str(), duration = &*format!("{:?}", started.elapsed());
            "Finished: {} (cover: {})",
            outcome.response_body(),
            outcome.committed_path().unwrap_or("unchanged")
        );
        Ok(outcome)
    }

    async fn run_stages(&self, item: &ResolvedItem) -> Result<ProcessOutcome, StageError> {
        let source =
            source::fetch_source(self.blobs.as_ref(), item, self.settings.signed_url_ttl).await?;

        let (candidate, transform_error) = match invoke::invoke_transform(
            self.transformer.as_ref(),
            &item.id,
            source,
            self.settings.transform_timeout,
        )
        .await
        {
            TransformOutcome::Produced(cutout) => (Some(cutout), None),
            TransformOutcome::Unavailable(error) => (None, Some(error)),
        };

        let committed =
            commit::commit_result(self.metadata.as_ref(), self.blobs.as_ref(), item, candidate)
                .await?;

        if committed.cutout {
            return Ok(ProcessOutcome::Cutout {
                path: committed.path,
            });
        }

        let reason = transform_error
            .or(committed.upload_error)
            .unwrap_or_else(|| {
                StageError::Internal(anyhow::anyhow!("No cutout produced and no failure recorded"))
            });
        Ok(ProcessOutcome::Original {
            path: committed.path,
            reason,
        })
    }

    /// Advisory `processing` write; a failure here does not stop the run.
    async fn mark_processing(&self, id: &ItemId) {
        let update = ItemUpdate::status(ImageProcessingStatus::Processing);
        if let Err(err) = self.metadata.update_item(id, &update).await {
            warn!(item_id = id.as_str(); "Failed to mark item as processing: {:#}", err);
        }
    }
}
