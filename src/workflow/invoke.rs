use anyhow::anyhow;
use log::{info, warn};
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::storage::{ItemId, SourceImage};
use crate::transform::{CutoutImage, ImageTransformer};
use crate::workflow::error::StageError;

/// Result of one call to the transformation service. Neither arm stops the run.
#[derive(Debug)]
pub enum TransformOutcome {
    Produced(CutoutImage),
    Unavailable(StageError),
}

/// Call the service once, bounded by `limit`. Errors, timeouts and output
/// that is not an image all become [`TransformOutcome::Unavailable`].
pub async fn invoke_transform(
    transformer: &dyn ImageTransformer,
    id: &ItemId,
    source: SourceImage,
    limit: Duration,
) -> TransformOutcome {
    let started = Instant::now();
    let output = match timeout(limit, transformer.transform(source)).await {
        Ok(Ok(bytes)) => CutoutImage::from_service_output(bytes),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(anyhow!("Transformation timed out after {:?}", limit)),
    };

    match output {
        Ok(cutout) => {
            info!(
                item_id = id.as_str(), duration = &*format!("{:?}", started.elapsed());
                "Transformation produced {} bytes ({})",
                cutout.bytes.len(),
                cutout.content_type
            );
            TransformOutcome::Produced(cutout)
        }
        Err(err) => {
            let error = StageError::TransformUnavailable(err);
            warn!(
                item_id = id.as_str(), duration = &*format!("{:?}", started.elapsed());
                "{}; keeping original",
                error.report()
            );
            TransformOutcome::Unavailable(error)
        }
    }
}
