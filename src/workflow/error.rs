use rocket::http::Status;
use thiserror::Error;

use crate::storage::ItemId;

/// Failure of one pipeline stage.
///
/// `MissingIdentifier` and `SourceNotFound` are reported to the caller as
/// request errors. Every other kind is absorbed by the fallback guard or
/// degrades the run to the original asset.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Missing itemId")]
    MissingIdentifier,

    #[error("Item {0} not found or has no original_path")]
    SourceNotFound(ItemId),

    #[error("Original image is unavailable")]
    SourceUnavailable(#[source] anyhow::Error),

    #[error("Transformation service is unavailable")]
    TransformUnavailable(#[source] anyhow::Error),

    #[error("Result could not be committed")]
    CommitUnavailable(#[source] anyhow::Error),

    #[error("Unexpected pipeline failure")]
    Internal(#[source] anyhow::Error),
}

impl StageError {
    /// True for the kinds raised before any work started.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::MissingIdentifier | Self::SourceNotFound(_))
    }

    /// HTTP status of the kind. Only request errors ever reach the caller;
    /// the rest are absorbed before a response is built.
    pub fn status(&self) -> Status {
        match self {
            Self::MissingIdentifier => Status::BadRequest,
            Self::SourceNotFound(_) => Status::NotFound,
            _ => Status::InternalServerError,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingIdentifier => "MissingIdentifier",
            Self::SourceNotFound(_) => "SourceNotFound",
            Self::SourceUnavailable(_) => "SourceUnavailable",
            Self::TransformUnavailable(_) => "TransformUnavailable",
            Self::CommitUnavailable(_) => "CommitUnavailable",
            Self::Internal(_) => "Internal",
        }
    }

    /// The message followed by every cause, joined with `: `.
    pub fn report(&self) -> String {
        match self.cause() {
            Some(cause) => format!("{}: {:#}", self, cause),
            None => self.to_string(),
        }
    }

    fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::MissingIdentifier | Self::SourceNotFound(_) => None,
            Self::SourceUnavailable(cause)
            | Self::TransformUnavailable(cause)
            | Self::CommitUnavailable(cause)
            | Self::Internal(cause) => Some(cause),
        }
    }
}
