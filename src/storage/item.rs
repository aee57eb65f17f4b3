use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a row in the `items` collection.
///
/// Opaque: kept exactly as the caller sent it. Never blank; construct it
/// through [`ItemId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProcessingStatus {
    Pending,
    Processing,
    Ready,
}

/// The image-related columns of an item as stored in the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    #[serde(default)]
    pub original_path: Option<String>,
    #[serde(default)]
    pub cutout_path: Option<String>,
    #[serde(default)]
    pub cover_path: Option<String>,
}

impl ItemRecord {
    /// The original asset path, byte for byte, if it is not blank.
    pub fn source_path(&self) -> Option<&str> {
        self.original_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
    }
}

/// Partial update of an item. Fields left as `None` are not sent, so the
/// store keeps whatever value it already holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutout_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_processing_status: Option<ImageProcessingStatus>,
}

impl ItemUpdate {
    /// The single commit write: both paths point at `path` and the item is ready.
    pub fn committed(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            cutout_path: Some(path.clone()),
            cover_path: Some(path),
            image_processing_status: Some(ImageProcessingStatus::Ready),
        }
    }

    pub fn status(status: ImageProcessingStatus) -> Self {
        Self {
            image_processing_status: Some(status),
            ..Self::default()
        }
    }

    /// Recovery write after a failed run. Leaves the committed paths alone,
    /// except that a missing cover falls back to the original asset.
    pub fn recovered(record: &ItemRecord, original_path: &str) -> Self {
        let cover_path = match record.cover_path.as_deref() {
            Some(cover) if !cover.is_empty() => None,
            _ => Some(original_path.to_string()),
        };
        Self {
            cover_path,
            ..Self::status(ImageProcessingStatus::Ready)
        }
    }
}
