#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use item_cutout::storage::{
    BlobStore, ImageProcessingStatus, ItemId, ItemRecord, ItemUpdate, MetadataStore, SourceImage,
};
use item_cutout::transform::ImageTransformer;
use item_cutout::workflow::{Orchestrator, PipelineSettings};

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

/// One row of the fake `items` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub original_path: Option<String>,
    pub cutout_path: Option<String>,
    pub cover_path: Option<String>,
    pub status: ImageProcessingStatus,
}

impl StoredItem {
    pub fn pending(original_path: Option<&str>) -> Self {
        Self {
            original_path: original_path.map(str::to_string),
            cutout_path: None,
            cover_path: None,
            status: ImageProcessingStatus::Pending,
        }
    }
}

#[derive(Default)]
pub struct FakeMetadata {
    rows: Mutex<HashMap<String, StoredItem>>,
    pub fetches: AtomicUsize,
    pub updates: Mutex<Vec<(String, ItemUpdate)>>,
    /// Fail this many update calls, counted from the next one.
    failing_updates: AtomicUsize,
    fail_fetch: Mutex<bool>,
}

impl FakeMetadata {
    pub fn with_item(id: &str, item: StoredItem) -> Arc<Self> {
        let store = Arc::new(Self::default());
        store.insert(id, item);
        store
    }

    pub fn insert(&self, id: &str, item: StoredItem) {
        self.rows.lock().unwrap().insert(id.to_string(), item);
    }

    pub fn item(&self, id: &str) -> StoredItem {
        self.rows.lock().unwrap().get(id).cloned().expect("item exists")
    }

    pub fn fail_next_updates(&self, count: usize) {
        self.failing_updates.store(count, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self) {
        *self.fail_fetch.lock().unwrap() = true;
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn call_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst) + self.update_count()
    }
}

#[rocket::async_trait]
impl MetadataStore for FakeMetadata {
    async fn fetch_item(&self, id: &ItemId) -> Result<Option<ItemRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.fail_fetch.lock().unwrap() {
            bail!("metadata store offline");
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(id.as_str())
            .map(|row| ItemRecord {
                id: id.to_string(),
                original_path: row.original_path.clone(),
                cutout_path: row.cutout_path.clone(),
                cover_path: row.cover_path.clone(),
            }))
    }

    async fn update_item(&self, id: &ItemId, update: &ItemUpdate) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), update.clone()));

        let remaining = self.failing_updates.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_updates.store(remaining - 1, Ordering::SeqCst);
            bail!("metadata store offline");
        }

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(id.as_str())
            .ok_or_else(|| anyhow!("no row {}", id))?;
        if let Some(path) = &update.cutout_path {
            row.cutout_path = Some(path.clone());
        }
        if let Some(path) = &update.cover_path {
            row.cover_path = Some(path.clone());
        }
        if let Some(status) = update.image_processing_status {
            row.status = status;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBlobs {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    pub signs: AtomicUsize,
    pub downloads: AtomicUsize,
    pub uploads: Mutex<Vec<(String, String)>>,
    pub fail_sign: Mutex<bool>,
    pub fail_download: Mutex<bool>,
    pub fail_upload: Mutex<bool>,
}

impl FakeBlobs {
    pub fn with_object(path: &str, bytes: &[u8], content_type: &str) -> Arc<Self> {
        let blobs = Arc::new(Self::default());
        blobs.objects.lock().unwrap().insert(
            path.to_string(),
            (bytes.to_vec(), content_type.to_string()),
        );
        blobs
    }

    pub fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn call_count(&self) -> usize {
        self.signs.load(Ordering::SeqCst)
            + self.downloads.load(Ordering::SeqCst)
            + self.uploads.lock().unwrap().len()
    }
}

#[rocket::async_trait]
impl BlobStore for FakeBlobs {
    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        if *self.fail_sign.lock().unwrap() {
            bail!("sign refused");
        }
        Ok(format!("signed://{}?ttl={}", path, ttl.as_secs()))
    }

    async fn download(&self, signed_url: &str) -> Result<SourceImage> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if *self.fail_download.lock().unwrap() {
            bail!("download refused");
        }
        let path = signed_url
            .strip_prefix("signed://")
            .and_then(|rest| rest.split('?').next())
            .ok_or_else(|| anyhow!("not a signed url: {}", signed_url))?;
        let (bytes, content_type) = self
            .object(path)
            .ok_or_else(|| anyhow!("no object at {}", path))?;
        Ok(SourceImage {
            bytes,
            content_type,
        })
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), content_type.to_string()));
        if *self.fail_upload.lock().unwrap() {
            bail!("bucket is read-only");
        }
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }
}

pub enum TransformBehavior {
    ReturnPng,
    Fail,
    ReturnGarbage,
    Hang,
    Panic,
    /// Signal `started`, then wait for `release` before returning a PNG.
    Gate {
        started: Arc<Notify>,
        release: Arc<Notify>,
    },
}

pub struct FakeTransformer {
    behavior: TransformBehavior,
    pub calls: AtomicUsize,
}

impl FakeTransformer {
    pub fn new(behavior: TransformBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[rocket::async_trait]
impl ImageTransformer for FakeTransformer {
    async fn transform(&self, _source: SourceImage) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            TransformBehavior::ReturnPng => Ok(PNG_BYTES.to_vec()),
            TransformBehavior::Fail => bail!("bg-service error 500"),
            TransformBehavior::ReturnGarbage => Ok(b"<html>oops</html>".to_vec()),
            TransformBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(PNG_BYTES.to_vec())
            }
            TransformBehavior::Panic => panic!("transformer bug"),
            TransformBehavior::Gate { started, release } => {
                started.notify_one();
                release.notified().await;
                Ok(PNG_BYTES.to_vec())
            }
        }
    }
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        signed_url_ttl: Duration::from_secs(60),
        transform_timeout: Duration::from_millis(200),
        mark_processing: false,
    }
}

pub fn orchestrator(
    metadata: &Arc<FakeMetadata>,
    blobs: &Arc<FakeBlobs>,
    transformer: &Arc<FakeTransformer>,
    settings: PipelineSettings,
) -> Orchestrator {
    Orchestrator::new(
        metadata.clone(),
        blobs.clone(),
        transformer.clone(),
        settings,
    )
}
