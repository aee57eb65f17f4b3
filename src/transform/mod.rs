//! Background-removal service client.
//!
//! The service is an opaque HTTP endpoint: one image in as a multipart file,
//! the processed image out as the raw response body.

pub mod http;

use anyhow::{Result, anyhow, bail};
use image::ImageFormat;

use crate::storage::SourceImage;

pub use http::HttpTransformer;

/// Output of the service, accepted only once it is recognisable as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoutImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl CutoutImage {
    /// Validate raw service output and detect its content type from the magic bytes.
    pub fn from_service_output(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            bail!("Transformation service returned an empty body");
        }
        let format = image::guess_format(&bytes)
            .map_err(|err| anyhow!("Transformation service returned a non-image body: {}", err))?;

        Ok(Self {
            bytes,
            content_type: format.to_mime_type().to_string(),
        })
    }
}

#[rocket::async_trait]
pub trait ImageTransformer: Send + Sync {
    /// Send the source image to the service and return its raw output.
    async fn transform(&self, source: SourceImage) -> Result<Vec<u8>>;
}

/// File name announced in the multipart part, e.g. `item.jpg`.
pub fn upload_file_name(content_type: &str) -> String {
    let ext = ImageFormat::from_mime_type(content_type)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("jpg");
    format!("item.{}", ext)
}
