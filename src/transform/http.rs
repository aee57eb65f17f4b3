use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use crate::common::MULTIPART_FILE_FIELD;
use crate::storage::{SourceImage, ensure_success};
use crate::transform::{ImageTransformer, upload_file_name};

/// Posts the source image as `multipart/form-data` to the configured endpoint.
#[derive(Clone)]
pub struct HttpTransformer {
    endpoint: String,
    client: Client,
}

impl HttpTransformer {
    pub fn new(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[rocket::async_trait]
impl ImageTransformer for HttpTransformer {
    async fn transform(&self, source: SourceImage) -> Result<Vec<u8>> {
        let part = Part::bytes(source.bytes)
            .file_name(upload_file_name(&source.content_type))
            .mime_str(&source.content_type)
            .with_context(|| format!("Invalid source content type: {}", source.content_type))?;
        let form = Form::new().part(MULTIPART_FILE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to reach transformation service at {}", self.endpoint))?;

        let response = ensure_success(response, "Transformation").await?;
        let bytes = response
            .bytes()
            .await
            .context("Failed to read transformation output")?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn transformer(endpoint: String) -> HttpTransformer {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpTransformer::new(endpoint, client)
    }

    fn source() -> SourceImage {
        SourceImage {
            bytes: b"jpeg-bytes".to_vec(),
            content_type: "image/jpeg".to_string(),
        }
    }

    #[tokio::test]
    async fn sends_a_single_file_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/remove-background")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="item.jpg""#.to_string()),
                Matcher::Regex("jpeg-bytes".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body("png-output")
            .create_async()
            .await;

        let output = transformer(format!("{}/remove-background", server.url()))
            .transform(source())
            .await
            .expect("transform should succeed");

        mock.assert_async().await;
        assert_eq!(output, b"png-output".to_vec());
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/remove-background")
            .with_status(500)
            .with_body("model crashed")
            .create_async()
            .await;

        let error = transformer(format!("{}/remove-background", server.url()))
            .transform(source())
            .await
            .unwrap_err();
        assert!(format!("{:#}", error).contains("model crashed"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        // Nothing listens on port 9 of localhost.
        let result = transformer("http://127.0.0.1:9/remove-background".to_string())
            .transform(source())
            .await;
        assert!(result.is_err());
    }
}
