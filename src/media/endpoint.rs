use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::media::{ImageFile, StorageError, api_error, check_size};

/// Posts images to an upload endpoint that replies with `{"url": ...}`.
#[derive(Debug, Clone)]
pub struct EndpointUploader {
    client: reqwest::Client,
    endpoint: String,
    max_bytes: u64,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl EndpointUploader {
    /// An uploader posting to `endpoint`, refusing files over `max_bytes`.
    pub fn new(endpoint: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            max_bytes,
        }
    }

    /// Uploads `file` as the multipart field `file`, returning the hosted URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too large, the endpoint fails, or the
    /// reply carries no URL.
    #[tracing::instrument(skip_all, fields(name = %file.name, size = file.len()))]
    pub async fn upload(&self, file: &ImageFile) -> Result<String, StorageError> {
        check_size(file.len(), self.max_bytes)?;

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime)?;
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let UploadResponse { url } = response.json().await?;
        tracing::info!(%url, "image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        media::ImageError,
        test_support::{StubResponse, StubServer},
    };

    #[tokio::test]
    async fn returns_hosted_url() {
        let server = StubServer::start(|_| {
            StubResponse::json(&serde_json::json!({"url": "https://cdn.example.com/diya.png"}))
        });
        let uploader = EndpointUploader::new(server.url("/upload"), 1024);
        let file = ImageFile::new("diya.png", vec![1, 2, 3]).unwrap();

        let url = uploader.upload(&file).await.unwrap();

        assert_eq!(url, "https://cdn.example.com/diya.png");
        let request = &server.requests()[0];
        let body = request.body_text().to_ascii_lowercase();
        assert!(body.contains("filename=\"diya.png\""));
        assert!(body.contains("content-type: image/png"));
    }

    #[tokio::test]
    async fn oversized_file_never_reaches_endpoint() {
        let server = StubServer::start(|_| StubResponse::ok("{}"));
        let uploader = EndpointUploader::new(server.url("/upload"), 2);
        let file = ImageFile::new("diya.png", vec![1, 2, 3]).unwrap();

        let error = uploader.upload(&file).await.unwrap_err();

        assert!(matches!(
            error,
            StorageError::Image(ImageError::TooLarge { size: 3, limit: 2 })
        ));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn endpoint_error_is_reported() {
        let server = StubServer::start(|_| {
            StubResponse::status(413, r#"{"error": {"message": "too big"}}"#)
        });
        let uploader = EndpointUploader::new(server.url("/upload"), 1024);
        let file = ImageFile::new("diya.png", vec![1]).unwrap();

        let error = uploader.upload(&file).await.unwrap_err();

        assert!(matches!(
            error,
            StorageError::Api { status: 413, ref message } if message == "too big"
        ));
    }
}
