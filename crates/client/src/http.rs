//! HTTP backend implementation.
//!
//! Talks to the document/chat service:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | health | `GET /health` |
//! | models | `GET /models` |
//! | directory | `GET /directories/{project,reference}` |
//! | refresh | `POST /directories/refresh` |
//! | upload | `POST /upload` (multipart field `file`) |
//! | chat | `POST /chat` |
//!
//! Every call is a single attempt. Error bodies are reduced to their
//! `detail` field when the service sends one.

use crate::wire::{
    ApiChatRequest, ApiChatResponse, ApiDirectory, ApiHealth, ApiModelList, ApiUpload,
    error_detail,
};
use async_trait::async_trait;
use docpilot_core::backend::{Backend, ChatReply, ChatRequest, UploadReply};
use docpilot_core::directory::{DirectoryPool, DirectorySnapshot};
use docpilot_core::error::BackendError;
use docpilot_core::model::{HealthStatus, ModelDescriptor};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// A [`Backend`] reached over HTTP.
pub struct HttpBackend {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(format!(
                "No response within {}s",
                self.timeout.as_secs()
            ))
        } else {
            BackendError::Network(e.to_string())
        }
    }

    /// Turn a response into `T`, mapping non-2xx statuses to `Api` errors.
    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Backend returned error");
            return Err(BackendError::Api {
                status_code: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        debug!(backend = %self.base_url, path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let api: ApiHealth = self.get("/health").await?;
        Ok(api.into())
    }

    async fn models(&self) -> Result<Vec<ModelDescriptor>, BackendError> {
        let api: ApiModelList = self.get("/models").await?;
        Ok(api.into_descriptors())
    }

    async fn directory(&self, pool: DirectoryPool) -> Result<DirectorySnapshot, BackendError> {
        let api: ApiDirectory = self.get(&format!("/directories/{pool}")).await?;
        Ok(api.into())
    }

    async fn refresh_directories(&self) -> Result<(), BackendError> {
        debug!(backend = %self.base_url, "Requesting directory rescan");
        let response = self
            .client
            .post(self.url("/directories/refresh"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Api {
            status_code: status.as_u16(),
            detail: error_detail(&body),
        })
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadReply, BackendError> {
        debug!(backend = %self.base_url, filename, size = bytes.len(), "Uploading document");
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let api: ApiUpload = self.decode(response).await?;
        Ok(api.into())
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
        debug!(
            backend = %self.base_url,
            llm = %request.backend,
            uploads = request.context.uploads.len(),
            project = request.context.include_project,
            reference = request.context.include_reference,
            "Sending chat request"
        );

        let response = self
            .client
            .post(self.url("/chat"))
            .json(&ApiChatRequest::from(&request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let api: ApiChatResponse = self.decode(response).await?;
        Ok(api.into_reply(request.backend))
    }
}

/// Build the HTTP backend from configuration.
pub fn build_from_config(
    config: &docpilot_config::AppConfig,
) -> Result<HttpBackend, BackendError> {
    HttpBackend::new(&config.api_url, Duration::from_secs(config.timeout_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/health"), "http://localhost:8000/health");
    }

    #[test]
    fn build_from_default_config() {
        let config = docpilot_config::AppConfig::default();
        let backend = build_from_config(&config).unwrap();
        assert_eq!(backend.name(), "http://localhost:8000");
    }
}
