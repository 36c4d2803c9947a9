use crate::multipart::MultipartBody;
use crate::transport::{FormPart, Transport};
use async_trait::async_trait;
use hotbound_core::{ApiConfig, ApiError};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// [`Transport`] over HTTP(S) using a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn finish(&self, path: &str, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(path, "request failed: {e}");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if status.is_success() && body.is_empty() {
            return Err(ApiError::EmptyBody);
        }
        if !status.is_success() {
            tracing::warn!(path, status = %status, bytes = body.len(), "backend returned non-success status");
        } else {
            tracing::debug!(path, status = %status, bytes = body.len(), "response received");
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn post_multipart(&self, path: &str, parts: Vec<FormPart>) -> Result<Vec<u8>, ApiError> {
        let body = MultipartBody::encode(&parts)?;
        tracing::debug!(
            path,
            parts = parts.len(),
            bytes = body.bytes().len(),
            "POST multipart"
        );
        let request = self
            .client
            .post(self.url(path))
            .header(CONTENT_TYPE, body.content_type())
            .body(body.into_bytes());
        self.finish(path, request).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(path, fields = body.len(), "POST json");
        let request = self.client.post(self.url(path)).json(&body);
        self.finish(path, request).await
    }
}
