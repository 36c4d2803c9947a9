use async_trait::async_trait;
use hotbound_core::ApiError;

/// One named part of a `multipart/form-data` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FormPart {
    /// `name` and `filename` must not contain `"`, CR or LF, and `content_type`
    /// must not contain CR or LF; encoding rejects such parts.
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Issues a single POST against the configured backend and hands back the raw
/// response body.
///
/// Implementations map connectivity failures to [`ApiError::Transport`] and a
/// successful response with no payload to [`ApiError::EmptyBody`]. They never
/// decode the body; that is left to [`ApiClient`](crate::ApiClient).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns a short identifier for logs (e.g. `"http"`).
    fn name(&self) -> &str;
    /// POST a `multipart/form-data` body built from `parts`, in order.
    async fn post_multipart(&self, path: &str, parts: Vec<FormPart>) -> Result<Vec<u8>, ApiError>;
    /// POST `body` serialized as JSON.
    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<u8>, ApiError>;
}
