use crate::transport::{FormPart, Transport};
use async_trait::async_trait;
use hotbound_core::ApiError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A request captured by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Multipart {
        path: String,
        parts: Vec<FormPart>,
    },
    Json {
        path: String,
        body: serde_json::Map<String, serde_json::Value>,
    },
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        match self {
            RecordedRequest::Multipart { path, .. } | RecordedRequest::Json { path, .. } => path,
        }
    }
}

/// In-memory [`Transport`] that records every request and answers from a
/// queue of canned responses. An exhausted queue answers with a transport error.
pub struct RecordingTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<VecDeque<Result<Vec<u8>, ApiError>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a successful response body.
    pub fn respond_with(&self, body: impl Into<Vec<u8>>) -> &Self {
        self.push(Ok(body.into()));
        self
    }

    /// Queue a failure.
    pub fn fail_with(&self, error: ApiError) -> &Self {
        self.push(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn push(&self, response: Result<Vec<u8>, ApiError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    fn record(&self, request: RecordedRequest) -> Result<Vec<u8>, ApiError> {
        tracing::trace!(path = %request.path(), "recorded request");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| Err(ApiError::Transport("no canned response queued".to_string())))
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn post_multipart(&self, path: &str, parts: Vec<FormPart>) -> Result<Vec<u8>, ApiError> {
        self.record(RecordedRequest::Multipart {
            path: path.to_string(),
            parts,
        })
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<u8>, ApiError> {
        self.record(RecordedRequest::Json {
            path: path.to_string(),
            body,
        })
    }
}
