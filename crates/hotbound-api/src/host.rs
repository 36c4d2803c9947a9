use crate::client::ApiClient;
use hotbound_core::{AnalysisRequest, ApiError, ConversationTurn, TranscriptionRequest};
use tokio::sync::mpsc;

/// A backend operation submitted by the view layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    AnalyzeProfile(AnalysisRequest),
    TranscribeAudio(TranscriptionRequest),
    SimulateConversation(ConversationTurn),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::AnalyzeProfile(_) => OperationKind::AnalyzeProfile,
            Operation::TranscribeAudio(_) => OperationKind::TranscribeAudio,
            Operation::SimulateConversation(_) => OperationKind::SimulateConversation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    AnalyzeProfile,
    TranscribeAudio,
    SimulateConversation,
}

/// The single result of one submitted operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub request_id: u64,
    pub kind: OperationKind,
    pub result: Result<String, ApiError>,
}

/// Runs each submitted operation on its own task and funnels every
/// [`Completion`] into one channel, so a single consumer (the UI loop) handles
/// all results in one place.
///
/// Completions of independent requests arrive in whatever order their round
/// trips finish.
pub struct ApiHost {
    client: ApiClient,
    next_id: u64,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: Option<mpsc::UnboundedReceiver<Completion>>,
    task_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl ApiHost {
    pub fn new(client: ApiClient) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            client,
            next_id: 0,
            completion_tx,
            completion_rx: Some(completion_rx),
            task_handles: Vec::new(),
        }
    }

    pub fn take_completion_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<Completion>> {
        self.completion_rx.take()
    }

    /// Start `operation` in the background and return its request id.
    pub fn submit(&mut self, operation: Operation) -> u64 {
        self.next_id += 1;
        let request_id = self.next_id;
        let kind = operation.kind();
        let client = self.client.clone();
        let tx = self.completion_tx.clone();

        tracing::debug!(request_id, kind = ?kind, "submitting operation");
        self.task_handles.retain(|h| !h.is_finished());

        let handle = tokio::spawn(async move {
            let result = match operation {
                Operation::AnalyzeProfile(request) => client.analyze_profile(request).await,
                Operation::TranscribeAudio(request) => client.transcribe_audio(request).await,
                Operation::SimulateConversation(turn) => client.simulate_conversation(turn).await,
            };
            if let Err(e) = &result {
                tracing::error!(request_id, kind = ?kind, "operation failed: {e}");
            }
            if tx
                .send(Completion {
                    request_id,
                    kind,
                    result,
                })
                .is_err()
            {
                tracing::debug!(request_id, "completion receiver dropped");
            }
        });
        self.task_handles.push(handle);

        request_id
    }

    pub fn in_flight(&self) -> usize {
        self.task_handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every in-flight operation to resolve.
    pub async fn shutdown(&mut self) {
        let handles = std::mem::take(&mut self.task_handles);
        for handle in handles {
            // A panicked task never sent its completion.
            if let Err(e) = handle.await {
                tracing::error!("operation task failed without a completion: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingTransport;
    use std::sync::Arc;
    use std::time::Duration;

    fn host_with(transport: Arc<RecordingTransport>) -> ApiHost {
        ApiHost::new(ApiClient::new(transport))
    }

    #[test]
    fn test_operation_kind() {
        let op = Operation::SimulateConversation(ConversationTurn::default());
        assert_eq!(op.kind(), OperationKind::SimulateConversation);
        let op = Operation::TranscribeAudio(TranscriptionRequest::default());
        assert_eq!(op.kind(), OperationKind::TranscribeAudio);
    }

    #[tokio::test]
    async fn test_host_receiver_can_be_taken_once() {
        let mut host = host_with(Arc::new(RecordingTransport::new()));
        assert!(host.take_completion_receiver().is_some());
        assert!(host.take_completion_receiver().is_none());
    }

    #[tokio::test]
    async fn test_submit_delivers_completion() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_with(r#"{"ai_response":"who is this?"}"#);
        let mut host = host_with(transport);
        let mut rx = host.take_completion_receiver().unwrap();

        let id = host.submit(Operation::SimulateConversation(ConversationTurn {
            user_input: "hello".to_string(),
            conversation_history: "hello".to_string(),
        }));

        let completion = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(completion.request_id, id);
        assert_eq!(completion.kind, OperationKind::SimulateConversation);
        assert_eq!(completion.result, Ok("who is this?".to_string()));

        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_failure_delivered_as_completion() {
        let transport = Arc::new(RecordingTransport::new());
        transport.fail_with(ApiError::EmptyBody);
        let mut host = host_with(transport);
        let mut rx = host.take_completion_receiver().unwrap();

        host.submit(Operation::AnalyzeProfile(AnalysisRequest::default()));
        host.shutdown().await;

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.kind, OperationKind::AnalyzeProfile);
        assert_eq!(completion.result, Err(ApiError::EmptyBody));
    }

    #[tokio::test]
    async fn test_each_submission_gets_exactly_one_completion() {
        let transport = Arc::new(RecordingTransport::new());
        for _ in 0..3 {
            transport.respond_with(r#"{"transcript":"ok"}"#);
        }
        let mut host = host_with(transport.clone());
        let mut rx = host.take_completion_receiver().unwrap();

        let ids: Vec<u64> = (0..3)
            .map(|_| host.submit(Operation::TranscribeAudio(TranscriptionRequest::default())))
            .collect();
        host.shutdown().await;
        assert_eq!(host.in_flight(), 0);

        let mut seen = Vec::new();
        while let Ok(completion) = rx.try_recv() {
            seen.push(completion.request_id);
        }
        seen.sort();
        assert_eq!(seen, ids);
        assert_eq!(transport.request_count(), 3);
    }

    struct PanickingTransport;

    #[async_trait::async_trait]
    impl crate::transport::Transport for PanickingTransport {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn post_multipart(
            &self,
            _path: &str,
            _parts: Vec<crate::transport::FormPart>,
        ) -> Result<Vec<u8>, ApiError> {
            panic!("transport bug");
        }

        async fn post_json(
            &self,
            _path: &str,
            _body: serde_json::Map<String, serde_json::Value>,
        ) -> Result<Vec<u8>, ApiError> {
            panic!("transport bug");
        }
    }

    #[tokio::test]
    async fn test_shutdown_survives_panicked_task() {
        let mut host = ApiHost::new(ApiClient::new(Arc::new(PanickingTransport)));
        let mut rx = host.take_completion_receiver().unwrap();

        host.submit(Operation::TranscribeAudio(TranscriptionRequest::default()));
        tokio::time::timeout(Duration::from_secs(2), host.shutdown())
            .await
            .expect("shutdown timed out");

        assert_eq!(host.in_flight(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_with_nothing_in_flight() {
        let mut host = host_with(Arc::new(RecordingTransport::new()));
        tokio::time::timeout(Duration::from_secs(2), host.shutdown())
            .await
            .expect("shutdown timed out");
    }
}
