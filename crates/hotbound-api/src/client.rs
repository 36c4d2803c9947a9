use crate::http::HttpTransport;
use crate::transport::{FormPart, Transport};
use hotbound_core::{AnalysisRequest, ApiConfig, ApiError, ConversationTurn, TranscriptionRequest};
use std::collections::HashMap;
use std::sync::Arc;

pub const ANALYZE_PROFILE_PATH: &str = "/analyze_profile";
pub const TRANSCRIBE_AUDIO_PATH: &str = "/transcribe_audio";
pub const SIMULATE_CONVERSATION_PATH: &str = "/simulate_conversation";

/// Domain operations against the Hotbound backend.
///
/// Every method resolves exactly once, with either the decoded value of the
/// operation's response key or an [`ApiError`]. Nothing is retried; the caller
/// owns any retry policy.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a client that talks HTTP to `config.base_url`.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Upload profile screenshots, one `images` part per image in input order.
    pub async fn analyze_profile(&self, request: AnalysisRequest) -> Result<String, ApiError> {
        let parts: Vec<FormPart> = request
            .images
            .into_iter()
            .enumerate()
            .map(|(i, image)| FormPart::new("images", format!("image{i}.jpg"), "image/jpeg", image.jpeg))
            .collect();
        tracing::info!(images = parts.len(), "analyzing profile");

        let body = self.transport.post_multipart(ANALYZE_PROFILE_PATH, parts).await?;
        extract_field(&body, "analysis")
    }

    pub async fn transcribe_audio(&self, request: TranscriptionRequest) -> Result<String, ApiError> {
        tracing::info!(bytes = request.audio.len(), "transcribing audio");
        let parts = vec![FormPart::new("audio", "audio.wav", "audio/wav", request.audio)];

        let body = self.transport.post_multipart(TRANSCRIBE_AUDIO_PATH, parts).await?;
        extract_field(&body, "transcript")
    }

    pub async fn simulate_conversation(&self, turn: ConversationTurn) -> Result<String, ApiError> {
        tracing::info!(
            input_chars = turn.user_input.len(),
            history_chars = turn.conversation_history.len(),
            "simulating conversation turn"
        );
        let body = self
            .transport
            .post_json(SIMULATE_CONVERSATION_PATH, conversation_body(turn))
            .await?;
        extract_field(&body, "ai_response")
    }
}

pub(crate) fn conversation_body(turn: ConversationTurn) -> serde_json::Map<String, serde_json::Value> {
    let mut body = serde_json::Map::new();
    body.insert("user_input".to_string(), serde_json::Value::String(turn.user_input));
    body.insert(
        "conversation_history".to_string(),
        serde_json::Value::String(turn.conversation_history),
    );
    body
}

/// Decode a flat string-to-string JSON object and pull out `key`.
pub(crate) fn extract_field(body: &[u8], key: &str) -> Result<String, ApiError> {
    let mut map: HashMap<String, String> = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(key, "response is not a flat string map: {e}");
        ApiError::InvalidResponseFormat(e.to_string())
    })?;
    map.remove(key).ok_or_else(|| {
        tracing::warn!(key, "response is missing expected key");
        ApiError::InvalidResponseFormat(format!("missing key '{key}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{RecordedRequest, RecordingTransport};
    use hotbound_core::ImagePayload;

    fn client_with(transport: &Arc<RecordingTransport>) -> ApiClient {
        ApiClient::new(transport.clone())
    }

    #[tokio::test]
    async fn test_analyze_profile_builds_one_part_per_image() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_with(r#"{"analysis":"Director of RevOps"}"#);
        let client = client_with(&transport);

        let request = AnalysisRequest {
            images: (0..3u8).map(|i| ImagePayload::new(vec![0xff, 0xd8, i])).collect(),
        };
        let analysis = client.analyze_profile(request).await.unwrap();
        assert_eq!(analysis, "Director of RevOps");

        match &transport.requests()[0] {
            RecordedRequest::Multipart { path, parts } => {
                assert_eq!(path, ANALYZE_PROFILE_PATH);
                assert_eq!(parts.len(), 3);
                for (i, part) in parts.iter().enumerate() {
                    assert_eq!(part.name, "images");
                    assert_eq!(part.filename, format!("image{i}.jpg"));
                    assert_eq!(part.content_type, "image/jpeg");
                    assert_eq!(part.data, vec![0xff, 0xd8, i as u8]);
                }
            }
            other => panic!("expected multipart request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_analyze_profile_empty_images_is_forwarded() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_with(r#"{"analysis":""}"#);
        let client = client_with(&transport);

        let result = client.analyze_profile(AnalysisRequest::default()).await;
        assert_eq!(result, Ok(String::new()));
        match &transport.requests()[0] {
            RecordedRequest::Multipart { parts, .. } => assert!(parts.is_empty()),
            other => panic!("expected multipart request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transcribe_audio_single_part() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_with(r#"{"transcript":"we sell to mid-market"}"#);
        let client = client_with(&transport);

        let transcript = client
            .transcribe_audio(TranscriptionRequest {
                audio: b"RIFF....WAVE".to_vec(),
            })
            .await
            .unwrap();
        assert_eq!(transcript, "we sell to mid-market");

        match &transport.requests()[0] {
            RecordedRequest::Multipart { path, parts } => {
                assert_eq!(path, TRANSCRIBE_AUDIO_PATH);
                assert_eq!(
                    parts,
                    &vec![FormPart::new("audio", "audio.wav", "audio/wav", b"RIFF....WAVE".to_vec())]
                );
            }
            other => panic!("expected multipart request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transcribe_zero_length_audio_still_sent() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_with(r#"{"transcript":""}"#);
        let client = client_with(&transport);

        let transcript = client
            .transcribe_audio(TranscriptionRequest::default())
            .await
            .unwrap();
        assert_eq!(transcript, "");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_simulate_conversation_round_trip() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_with(r#"{"ai_response":"hi there"}"#);
        let client = client_with(&transport);

        let reply = client
            .simulate_conversation(ConversationTurn {
                user_input: "hello".to_string(),
                conversation_history: "prior line".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "hi there");

        match &transport.requests()[0] {
            RecordedRequest::Json { path, body } => {
                assert_eq!(path, SIMULATE_CONVERSATION_PATH);
                let encoded = serde_json::to_value(body).unwrap();
                assert_eq!(
                    encoded,
                    serde_json::json!({"user_input": "hello", "conversation_history": "prior line"})
                );
            }
            other => panic!("expected json request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_invalid_response_format() {
        let transport = Arc::new(RecordingTransport::new());
        transport
            .respond_with(r#"{"transcript":"wrong key"}"#)
            .respond_with(r#"{"analysis":"wrong key"}"#)
            .respond_with(r#"{"error":"quota exceeded"}"#);
        let client = client_with(&transport);

        let analysis = client.analyze_profile(AnalysisRequest::default()).await;
        let transcript = client.transcribe_audio(TranscriptionRequest::default()).await;
        let reply = client.simulate_conversation(ConversationTurn::default()).await;

        for result in [analysis, transcript, reply] {
            assert!(matches!(result, Err(ApiError::InvalidResponseFormat(_))));
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_surfaced_once() {
        let transport = Arc::new(RecordingTransport::new());
        transport.fail_with(ApiError::Transport("connection refused".to_string()));
        let client = client_with(&transport);

        let result = client.simulate_conversation(ConversationTurn::default()).await;
        assert_eq!(
            result,
            Err(ApiError::Transport("connection refused".to_string()))
        );
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_extract_field_ignores_extra_keys() {
        let body = br#"{"analysis":"ok","model":"gemini"}"#;
        assert_eq!(extract_field(body, "analysis"), Ok("ok".to_string()));
    }

    #[test]
    fn test_extract_field_rejects_non_string_values() {
        let body = br#"{"analysis":["not","flat"]}"#;
        assert!(matches!(
            extract_field(body, "analysis"),
            Err(ApiError::InvalidResponseFormat(_))
        ));
    }

    #[test]
    fn test_extract_field_rejects_garbage() {
        assert!(matches!(
            extract_field(b"<html>502 Bad Gateway</html>", "analysis"),
            Err(ApiError::InvalidResponseFormat(_))
        ));
        assert!(matches!(
            extract_field(b"", "analysis"),
            Err(ApiError::InvalidResponseFormat(_))
        ));
    }

    #[test]
    fn test_from_config_uses_http_transport() {
        let client = ApiClient::from_config(&ApiConfig::default()).unwrap();
        assert_eq!(client.transport_name(), "http");
    }
}
