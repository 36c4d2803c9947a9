use async_trait::async_trait;
use hotbound_core::SessionError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub const CALL_START: &str = "call-start";
pub const CALL_END: &str = "call-end";
pub const SPEECH_START: &str = "speech-start";
pub const SPEECH_END: &str = "speech-end";
pub const MESSAGE: &str = "message";
pub const ERROR: &str = "error";

/// An untyped `(name, payload)` pair as emitted by a voice SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    #[serde(rename = "event")]
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RawSignal {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// A signal that carries no payload (lifecycle events).
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, serde_json::Value::Null)
    }

    pub fn message(payload: serde_json::Value) -> Self {
        Self::new(MESSAGE, payload)
    }
}

/// A realtime voice session provider.
///
/// The adapter calls [`subscribe`](Self::subscribe) exactly once, when it is
/// constructed; the SDK pushes every signal it produces into that sender for
/// the rest of its life.
#[async_trait]
pub trait VoiceSdk: Send + Sync {
    /// Returns the provider name for logs.
    fn name(&self) -> &str;
    fn subscribe(&mut self, signals: mpsc::UnboundedSender<RawSignal>);
    /// Open a session with `assistant_id`, applying free-form `overrides`.
    async fn start(
        &self,
        assistant_id: &str,
        overrides: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), SessionError>;
    /// Ask the provider to end the session. Completion is signalled with `call-end`.
    async fn stop(&self) -> Result<(), SessionError>;
    fn set_muted(&self, muted: bool);
}
