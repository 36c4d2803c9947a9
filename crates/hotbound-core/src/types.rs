/// One JPEG-encoded profile screenshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub jpeg: Vec<u8>,
}

impl ImagePayload {
    pub fn new(jpeg: Vec<u8>) -> Self {
        Self { jpeg }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub audio: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationTurn {
    pub user_input: String,
    pub conversation_history: String,
}

/// A single line of the local call transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub content: String,
    pub is_user: bool,
}

/// Chronological transcript kept on the client. The backend is stateless, so
/// every turn carries the full history rebuilt from this log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message {
            content: content.into(),
            is_user: true,
        });
    }

    pub fn push_ai(&mut self, content: impl Into<String>) {
        self.messages.push(Message {
            content: content.into(),
            is_user: false,
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Newline-joined message contents, oldest first.
    pub fn history(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Structured function call requested by the voice assistant mid-call.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionCall {
    AddTopping {
        topping: String,
    },
    Other {
        name: String,
        parameters: serde_json::Value,
    },
}

impl FunctionCall {
    pub fn name(&self) -> &str {
        match self {
            FunctionCall::AddTopping { .. } => "addTopping",
            FunctionCall::Other { name, .. } => name,
        }
    }
}

/// Normalized event emitted by the call session adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    CallStarted,
    CallEnded,
    SpeechStarted,
    SpeechEnded,
    PartialTranscript(String),
    FinalTranscript(String),
    FunctionCall(FunctionCall),
    Error(String),
}
