use crate::error::ApiError;
use crate::types::{CallEvent, ConversationLog, ConversationTurn, FunctionCall};

/// Screen the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Upload,
    Context,
    Call,
}

/// Live call indicators, for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallView {
    pub active: bool,
    pub muted: bool,
    pub speaking: bool,
    pub live_partial: Option<String>,
    pub last_function_call: Option<FunctionCall>,
}

/// Snapshot of everything the view renders. Only [`apply`](Self::apply) mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationState {
    pub step: Step,
    pub analyzing: bool,
    pub analysis: Option<String>,
    pub context_transcript: String,
    pub conversation: ConversationLog,
    pub awaiting_reply: bool,
    pub call: CallView,
    pub last_error: Option<String>,
}

/// Discrete messages sent from the view (or from completions) to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AnalysisStarted,
    AnalysisFinished(Result<String, ApiError>),
    ContextTranscribed(Result<String, ApiError>),
    Continue,
    SubmitMessage(String),
    ReplyReceived(Result<String, ApiError>),
    Call(CallEvent),
    SetMuted(bool),
    EndCall,
    DismissError,
}

/// Side effect the caller must perform after applying an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SimulateConversation(ConversationTurn),
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_continue(&self) -> bool {
        match self.step {
            Step::Upload => true,
            Step::Context => !self.context_transcript.trim().is_empty(),
            Step::Call => false,
        }
    }

    pub fn apply(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::AnalysisStarted => {
                self.analyzing = true;
                self.last_error = None;
            }
            Action::AnalysisFinished(result) => {
                self.analyzing = false;
                match result {
                    Ok(analysis) => self.analysis = Some(analysis),
                    Err(e) => self.last_error = Some(e.to_string()),
                }
            }
            Action::ContextTranscribed(result) => match result {
                Ok(transcript) => self.context_transcript = transcript,
                Err(e) => self.last_error = Some(e.to_string()),
            },
            Action::Continue => {
                if !self.can_continue() {
                    tracing::debug!(step = ?self.step, "continue ignored");
                    return None;
                }
                self.step = match self.step {
                    Step::Upload => Step::Context,
                    Step::Context | Step::Call => Step::Call,
                };
            }
            Action::SubmitMessage(text) => {
                if text.trim().is_empty() {
                    return None;
                }
                self.conversation.push_user(text.clone());
                self.awaiting_reply = true;
                return Some(Effect::SimulateConversation(ConversationTurn {
                    user_input: text,
                    conversation_history: self.conversation.history(),
                }));
            }
            Action::ReplyReceived(result) => {
                self.awaiting_reply = false;
                match result {
                    Ok(reply) => self.conversation.push_ai(reply),
                    Err(e) => self.last_error = Some(e.to_string()),
                }
            }
            Action::Call(event) => self.apply_call_event(event),
            Action::SetMuted(muted) => {
                if self.call.active {
                    self.call.muted = muted;
                }
            }
            Action::EndCall => {
                self.step = Step::Upload;
                self.call = CallView::default();
                self.conversation = ConversationLog::new();
                self.awaiting_reply = false;
            }
            Action::DismissError => self.last_error = None,
        }
        None
    }

    fn apply_call_event(&mut self, event: CallEvent) {
        match event {
            CallEvent::CallStarted => self.call.active = true,
            CallEvent::CallEnded => {
                self.call.active = false;
                self.call.muted = false;
                self.call.speaking = false;
                self.call.live_partial = None;
            }
            CallEvent::SpeechStarted => self.call.speaking = true,
            CallEvent::SpeechEnded => self.call.speaking = false,
            CallEvent::PartialTranscript(text) => self.call.live_partial = Some(text),
            CallEvent::FinalTranscript(text) => {
                self.call.live_partial = None;
                self.conversation.push_user(text);
            }
            CallEvent::FunctionCall(call) => self.call.last_function_call = Some(call),
            CallEvent::Error(message) => self.last_error = Some(message),
        }
    }
}
