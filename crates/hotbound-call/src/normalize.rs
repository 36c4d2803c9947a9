//! Translation of raw SDK signals into [`CallEvent`]s.
//!
//! This is the only place untyped payloads are inspected. Structured messages
//! that do not match a known shape are dropped: the realtime channel has to
//! keep flowing even when the provider sends something unexpected.

use crate::sdk::{RawSignal, CALL_END, CALL_START, ERROR, MESSAGE, SPEECH_END, SPEECH_START};
use hotbound_core::{CallEvent, FunctionCall};
use serde::Deserialize;

const ADD_TOPPING: &str = "addTopping";

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AppMessage {
    #[serde(rename = "transcript")]
    Transcript {
        #[serde(rename = "transcriptType")]
        transcript_type: TranscriptKind,
        text: String,
    },
    #[serde(rename = "function-call")]
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: RawFunctionCall,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TranscriptKind {
    Partial,
    Final,
}

#[derive(Debug, Deserialize)]
struct RawFunctionCall {
    name: String,
    #[serde(default = "empty_object")]
    parameters: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Map one raw signal to at most one normalized event.
pub fn normalize(signal: &RawSignal) -> Option<CallEvent> {
    match signal.name.as_str() {
        CALL_START => Some(CallEvent::CallStarted),
        CALL_END => Some(CallEvent::CallEnded),
        SPEECH_START => Some(CallEvent::SpeechStarted),
        SPEECH_END => Some(CallEvent::SpeechEnded),
        MESSAGE => normalize_message(&signal.payload),
        ERROR => Some(CallEvent::Error(error_message(&signal.payload))),
        other => {
            tracing::debug!(signal = other, "ignoring unknown SDK signal");
            None
        }
    }
}

fn normalize_message(payload: &serde_json::Value) -> Option<CallEvent> {
    let message = match AppMessage::deserialize(payload) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!("dropping structured message: {e}");
            return None;
        }
    };

    match message {
        AppMessage::Transcript {
            transcript_type: TranscriptKind::Partial,
            text,
        } => Some(CallEvent::PartialTranscript(text)),
        AppMessage::Transcript {
            transcript_type: TranscriptKind::Final,
            text,
        } => Some(CallEvent::FinalTranscript(text)),
        AppMessage::FunctionCall { function_call } => {
            function_call_event(function_call).map(CallEvent::FunctionCall)
        }
    }
}

fn function_call_event(call: RawFunctionCall) -> Option<FunctionCall> {
    if call.name != ADD_TOPPING {
        return Some(FunctionCall::Other {
            name: call.name,
            parameters: call.parameters,
        });
    }
    match call.parameters.get("topping").and_then(|t| t.as_str()) {
        Some(topping) => Some(FunctionCall::AddTopping {
            topping: topping.to_string(),
        }),
        None => {
            tracing::debug!("dropping addTopping call without a topping");
            None
        }
    }
}

fn error_message(payload: &serde_json::Value) -> String {
    if let Some(s) = payload.as_str() {
        return s.to_string();
    }
    if let Some(s) = payload.get("message").and_then(|m| m.as_str()) {
        return s.to_string();
    }
    if payload.is_null() {
        return "unknown voice SDK error".to_string();
    }
    payload.to_string()
}
