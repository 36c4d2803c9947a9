//! A [`VoiceSdk`] that plays back a fixed list of signals.
//!
//! Used in tests and by the `call --replay` command, which feeds it a JSONL
//! recording of a real session (`{"event": "...", "payload": ...}` per line).

use crate::sdk::{RawSignal, VoiceSdk, CALL_END, CALL_START};
use async_trait::async_trait;
use hotbound_core::SessionError;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Observes and drives a [`ScriptedSdk`] after it has been handed to an adapter.
#[derive(Default)]
pub struct ScriptControl {
    signals: Mutex<Option<mpsc::UnboundedSender<RawSignal>>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    muted: AtomicBool,
    last_assistant: Mutex<Option<String>>,
}

impl ScriptControl {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn last_assistant(&self) -> Option<String> {
        self.last_assistant.lock().ok().and_then(|a| a.clone())
    }

    /// Push a signal as if the provider produced it. Dropped when nothing subscribed.
    pub fn emit(&self, signal: RawSignal) {
        let Ok(signals) = self.signals.lock() else {
            return;
        };
        match signals.as_ref() {
            Some(tx) => {
                if tx.send(signal).is_err() {
                    tracing::debug!("signal subscriber dropped");
                }
            }
            None => tracing::debug!(signal = %signal.name, "no subscriber for signal"),
        }
    }
}

pub struct ScriptedSdk {
    name: String,
    script: Vec<RawSignal>,
    announce_start: bool,
    end_on_stop: bool,
    start_failure: Option<String>,
    control: Arc<ScriptControl>,
}

impl ScriptedSdk {
    /// Emits `call-start` followed by `script` on start and `call-end` on stop.
    pub fn new(script: Vec<RawSignal>) -> Self {
        Self {
            name: "scripted".to_string(),
            script,
            announce_start: true,
            end_on_stop: true,
            start_failure: None,
            control: Arc::new(ScriptControl::default()),
        }
    }

    /// Plays back a recording verbatim; lifecycle signals come from the recording.
    pub fn from_jsonl_str(text: &str) -> Result<Self, SessionError> {
        let mut script = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let signal: RawSignal = serde_json::from_str(line)
                .map_err(|e| SessionError::Sdk(format!("recording line {}: {e}", idx + 1)))?;
            script.push(signal);
        }
        Ok(Self {
            name: "replay".to_string(),
            announce_start: false,
            ..Self::new(script)
        })
    }

    pub fn from_jsonl_file(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SessionError::Sdk(format!("failed to read recording {}: {e}", path.display()))
        })?;
        let sdk = Self::from_jsonl_str(&text)?;
        tracing::info!(
            path = %path.display(),
            signals = sdk.script.len(),
            "loaded call recording"
        );
        Ok(sdk)
    }

    /// Make every `start` fail with `message`.
    pub fn fail_start_with(mut self, message: impl Into<String>) -> Self {
        self.start_failure = Some(message.into());
        self
    }

    /// Do not emit `call-end` on stop; the test emits it through the control.
    pub fn with_manual_end(mut self) -> Self {
        self.end_on_stop = false;
        self
    }

    pub fn control(&self) -> Arc<ScriptControl> {
        Arc::clone(&self.control)
    }

    pub fn script_len(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl VoiceSdk for ScriptedSdk {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscribe(&mut self, signals: mpsc::UnboundedSender<RawSignal>) {
        if let Ok(mut slot) = self.control.signals.lock() {
            *slot = Some(signals);
        }
    }

    async fn start(
        &self,
        assistant_id: &str,
        overrides: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), SessionError> {
        self.control.starts.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.control.last_assistant.lock() {
            *last = Some(assistant_id.to_string());
        }
        if let Some(message) = &self.start_failure {
            return Err(SessionError::Sdk(message.clone()));
        }
        if !overrides.is_empty() {
            tracing::debug!(keys = overrides.len(), "assistant overrides ignored by {}", self.name);
        }

        if self.announce_start {
            self.control.emit(RawSignal::bare(CALL_START));
        }
        for signal in &self.script {
            self.control.emit(signal.clone());
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), SessionError> {
        self.control.stops.fetch_add(1, Ordering::SeqCst);
        if self.end_on_stop {
            self.control.emit(RawSignal::bare(CALL_END));
        }
        Ok(())
    }

    fn set_muted(&self, muted: bool) {
        self.control.muted.store(muted, Ordering::SeqCst);
    }
}
