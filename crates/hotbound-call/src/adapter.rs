use crate::normalize::normalize;
use crate::sdk::{RawSignal, VoiceSdk};
use hotbound_core::{CallEvent, SessionError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

// Markers the adapter threads through the signal channel. The channel is FIFO,
// so everything queued ahead of an open marker belongs to an earlier session.
const SESSION_OPEN: &str = "hotbound/session-open";
const SESSION_ABORT: &str = "hotbound/session-abort";

/// Owns the voice SDK and republishes its signals as [`CallEvent`]s.
///
/// Constructed without an SDK (missing credential) the adapter stays usable:
/// every operation reports [`SessionError::AdapterUninitialized`] and emits a
/// [`CallEvent::Error`] instead of panicking.
pub struct CallSessionAdapter {
    sdk: Option<Box<dyn VoiceSdk>>,
    active: Arc<AtomicBool>,
    muted: Arc<AtomicBool>,
    event_tx: mpsc::UnboundedSender<CallEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<CallEvent>>,
    signal_tx: mpsc::UnboundedSender<RawSignal>,
    signal_rx: Option<mpsc::UnboundedReceiver<RawSignal>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl CallSessionAdapter {
    pub fn new(sdk: Option<Box<dyn VoiceSdk>>) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let sdk = sdk.map(|mut sdk| {
            tracing::info!(sdk = sdk.name(), "subscribing to voice SDK");
            sdk.subscribe(signal_tx.clone());
            sdk
        });
        if sdk.is_none() {
            tracing::warn!("no voice SDK configured; call session is unavailable");
        }

        Self {
            sdk,
            active: Arc::new(AtomicBool::new(false)),
            muted: Arc::new(AtomicBool::new(false)),
            event_tx,
            event_rx: Some(event_rx),
            signal_tx,
            signal_rx: Some(signal_rx),
            shutdown_tx: None,
            task_handle: None,
        }
    }

    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<CallEvent>> {
        self.event_rx.take()
    }

    pub fn is_initialized(&self) -> bool {
        self.sdk.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Spawn the task that normalizes SDK signals and forwards them.
    pub fn start(&mut self) {
        let Some(mut rx) = self.signal_rx.take() else {
            tracing::warn!("call session adapter already started");
            return;
        };
        let active = Arc::clone(&self.active);
        let muted = Arc::clone(&self.muted);
        let event_tx = self.event_tx.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            // Whether the pump is inside a session, and whether it forwarded
            // that session's `CallStarted`.
            let mut open = false;
            let mut announced = false;
            loop {
                // Queued signals are drained before a shutdown request is honored.
                let signal = tokio::select! {
                    biased;
                    signal = rx.recv() => match signal {
                        Some(signal) => signal,
                        None => break,
                    },
                    _ = &mut shutdown_rx => break,
                };
                match signal.name.as_str() {
                    SESSION_OPEN => {
                        open = true;
                        announced = false;
                        continue;
                    }
                    SESSION_ABORT => {
                        if open && announced && event_tx.send(CallEvent::CallEnded).is_err() {
                            tracing::debug!("call event receiver dropped");
                        }
                        open = false;
                        muted.store(false, Ordering::SeqCst);
                        continue;
                    }
                    _ => {}
                }
                let Some(event) = normalize(&signal) else {
                    continue;
                };
                match event {
                    CallEvent::CallStarted => {
                        if !open {
                            tracing::debug!("dropping call-start outside a session");
                            continue;
                        }
                        announced = true;
                    }
                    CallEvent::CallEnded => {
                        if !open {
                            tracing::debug!("dropping call-end for a session that already ended");
                            continue;
                        }
                        open = false;
                        active.store(false, Ordering::SeqCst);
                        muted.store(false, Ordering::SeqCst);
                    }
                    _ => {}
                }
                tracing::debug!(?event, "call event");
                if event_tx.send(event).is_err() {
                    tracing::debug!("call event receiver dropped");
                }
            }
        });

        self.task_handle = Some(handle);
    }

    /// Begin a call. A second start while a call is active is rejected before
    /// the SDK is touched.
    pub async fn start_call(
        &self,
        assistant_id: &str,
        overrides: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), SessionError> {
        let sdk = self.require_sdk()?;
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("start_call ignored: a call is already active");
            return Err(SessionError::AlreadyActive);
        }

        self.mark(SESSION_OPEN);
        tracing::info!(sdk = sdk.name(), assistant_id, "starting call");
        if let Err(e) = sdk.start(assistant_id, overrides).await {
            // Queued ahead of any later open marker, so late signals from this
            // attempt are discarded.
            self.mark(SESSION_ABORT);
            self.active.store(false, Ordering::SeqCst);
            tracing::error!(sdk = sdk.name(), "start failed: {e}");
            return Err(e);
        }
        Ok(())
    }

    /// Ask the SDK to end the call. The session is idle once `CallEnded` is observed.
    pub async fn stop_call(&self) -> Result<(), SessionError> {
        let sdk = self.require_sdk()?;
        if !self.is_active() {
            tracing::debug!("stop_call with no active call");
            return Ok(());
        }
        tracing::info!(sdk = sdk.name(), "stopping call");
        sdk.stop().await
    }

    pub fn set_muted(&self, muted: bool) -> Result<(), SessionError> {
        let sdk = self.require_sdk()?;
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }
        sdk.set_muted(muted);
        self.muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    fn mark(&self, marker: &str) {
        if self.signal_tx.send(RawSignal::bare(marker)).is_err() {
            tracing::debug!(marker, "signal pump is gone");
        }
    }

    fn require_sdk(&self) -> Result<&dyn VoiceSdk, SessionError> {
        match self.sdk.as_deref() {
            Some(sdk) => Ok(sdk),
            None => {
                let err = SessionError::AdapterUninitialized;
                let _ = self.event_tx.send(CallEvent::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Stop the signal pump and wait for it to finish.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                tracing::error!("call signal pump failed: {e}");
            }
        }
    }
}
