//! `SessionController` — single authority over the transcription request
//! lifecycle and the history view.
//!
//! ## State machine
//!
//! ```text
//! Idle ──submit──► Submitting ──settle──► Succeeded
//!                      ▲    └───────────► Failed
//!                      └──── submit (from any settled state)
//! ```
//!
//! There is no terminal state; the controller is reusable indefinitely.
//! `refresh_history` mutates only the history field, never the status.
//!
//! ## Request tokens
//!
//! Every `submit` issues the next value of a monotonically increasing token
//! and marks it the latest, both under the state write lock. A settling
//! upload applies its outcome only if its token is still the latest;
//! anything else is discarded as stale. Two overlapping submits therefore
//! resolve to the most recently *issued* request, not to whichever response
//! happens to arrive last.
//!
//! ## History synchronization
//!
//! A successful submission does not refresh the history inline. The
//! controller emits a [`SubmissionCompletedEvent`] after the success is
//! applied; the [`history_sync`] task consumes those events and calls
//! [`SessionController::refresh_history`]. History failures are logged and
//! otherwise silent — they never touch `status` or `error`.

pub mod history_sync;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::types::{HistoryEntry, Transcription};
use crate::api::{AudioUpload, SubmitParams, TranscriptionService};
use crate::error::ApiError;
use crate::events::{
    HistoryUpdatedEvent, SessionStatus, SessionStatusEvent, SubmissionCompletedEvent,
};

/// Broadcast channel capacity per event kind.
const BROADCAST_CAP: usize = 64;

/// Token identifying one issued submission. Monotonically increasing,
/// starting at 1.
pub type RequestToken = u64;

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    result: Option<Transcription>,
    error: Option<ApiError>,
    history: Vec<HistoryEntry>,
    /// Token of the most recently issued submission (0 = none yet).
    latest: RequestToken,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            result: None,
            error: None,
            history: Vec::new(),
            latest: 0,
        }
    }
}

/// Read-only snapshot of the session, cloned out for consumers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    /// Result of the most recent successful submission. Retained across a
    /// later failure so consumers can keep displaying it under the error.
    pub result: Option<Transcription>,
    /// Error of the most recent failed submission; `None` outside `Failed`.
    pub error: Option<ApiError>,
    pub history: Vec<HistoryEntry>,
}

/// Counters for observability. Shared between the controller handle and its
/// spawned submission tasks.
#[derive(Debug, Default)]
pub struct SessionDiagnostics {
    pub submits_started: AtomicUsize,
    pub submits_succeeded: AtomicUsize,
    pub submits_failed: AtomicUsize,
    pub stale_discarded: AtomicUsize,
    pub history_refreshes: AtomicUsize,
    pub history_failures: AtomicUsize,
}

impl SessionDiagnostics {
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            submits_started: self.submits_started.load(Ordering::Relaxed),
            submits_succeeded: self.submits_succeeded.load(Ordering::Relaxed),
            submits_failed: self.submits_failed.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            history_refreshes: self.history_refreshes.load(Ordering::Relaxed),
            history_failures: self.history_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub submits_started: usize,
    pub submits_succeeded: usize,
    pub submits_failed: usize,
    pub stale_discarded: usize,
    pub history_refreshes: usize,
    pub history_failures: usize,
}

/// The controller handle.
///
/// Cheap to clone: all shared state sits behind `Arc` and channel senders.
/// Hosts typically keep one clone and hand another to the history-sync
/// task. Mutations happen under a single write lock, so a snapshot never
/// observes a half-applied transition.
#[derive(Clone)]
pub struct SessionController {
    service: Arc<dyn TranscriptionService>,
    state: Arc<RwLock<SessionState>>,
    /// Issued-token counter.
    tokens: Arc<AtomicU64>,
    /// Event sequence counter shared by all three channels.
    seq: Arc<AtomicU64>,
    status_tx: broadcast::Sender<SessionStatusEvent>,
    completed_tx: broadcast::Sender<SubmissionCompletedEvent>,
    history_tx: broadcast::Sender<HistoryUpdatedEvent>,
    diagnostics: Arc<SessionDiagnostics>,
}

impl SessionController {
    pub fn new(service: Arc<dyn TranscriptionService>) -> Self {
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (completed_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (history_tx, _) = broadcast::channel(BROADCAST_CAP);

        Self {
            service,
            state: Arc::new(RwLock::new(SessionState::new())),
            tokens: Arc::new(AtomicU64::new(0)),
            seq: Arc::new(AtomicU64::new(0)),
            status_tx,
            completed_tx,
            history_tx,
            diagnostics: Arc::new(SessionDiagnostics::default()),
        }
    }

    /// Issue one transcription submission.
    ///
    /// Returns immediately with the request token; the upload runs in a
    /// spawned task and its outcome arrives as state mutations plus events.
    /// Synchronously, before returning: the status moves to `Submitting` and
    /// any prior error is cleared (the prior result is untouched).
    ///
    /// Calling `submit` while an earlier submission is still in flight does
    /// not cancel the earlier upload, but its response will be discarded as
    /// stale when it settles.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, upload: AudioUpload, params: SubmitParams) -> RequestToken {
        let token = {
            let mut state = self.state.write();
            let token = self.tokens.fetch_add(1, Ordering::SeqCst) + 1;
            state.latest = token;
            state.status = SessionStatus::Submitting;
            state.error = None;
            token
        };
        self.diagnostics
            .submits_started
            .fetch_add(1, Ordering::Relaxed);
        info!(
            token,
            filename = %upload.filename,
            model_size = %params.model_size,
            "submission issued"
        );
        self.emit_status(token, SessionStatus::Submitting, None);

        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.service.submit_transcription(upload, params).await;
            this.apply_submit_outcome(token, outcome);
        });
        token
    }

    /// Re-fetch the history collection, replacing it wholesale on success in
    /// the order the service returned.
    ///
    /// Best effort, single attempt: on failure the previous history is
    /// retained and the failure is logged — `status` and `error` are never
    /// touched from here.
    pub async fn refresh_history(&self) {
        self.diagnostics
            .history_refreshes
            .fetch_add(1, Ordering::Relaxed);
        match self.service.list_history().await {
            Ok(entries) => {
                let count = entries.len();
                self.state.write().history = entries;
                debug!(entries = count, "history replaced");
                let _ = self.history_tx.send(HistoryUpdatedEvent {
                    seq: self.next_seq(),
                    entries: count,
                });
            }
            Err(e) => {
                self.diagnostics
                    .history_failures
                    .fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "history refresh failed; keeping previous entries");
            }
        }
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            status: state.status,
            result: state.result.clone(),
            error: state.error.clone(),
            history: state.history.clone(),
        }
    }

    /// Current status field only (cheaper than a full snapshot).
    pub fn status(&self) -> SessionStatus {
        self.state.read().status
    }

    /// Subscribe to status transition events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<SessionStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Subscribe to applied-success events.
    pub fn subscribe_completed(&self) -> broadcast::Receiver<SubmissionCompletedEvent> {
        self.completed_tx.subscribe()
    }

    /// Subscribe to history replacement events.
    pub fn subscribe_history(&self) -> broadcast::Receiver<HistoryUpdatedEvent> {
        self.history_tx.subscribe()
    }

    /// Spawn the history-sync task for this controller. See [`history_sync`].
    pub fn spawn_history_sync(&self) -> JoinHandle<()> {
        history_sync::spawn(self.clone())
    }

    /// Snapshot of session counters for observability.
    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn apply_submit_outcome(&self, token: RequestToken, outcome: crate::error::Result<Transcription>) {
        let mut state = self.state.write();
        if state.latest != token {
            drop(state);
            self.diagnostics
                .stale_discarded
                .fetch_add(1, Ordering::Relaxed);
            debug!(token, "discarding stale submission outcome");
            return;
        }
        match outcome {
            Ok(transcription) => {
                let transcription_id = transcription.id.clone();
                state.status = SessionStatus::Succeeded;
                state.error = None;
                state.result = Some(transcription);
                drop(state);

                self.diagnostics
                    .submits_succeeded
                    .fetch_add(1, Ordering::Relaxed);
                info!(token, id = %transcription_id, "submission succeeded");
                self.emit_status(token, SessionStatus::Succeeded, None);
                let _ = self.completed_tx.send(SubmissionCompletedEvent {
                    seq: self.next_seq(),
                    request: token,
                    transcription_id,
                });
            }
            Err(error) => {
                let detail = error.to_string();
                state.status = SessionStatus::Failed;
                state.error = Some(error);
                drop(state);

                self.diagnostics
                    .submits_failed
                    .fetch_add(1, Ordering::Relaxed);
                warn!(token, error = %detail, "submission failed");
                self.emit_status(token, SessionStatus::Failed, Some(detail));
            }
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn emit_status(&self, request: RequestToken, status: SessionStatus, detail: Option<String>) {
        let _ = self.status_tx.send(SessionStatusEvent {
            seq: self.next_seq(),
            request,
            status,
            detail,
        });
    }
}
