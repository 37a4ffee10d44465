//! Events broadcast by the session controller.
//!
//! ## Channels
//!
//! | Event | Emitted when |
//! |-------|--------------|
//! | [`SessionStatusEvent`] | the session status transitions |
//! | [`SubmissionCompletedEvent`] | a successful submission is applied |
//! | [`HistoryUpdatedEvent`] | a history refresh is applied |
//!
//! Events are value snapshots (`Clone` + serde) so hosts can forward them to
//! presentation layers unchanged.

use serde::{Deserialize, Serialize};

/// Current state of a transcription session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No submission issued yet.
    Idle,
    /// The most recently issued submission is in flight.
    Submitting,
    /// The most recently issued submission settled successfully.
    Succeeded,
    /// The most recently issued submission settled with an error.
    Failed,
}

/// Emitted on every status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Token of the submission that caused the transition.
    pub request: u64,
    pub status: SessionStatus,
    /// Human-readable detail (the error display string on failures).
    pub detail: Option<String>,
}

/// Emitted after a successful submission is applied. Drives history sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCompletedEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Token of the settled submission.
    pub request: u64,
    /// Service-assigned id of the new transcription.
    pub transcription_id: String,
}

/// Emitted after the history collection is replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryUpdatedEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Number of entries now held.
    pub entries: usize,
}
