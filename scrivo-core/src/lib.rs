//! # scrivo-core
//!
//! Client SDK for a remote speech-to-text service: submit an audio file,
//! track the asynchronous request lifecycle, and browse previously completed
//! transcriptions.
//!
//! ## Architecture
//!
//! ```text
//! host (CLI / UI) ──submit()──────► SessionController ──POST /transcribe/──► service
//!       ▲                               │
//!       │ snapshot() + broadcast:       │ state: RwLock<SessionState>
//!       │  status │ completed │ history │
//!       └───────────────────────────────┤
//!                                       ▼
//!                         history_sync task ──GET /history/──► service
//! ```
//!
//! The controller is the single authority over session state. Consumers read
//! cloned snapshots and subscribe to broadcast events; they never hold a
//! mutable reference. The network sits behind the [`TranscriptionService`]
//! trait so hosts and tests can substitute implementations.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod api;
pub mod error;
pub mod events;
pub mod session;

// Convenience re-exports for downstream crates
pub use api::http::{HttpTranscriptionService, ServiceConfig};
pub use api::types::{HistoryEntry, ModelSize, Segment, ServiceHealth, Transcription};
pub use api::{AudioUpload, SubmitParams, TranscriptionService};
pub use error::{ApiError, Result};
pub use events::{
    HistoryUpdatedEvent, SessionStatus, SessionStatusEvent, SubmissionCompletedEvent,
};
pub use session::{
    DiagnosticsSnapshot, RequestToken, SessionController, SessionDiagnostics, SessionSnapshot,
};
