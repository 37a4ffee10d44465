//! Remote transcription service contract.
//!
//! [`TranscriptionService`] is the seam between the session controller and
//! the network. Production hosts use [`http::HttpTranscriptionService`];
//! tests substitute scripted doubles.

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::{HistoryEntry, ModelSize, ServiceHealth, Transcription};

/// A raw audio payload for submission.
///
/// No client-side size or format validation happens here; any rejection is
/// surfaced by the service as a [`crate::ApiError::Validation`].
#[derive(Debug, Clone)]
pub struct AudioUpload {
    /// Original filename, forwarded as the multipart part filename.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Out-of-body submission parameters, sent as request query metadata rather
/// than multipart fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitParams {
    /// Optional ISO language hint (e.g. "en"), passed through unvalidated.
    pub language: Option<String>,
    pub model_size: ModelSize,
}

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Upload one audio file and wait for its transcription.
    async fn submit_transcription(
        &self,
        upload: AudioUpload,
        params: SubmitParams,
    ) -> Result<Transcription>;

    /// Fetch the history collection, in the order the service defines.
    async fn list_history(&self) -> Result<Vec<HistoryEntry>>;

    /// Probe the service health endpoint.
    async fn check_health(&self) -> Result<ServiceHealth>;
}
