//! Best-effort history synchronization, decoupled from the submit path.
//!
//! The controller emits a [`SubmissionCompletedEvent`] after each applied
//! success; this task consumes them and re-fetches the history so the
//! collection reflects the new submission. If the task falls behind and the
//! channel drops events, the missed completions collapse into a single
//! refresh — each fetch returns the full collection anyway.
//!
//! [`SubmissionCompletedEvent`]: crate::events::SubmissionCompletedEvent

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::SessionController;

/// Spawn the sync loop.
///
/// The task runs for the lifetime of the runtime; hosts that want to tear it
/// down early can abort the returned handle. Refresh failures stay silent to
/// the session state, exactly as [`SessionController::refresh_history`]
/// documents.
pub fn spawn(controller: SessionController) -> JoinHandle<()> {
    let mut completed_rx = controller.subscribe_completed();
    tokio::spawn(async move {
        loop {
            match completed_rx.recv().await {
                Ok(event) => {
                    debug!(
                        request = event.request,
                        id = %event.transcription_id,
                        "submission completed; refreshing history"
                    );
                    controller.refresh_history().await;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "history sync lagged; collapsing into one refresh");
                    controller.refresh_history().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
