use thiserror::Error;

/// Errors at the engine's two external seams. Neither is fatal to the host:
/// capture failures are retried next poll, publish failures are logged and
/// the batch is dropped.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The transcript source failed to produce a snapshot.
    #[error("transcript capture failed: {0}")]
    Capture(String),
    /// The subscriber side rejected a batch.
    #[error("publish failed: {0}")]
    Publish(String),
}
