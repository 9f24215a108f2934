use std::path::PathBuf;

use async_trait::async_trait;
use bifrost_core::TranscriptSnapshot;
use tokio::sync::Mutex;

use crate::error::SyncError;

/// The only way to read the conversation: a one-shot "export all text".
///
/// Capture latency runs from hundreds of milliseconds to low seconds, and an
/// occasional empty or truncated snapshot is valid output, not an error.
/// Capture is stateful and exclusive on the source side; all callers must go
/// through a [`CaptureChannel`] so calls never interleave.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn capture(&self) -> anyhow::Result<TranscriptSnapshot>;
}

/// File-backed source: each capture reads the whole file as the snapshot.
/// A missing file is an empty transcript, not an error.
pub struct FileTranscriptSource {
    path: PathBuf,
}

impl FileTranscriptSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TranscriptSource for FileTranscriptSource {
    async fn capture(&self) -> anyhow::Result<TranscriptSnapshot> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(TranscriptSnapshot::new(text))
    }
}

/// Single-owner access point for the capture side channel. Concurrent
/// callers (a stabilization wait and the background sync loop) queue on the
/// lock rather than racing the source.
pub struct CaptureChannel {
    source: Mutex<Box<dyn TranscriptSource>>,
}

impl CaptureChannel {
    pub fn new(source: Box<dyn TranscriptSource>) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }

    /// Capture a snapshot with the channel held exclusively for the call.
    pub async fn capture(&self) -> Result<TranscriptSnapshot, SyncError> {
        let source = self.source.lock().await;
        source
            .capture()
            .await
            .map_err(|e| SyncError::Capture(e.to_string()))
    }
}
