use std::sync::Arc;

use bifrost_core::Baseline;
use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::source::CaptureChannel;

/// Holds the last snapshot treated as "already seen". Exactly one baseline
/// is active per synchronization session; it is replaced wholesale, never
/// merged.
pub struct BaselineTracker {
    channel: Arc<CaptureChannel>,
    current: Mutex<Option<Baseline>>,
}

impl BaselineTracker {
    pub fn new(channel: Arc<CaptureChannel>) -> Self {
        Self {
            channel,
            current: Mutex::new(None),
        }
    }

    /// Capture a fresh snapshot and store it as the new baseline.
    pub async fn capture(&self) -> Result<Baseline, SyncError> {
        let snap = self.channel.capture().await?;
        *self.current.lock().await = Some(snap.clone());
        Ok(snap)
    }

    pub async fn current(&self) -> Option<Baseline> {
        self.current.lock().await.clone()
    }
}
