use std::sync::Arc;
use std::time::Duration;

use bifrost_transcript::MessageSegmenter;
use tokio_util::sync::CancellationToken;

use crate::publish::{MessageBatch, Publisher, METHOD_PERIODIC_SYNC};
use crate::source::CaptureChannel;

/// Fixed-interval settings for the background sync loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// How many trailing messages of the re-segmented transcript go into
    /// each batch.
    pub recent_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(env_u64("BIFROST_SYNC_INTERVAL_SECS", 5)),
            recent_limit: env_u64("BIFROST_SYNC_RECENT_LIMIT", 15) as usize,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Owned handle to a running sync loop. `stop` is the only teardown path;
/// dropping the handle without calling it leaks the loop by design (the
/// orchestration layer owns handle lifetimes).
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl SchedulerHandle {
    /// Cancel the loop and wait for the task to drain.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Indefinitely-running periodic synchronization.
///
/// Each tick captures a snapshot, skips if it is byte-identical to the last
/// synchronized one, otherwise re-segments the entire transcript (the source
/// exposes no incremental read for this mode), pushes the trailing
/// `recent_limit` messages, and advances the last-synced pointer. The pointer
/// advances even when the push fails, so a failed batch is dropped rather
/// than retried.
pub struct SyncScheduler {
    channel: Arc<CaptureChannel>,
    publisher: Arc<dyn Publisher>,
    segmenter: MessageSegmenter,
    config: SchedulerConfig,
}

impl SyncScheduler {
    pub fn new(channel: Arc<CaptureChannel>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            channel,
            publisher,
            segmenter: MessageSegmenter::default(),
            config: SchedulerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_segmenter(mut self, segmenter: MessageSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Run one tick synchronously so the caller observes at least one sync,
    /// then hand the loop to a background task. The returned handle is the
    /// only way to stop it.
    pub async fn start(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let mut last_synced: Option<String> = None;

        self.tick(&mut last_synced).await;

        let child = cancel.clone();
        let interval = self.config.interval;
        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            // The immediate first interval tick is already covered by the
            // synchronous tick above.
            timer.tick().await;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = timer.tick() => {
                        self.tick(&mut last_synced).await;
                    }
                }
            }
            tracing::debug!("sync loop stopped");
        });

        SchedulerHandle { cancel, task }
    }

    async fn tick(&self, last_synced: &mut Option<String>) {
        let snap = match self.channel.capture().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "capture failed; skipping tick");
                return;
            }
        };

        if last_synced.as_deref() == Some(snap.text.as_str()) {
            tracing::debug!("transcript unchanged; skipping push");
            return;
        }

        let mut messages = self.segmenter.segment(&snap.text);
        if messages.len() > self.config.recent_limit {
            messages.drain(..messages.len() - self.config.recent_limit);
        }

        if messages.is_empty() {
            tracing::debug!("transcript changed but segmented to no messages");
        } else {
            let batch = MessageBatch::new(messages, METHOD_PERIODIC_SYNC);
            tracing::info!(
                message_count = batch.metadata.message_count,
                content_length = batch.metadata.content_length,
                "pushing sync batch"
            );
            if let Err(e) = self.publisher.publish(&batch) {
                tracing::warn!(error = %e, "publish failed; batch dropped");
            }
        }

        *last_synced = Some(snap.text);
    }
}
