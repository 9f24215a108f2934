use std::sync::Arc;

use bifrost_core::{Baseline, SessionStatus, SyncSession};
use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::publish::Publisher;
use crate::scheduler::{SchedulerConfig, SchedulerHandle, SyncScheduler};
use crate::source::{CaptureChannel, TranscriptSource};
use crate::stabilize::{StabilizationMonitor, StabilizeOutcome, StabilizePolicy};
use crate::tracker::BaselineTracker;

/// Outcome of a one-shot capture-and-wait operation.
#[derive(Debug)]
pub struct SessionOutcome {
    pub session: SyncSession,
    pub reply: Option<String>,
}

struct ActiveSession {
    session: SyncSession,
    handle: SchedulerHandle,
}

/// Owns the capture channel, the publisher, and the single active background
/// scheduler. Starting a new continuous session replaces the previous one;
/// schedulers never stack.
pub struct SessionManager {
    channel: Arc<CaptureChannel>,
    publisher: Arc<dyn Publisher>,
    tracker: BaselineTracker,
    scheduler_config: SchedulerConfig,
    policy: StabilizePolicy,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionManager {
    pub fn new(source: Box<dyn TranscriptSource>, publisher: Arc<dyn Publisher>) -> Self {
        let channel = Arc::new(CaptureChannel::new(source));
        let tracker = BaselineTracker::new(channel.clone());
        Self {
            channel,
            publisher,
            tracker,
            scheduler_config: SchedulerConfig::default(),
            policy: StabilizePolicy::default(),
            active: Mutex::new(None),
        }
    }

    pub fn with_scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.scheduler_config = config;
        self
    }

    pub fn with_stabilize_policy(mut self, policy: StabilizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start continuous background synchronization for a new session,
    /// stopping any prior scheduler first.
    pub async fn start_session(&self, original_prompt: &str) -> Result<SyncSession, SyncError> {
        let mut active = self.active.lock().await;
        if let Some(prev) = active.take() {
            tracing::info!(session_id = %prev.session.session_id, "replacing active sync session");
            prev.handle.stop().await;
        }

        let baseline = self.tracker.capture().await?;
        let session = SyncSession::new(original_prompt, baseline);
        let scheduler = SyncScheduler::new(self.channel.clone(), self.publisher.clone())
            .with_config(self.scheduler_config.clone());
        let handle = scheduler.start().await;

        tracing::info!(session_id = %session.session_id, "sync session started");
        *active = Some(ActiveSession {
            session: session.clone(),
            handle,
        });
        Ok(session)
    }

    /// Stop the active session's scheduler, if any, and return the session.
    pub async fn stop_session(&self) -> Option<SyncSession> {
        let active = self.active.lock().await.take()?;
        active.handle.stop().await;
        tracing::info!(session_id = %active.session.session_id, "sync session stopped");
        Some(active.session)
    }

    /// One-shot flow: capture a baseline now, then wait for the reply to
    /// `original_prompt` to stabilize. The monitor queues behind any running
    /// scheduler on the capture channel instead of racing it.
    pub async fn capture_and_wait(&self, original_prompt: &str) -> SessionOutcome {
        let baseline = match self.tracker.capture().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "baseline capture failed");
                let mut session = SyncSession::new(original_prompt, Baseline::new(""));
                session.status = SessionStatus::Failed;
                return SessionOutcome {
                    session,
                    reply: None,
                };
            }
        };
        let mut session = SyncSession::new(original_prompt, baseline.clone());

        let monitor =
            StabilizationMonitor::new(self.channel.clone()).with_policy(self.policy.clone());
        match monitor.monitor(original_prompt, &baseline).await {
            StabilizeOutcome::Stable(content) => {
                session.status = SessionStatus::Stabilized;
                SessionOutcome {
                    session,
                    reply: Some(content),
                }
            }
            StabilizeOutcome::TimedOut(best) => {
                session.status = SessionStatus::TimedOut;
                SessionOutcome {
                    session,
                    reply: best,
                }
            }
        }
    }
}
