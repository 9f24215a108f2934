use std::path::PathBuf;
use std::time::Duration;

use bifrost_core::{id, ExtractedMessage};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Method tag for batches produced by the background sync loop.
pub const METHOD_PERIODIC_SYNC: &str = "periodic_sync";

/// Envelope metadata accompanying every pushed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub message_count: usize,
    pub content_length: usize,
    pub timestamp: String,
    pub method: String,
}

/// One push to the subscriber: ordered messages plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBatch {
    pub messages: Vec<ExtractedMessage>,
    pub metadata: BatchMetadata,
}

impl MessageBatch {
    pub fn new(messages: Vec<ExtractedMessage>, method: &str) -> Self {
        let content_length = messages.iter().map(|m| m.content.len()).sum();
        let metadata = BatchMetadata {
            message_count: messages.len(),
            content_length,
            timestamp: id::now_rfc3339(),
            method: method.to_string(),
        };
        Self { messages, metadata }
    }
}

/// Receives extracted message batches. Fire-and-forget from the engine's
/// perspective: callers log failures and drop the batch; there is no retry
/// or buffering.
pub trait Publisher: Send + Sync {
    fn publish(&self, batch: &MessageBatch) -> Result<(), SyncError>;
    fn display_name(&self) -> String;
}

const TIMEOUT: Duration = Duration::from_secs(5);

// ── Webhook (generic JSON POST) ──

pub struct WebhookPublisher {
    url: String,
}

impl WebhookPublisher {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Publisher for WebhookPublisher {
    fn publish(&self, batch: &MessageBatch) -> Result<(), SyncError> {
        let payload =
            serde_json::to_string(batch).map_err(|e| SyncError::Publish(e.to_string()))?;
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .build()
            .new_agent();
        agent
            .post(&self.url)
            .header("Content-Type", "application/json")
            .send(payload)
            .map_err(|e| SyncError::Publish(e.to_string()))?;
        Ok(())
    }

    fn display_name(&self) -> String {
        format!("webhook({})", self.url)
    }
}

// ── JSONL file sink ──

/// Appends each batch as one JSONL line. Useful as a local ledger of what
/// was pushed, and as the default sink when no remote is configured.
pub struct JsonlPublisher {
    path: PathBuf,
}

impl JsonlPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Publisher for JsonlPublisher {
    fn publish(&self, batch: &MessageBatch) -> Result<(), SyncError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SyncError::Publish(e.to_string()))?;
            }
        }
        let line =
            serde_json::to_string(batch).map_err(|e| SyncError::Publish(e.to_string()))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SyncError::Publish(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| SyncError::Publish(e.to_string()))?;
        Ok(())
    }

    fn display_name(&self) -> String {
        format!("jsonl({})", self.path.display())
    }
}

// ── Stdout ──

/// Prints each batch as a JSON line on stdout.
pub struct StdoutPublisher;

impl Publisher for StdoutPublisher {
    fn publish(&self, batch: &MessageBatch) -> Result<(), SyncError> {
        let line =
            serde_json::to_string(batch).map_err(|e| SyncError::Publish(e.to_string()))?;
        println!("{line}");
        Ok(())
    }

    fn display_name(&self) -> String {
        "stdout".to_string()
    }
}

// ── Fan-out ──

/// Pushes to every configured target. A per-target failure is logged and
/// does not stop the rest; fan-out itself never fails.
pub struct FanoutPublisher {
    targets: Vec<Box<dyn Publisher>>,
}

impl FanoutPublisher {
    pub fn new(targets: Vec<Box<dyn Publisher>>) -> Self {
        Self { targets }
    }
}

impl Publisher for FanoutPublisher {
    fn publish(&self, batch: &MessageBatch) -> Result<(), SyncError> {
        for target in &self.targets {
            if let Err(e) = target.publish(batch) {
                tracing::warn!(target = %target.display_name(), error = %e, "publish target failed");
            }
        }
        Ok(())
    }

    fn display_name(&self) -> String {
        let names: Vec<String> = self.targets.iter().map(|t| t.display_name()).collect();
        format!("fanout[{}]", names.join(", "))
    }
}

/// Send a synthetic batch to each target individually. Returns per-target
/// results for CLI display.
pub fn test_targets(targets: &[Box<dyn Publisher>]) -> Vec<(String, Result<(), String>)> {
    let message = ExtractedMessage::new(
        bifrost_core::Role::Assistant,
        "bifrost publish test — if you see this, publishing is working!",
        "Copilot: bifrost publish test",
    );
    let batch = MessageBatch::new(vec![message], "publish_test");
    targets
        .iter()
        .map(|t| {
            let name = t.display_name();
            let result = t.publish(&batch).map_err(|e| e.to_string());
            (name, result)
        })
        .collect()
}

// ── Test support ──

/// Publisher that records every batch in memory.
#[cfg(test)]
pub(crate) struct MemoryPublisher {
    pub batches: std::sync::Mutex<Vec<MessageBatch>>,
}

#[cfg(test)]
impl MemoryPublisher {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            batches: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[cfg(test)]
impl Publisher for MemoryPublisher {
    fn publish(&self, batch: &MessageBatch) -> Result<(), SyncError> {
        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }

    fn display_name(&self) -> String {
        "memory".to_string()
    }
}
