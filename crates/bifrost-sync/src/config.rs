use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::publish::{FanoutPublisher, JsonlPublisher, Publisher, StdoutPublisher, WebhookPublisher};
use crate::scheduler::SchedulerConfig;
use crate::stabilize::StabilizePolicy;

/// One configured publish target.
#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "type")]
pub enum PublisherTarget {
    #[serde(rename = "webhook")]
    Webhook { url: String },
    #[serde(rename = "jsonl")]
    Jsonl { path: PathBuf },
    #[serde(rename = "stdout")]
    Stdout,
}

impl PublisherTarget {
    pub fn build(&self) -> Box<dyn Publisher> {
        match self {
            PublisherTarget::Webhook { url } => Box::new(WebhookPublisher::new(url.clone())),
            PublisherTarget::Jsonl { path } => Box::new(JsonlPublisher::new(path.clone())),
            PublisherTarget::Stdout => Box::new(StdoutPublisher),
        }
    }
}

/// Runtime configuration, loaded from `bifrost.json`. A missing or
/// unparseable file falls back to defaults rather than failing startup.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct BifrostConfig {
    #[serde(default)]
    pub publishers: Vec<PublisherTarget>,
    #[serde(default)]
    pub sync_interval_secs: Option<u64>,
    #[serde(default)]
    pub recent_limit: Option<usize>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub stable_threshold: Option<u32>,
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
}

impl BifrostConfig {
    /// Load from a JSON file. Returns defaults if the file is missing or
    /// does not parse.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config did not parse; using defaults");
                Self::default()
            }
        }
    }

    /// Scheduler settings with config-file overrides applied on top of the
    /// env/built-in defaults.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        let mut config = SchedulerConfig::default();
        if let Some(secs) = self.sync_interval_secs {
            config.interval = Duration::from_secs(secs);
        }
        if let Some(limit) = self.recent_limit {
            config.recent_limit = limit;
        }
        config
    }

    /// Stabilization settings with config-file overrides applied.
    pub fn stabilize_policy(&self) -> StabilizePolicy {
        let mut policy = StabilizePolicy::default();
        if let Some(ms) = self.poll_interval_ms {
            policy.poll_interval = Duration::from_millis(ms);
        }
        if let Some(n) = self.stable_threshold {
            policy.stable_threshold = n;
        }
        if let Some(secs) = self.max_wait_secs {
            policy.max_duration = Duration::from_secs(secs);
        }
        policy
    }

    pub fn build_targets(&self) -> Vec<Box<dyn Publisher>> {
        self.publishers.iter().map(|t| t.build()).collect()
    }

    /// Build the engine-facing publisher: a fan-out over all configured
    /// targets, or stdout when none are configured.
    pub fn build_publisher(&self) -> Arc<dyn Publisher> {
        if self.publishers.is_empty() {
            return Arc::new(StdoutPublisher);
        }
        Arc::new(FanoutPublisher::new(self.build_targets()))
    }
}
