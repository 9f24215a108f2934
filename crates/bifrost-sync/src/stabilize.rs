use std::sync::Arc;
use std::time::{Duration, Instant};

use bifrost_core::Baseline;
use bifrost_transcript::{DiffExtractor, Extraction};

use crate::source::CaptureChannel;

/// Tunables for one stabilization run.
#[derive(Debug, Clone)]
pub struct StabilizePolicy {
    /// Hard deadline for the whole run.
    pub max_duration: Duration,
    /// Sleep between capture polls.
    pub poll_interval: Duration,
    /// Consecutive unchanged polls required to call the reply finished.
    pub stable_threshold: u32,
}

impl Default for StabilizePolicy {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(env_u64("BIFROST_STABILIZE_TIMEOUT_SECS", 120)),
            poll_interval: Duration::from_millis(env_u64("BIFROST_POLL_INTERVAL_MS", 1500)),
            stable_threshold: env_u64("BIFROST_STABLE_THRESHOLD", 3) as u32,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Result of a stabilization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StabilizeOutcome {
    /// The extracted reply stopped growing for `stable_threshold` polls.
    Stable(String),
    /// Deadline hit. Carries the best partial candidate if any extraction
    /// succeeded along the way.
    TimedOut(Option<String>),
}

impl StabilizeOutcome {
    pub fn into_content(self) -> Option<String> {
        match self {
            StabilizeOutcome::Stable(c) => Some(c),
            StabilizeOutcome::TimedOut(best) => best,
        }
    }
}

/// Per-run growth tracking. Discarded when the run ends.
#[derive(Debug, Default)]
struct StabilizationState {
    last_extracted_len: usize,
    stable_count: u32,
    best_candidate: Option<String>,
    last_full_snapshot: String,
}

/// Polls the capture channel until the reply extracted against a baseline
/// stops growing.
///
/// The generation process has no completion signal visible to this engine,
/// so "no observed growth for N consecutive polls" is the completion proxy.
/// On timeout the best partial candidate is returned rather than discarded.
pub struct StabilizationMonitor {
    channel: Arc<CaptureChannel>,
    extractor: DiffExtractor,
    policy: StabilizePolicy,
}

impl StabilizationMonitor {
    pub fn new(channel: Arc<CaptureChannel>) -> Self {
        Self {
            channel,
            extractor: DiffExtractor::default(),
            policy: StabilizePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StabilizePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_extractor(mut self, extractor: DiffExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Wait for the reply to `original_prompt` to stabilize, measuring new
    /// content against `baseline`.
    pub async fn monitor(&self, original_prompt: &str, baseline: &Baseline) -> StabilizeOutcome {
        let deadline = Instant::now() + self.policy.max_duration;
        let mut baseline = baseline.clone();
        let mut state = StabilizationState::default();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(self.policy.poll_interval.min(remaining)).await;

            let snap = match self.channel.capture().await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "capture failed; treating as no progress");
                    continue;
                }
            };

            match self.extractor.extract_new(&snap, &baseline, original_prompt) {
                Extraction::Truncated => {
                    tracing::warn!("transcript reset mid-wait; adopting fresh baseline");
                    baseline = snap;
                    state = StabilizationState::default();
                }
                Extraction::Nothing => {
                    tracing::debug!("no extractable content yet");
                }
                Extraction::Content(content) => {
                    let unchanged = content.len() == state.last_extracted_len
                        && snap.text == state.last_full_snapshot;
                    if unchanged {
                        state.stable_count += 1;
                        tracing::debug!(stable_count = state.stable_count, "no growth observed");
                        if state.stable_count >= self.policy.stable_threshold {
                            return StabilizeOutcome::Stable(content);
                        }
                    } else {
                        state.stable_count = 0;
                        state.last_extracted_len = content.len();
                        state.last_full_snapshot = snap.text;
                        state.best_candidate = Some(content);
                    }
                }
            }
        }

        tracing::info!(
            had_candidate = state.best_candidate.is_some(),
            "stabilization deadline reached"
        );
        StabilizeOutcome::TimedOut(state.best_candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileTranscriptSource, TranscriptSource};
    use async_trait::async_trait;
    use bifrost_core::TranscriptSnapshot;
    use std::sync::Mutex;

    fn fast_policy(max_ms: u64, threshold: u32) -> StabilizePolicy {
        StabilizePolicy {
            max_duration: Duration::from_millis(max_ms),
            poll_interval: Duration::from_millis(10),
            stable_threshold: threshold,
        }
    }

    /// Source that replays a scripted sequence of snapshots, repeating the
    /// last one forever.
    struct ScriptedSource {
        snapshots: Mutex<Vec<String>>,
        last: Mutex<String>,
    }

    impl ScriptedSource {
        fn new(snapshots: &[&str]) -> Self {
            let mut s: Vec<String> = snapshots.iter().map(|t| t.to_string()).collect();
            s.reverse(); // pop from the end
            Self {
                snapshots: Mutex::new(s),
                last: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl TranscriptSource for ScriptedSource {
        async fn capture(&self) -> anyhow::Result<TranscriptSnapshot> {
            let mut snapshots = self.snapshots.lock().unwrap();
            let text = match snapshots.pop() {
                Some(t) => {
                    *self.last.lock().unwrap() = t.clone();
                    t
                }
                None => self.last.lock().unwrap().clone(),
            };
            Ok(TranscriptSnapshot::new(text))
        }
    }

    fn channel(snapshots: &[&str]) -> Arc<CaptureChannel> {
        Arc::new(CaptureChannel::new(Box::new(ScriptedSource::new(snapshots))))
    }

    #[tokio::test]
    async fn returns_stable_before_deadline() {
        let base = "You: explain the diff\n";
        let grown = format!("{base}Copilot: it compares byte lengths and slices");
        let ch = channel(&[base, &grown]);
        let baseline = TranscriptSnapshot::new(base);

        let monitor =
            StabilizationMonitor::new(ch).with_policy(fast_policy(5_000, 2));
        let start = Instant::now();
        let outcome = monitor.monitor("explain the diff", &baseline).await;

        assert_eq!(
            outcome,
            StabilizeOutcome::Stable("Copilot: it compares byte lengths and slices".into())
        );
        // Stabilized well before the 5s deadline.
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn timeout_returns_best_candidate() {
        // Content grows on every poll and never stabilizes.
        let base = "prompt line\n";
        let mut script: Vec<String> = Vec::new();
        let mut text = base.to_string();
        for i in 0..200 {
            text.push_str(&format!("still generating part {i}\n"));
            script.push(text.clone());
        }
        let refs: Vec<&str> = script.iter().map(|s| s.as_str()).collect();
        let ch = channel(&refs);
        let baseline = TranscriptSnapshot::new(base);

        let monitor = StabilizationMonitor::new(ch).with_policy(fast_policy(150, 3));
        let outcome = monitor.monitor("prompt line", &baseline).await;

        match outcome {
            StabilizeOutcome::TimedOut(Some(best)) => {
                assert!(best.contains("still generating part 0"));
            }
            other => panic!("expected timeout with candidate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_with_no_extraction_returns_none() {
        let ch = channel(&["short"]);
        let baseline = TranscriptSnapshot::new("short");

        let monitor = StabilizationMonitor::new(ch).with_policy(fast_policy(100, 3));
        let outcome = monitor.monitor("unrelated prompt", &baseline).await;
        assert_eq!(outcome, StabilizeOutcome::TimedOut(None));
    }

    #[tokio::test]
    async fn shrunken_transcript_resets_baseline_without_panic() {
        let baseline_text = "a transcript that was quite long before the source cleared it";
        let fresh = "fresh\nCopilot: rebuilt reply after the source reset itself";
        let ch = channel(&[fresh]);
        let baseline = TranscriptSnapshot::new(baseline_text);

        let monitor = StabilizationMonitor::new(ch).with_policy(fast_policy(200, 2));
        let outcome = monitor.monitor("no such prompt", &baseline).await;

        // The shrunken snapshot becomes the new baseline and no content is
        // emitted for that cycle; nothing grows afterwards, so the run times
        // out empty instead of diffing a negative length.
        assert_eq!(outcome, StabilizeOutcome::TimedOut(None));
    }

    #[tokio::test]
    async fn capture_failures_are_nonfatal() {
        struct FlakySource {
            calls: Mutex<u32>,
        }

        #[async_trait]
        impl TranscriptSource for FlakySource {
            async fn capture(&self) -> anyhow::Result<TranscriptSnapshot> {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                if *calls < 3 {
                    anyhow::bail!("export channel busy");
                }
                Ok(TranscriptSnapshot::new(
                    "base\nCopilot: recovered after two failed captures",
                ))
            }
        }

        let ch = Arc::new(CaptureChannel::new(Box::new(FlakySource {
            calls: Mutex::new(0),
        })));
        let baseline = TranscriptSnapshot::new("base\n");

        let monitor = StabilizationMonitor::new(ch).with_policy(fast_policy(2_000, 2));
        let outcome = monitor.monitor("irrelevant", &baseline).await;
        assert_eq!(
            outcome,
            StabilizeOutcome::Stable("Copilot: recovered after two failed captures".into())
        );
    }

    #[tokio::test]
    async fn works_against_file_source() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("t.txt");
        std::fs::write(&path, "You: summarize\n").unwrap();

        let ch = Arc::new(CaptureChannel::new(Box::new(FileTranscriptSource::new(
            &path,
        ))));
        let baseline = ch.capture().await.unwrap();

        // Simulate the UI finishing its reply while we wait.
        let p = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            std::fs::write(p, "You: summarize\nCopilot: three modules, one loop").unwrap();
        });

        let monitor = StabilizationMonitor::new(ch).with_policy(fast_policy(3_000, 2));
        let outcome = monitor.monitor("summarize", &baseline).await;
        assert_eq!(
            outcome,
            StabilizeOutcome::Stable("Copilot: three modules, one loop".into())
        );
    }
}
