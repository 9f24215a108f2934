use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use bifrost_core::SessionStatus;
use bifrost_sync::{BifrostConfig, FileTranscriptSource, SessionManager};

/// Execute `bifrost wait <prompt> <file>`: one-shot capture-and-wait.
pub fn run(
    prompt: &str,
    file: &Path,
    timeout_secs: Option<u64>,
    poll_ms: Option<u64>,
    stable_threshold: Option<u32>,
    config_path: &Path,
) -> Result<()> {
    let config = BifrostConfig::load(config_path);
    let mut policy = config.stabilize_policy();
    if let Some(secs) = timeout_secs {
        policy.max_duration = Duration::from_secs(secs);
    }
    if let Some(ms) = poll_ms {
        policy.poll_interval = Duration::from_millis(ms);
    }
    if let Some(n) = stable_threshold {
        policy.stable_threshold = n;
    }

    let manager = SessionManager::new(
        Box::new(FileTranscriptSource::new(file)),
        config.build_publisher(),
    )
    .with_stabilize_policy(policy);

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(manager.capture_and_wait(prompt));

    match (outcome.session.status, outcome.reply) {
        (SessionStatus::Stabilized, Some(reply)) => {
            println!("{reply}");
        }
        (SessionStatus::TimedOut, Some(reply)) => {
            eprintln!("[bifrost] reply still growing at deadline; printing best candidate");
            println!("{reply}");
        }
        (SessionStatus::TimedOut, None) => {
            eprintln!("[bifrost] no reply observed before the deadline");
            std::process::exit(1);
        }
        (status, _) => {
            eprintln!("[bifrost] wait ended with status {status:?}");
            std::process::exit(1);
        }
    }
    Ok(())
}
