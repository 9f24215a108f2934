use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use bifrost_sync::{BifrostConfig, FileTranscriptSource, SessionManager};
use tokio_util::sync::CancellationToken;

/// Execute `bifrost sync <file>`: continuous background synchronization
/// until Ctrl+C.
pub fn run(file: &Path, interval: Option<u64>, config_path: &Path) -> Result<()> {
    let config = BifrostConfig::load(config_path);
    let mut scheduler_config = config.scheduler_config();
    if let Some(secs) = interval {
        scheduler_config.interval = Duration::from_secs(secs);
    }

    let publisher = config.build_publisher();
    println!("Publishing to {}", publisher.display_name());

    let manager = SessionManager::new(
        Box::new(FileTranscriptSource::new(file)),
        publisher,
    )
    .with_scheduler_config(scheduler_config);

    let cancel = CancellationToken::new();
    ctrlc_cancel(cancel.clone());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let session = manager.start_session("").await?;
        println!(
            "Session {} syncing {} (Ctrl+C to stop)",
            session.session_id,
            file.display()
        );
        cancel.cancelled().await;
        manager.stop_session().await;
        Ok::<(), anyhow::Error>(())
    })?;

    println!("Stopped.");
    Ok(())
}

fn ctrlc_cancel(cancel: CancellationToken) {
    let _ = ctrlc::set_handler(move || {
        cancel.cancel();
    });
}
