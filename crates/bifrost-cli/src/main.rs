mod cmd_publish;
mod cmd_segment;
mod cmd_sync;
mod cmd_wait;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bifrost",
    version,
    about = "Bridge a UI-only chat transcript to a remote subscriber"
)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, default_value = "bifrost.json")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Continuously sync a transcript export file to the configured publishers
    Sync {
        /// Transcript export file to watch
        file: PathBuf,
        /// Seconds between sync ticks (overrides config)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Capture a baseline now, then wait for the reply to a prompt to stabilize
    Wait {
        /// The prompt whose reply to wait for
        prompt: String,
        /// Transcript export file to poll
        file: PathBuf,
        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Milliseconds between polls
        #[arg(long)]
        poll_ms: Option<u64>,
        /// Consecutive unchanged polls required
        #[arg(long)]
        stable_threshold: Option<u32>,
    },
    /// Segment a transcript file into role-tagged messages
    Segment {
        /// Transcript file to segment
        file: PathBuf,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
        /// Filter requester echo of this prompt
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Publisher utilities
    Publish {
        #[command(subcommand)]
        cmd: cmd_publish::PublishCmd,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Sync { file, interval } => cmd_sync::run(&file, interval, &cli.config),
        Command::Wait {
            prompt,
            file,
            timeout_secs,
            poll_ms,
            stable_threshold,
        } => cmd_wait::run(
            &prompt,
            &file,
            timeout_secs,
            poll_ms,
            stable_threshold,
            &cli.config,
        ),
        Command::Segment { file, json, prompt } => {
            cmd_segment::run(&file, json, prompt.as_deref())
        }
        Command::Publish { cmd } => cmd_publish::run(cmd, &cli.config),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("BIFROST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
