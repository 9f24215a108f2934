use std::path::Path;

use anyhow::Result;
use bifrost_sync::{publish, BifrostConfig};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PublishCmd {
    /// Send a synthetic batch to all configured targets
    Test,
    /// Show configured publish targets
    Status,
}

pub fn run(cmd: PublishCmd, config_path: &Path) -> Result<()> {
    let config = BifrostConfig::load(config_path);
    match cmd {
        PublishCmd::Test => run_test(&config),
        PublishCmd::Status => run_status(&config),
    }
}

fn run_test(config: &BifrostConfig) -> Result<()> {
    let targets = config.build_targets();
    if targets.is_empty() {
        println!("No publish targets configured.");
        println!();
        println!("Add targets in bifrost.json under \"publishers\":");
        println!("  {{\"publishers\":[{{\"type\":\"webhook\",\"url\":\"https://example.com/hook\"}}]}}");
        return Ok(());
    }

    println!("Sending test batch to {} target(s)...", targets.len());
    let results = publish::test_targets(&targets);
    for (name, result) in results {
        match result {
            Ok(()) => println!("  OK  {name}"),
            Err(e) => println!("  ERR {name}: {e}"),
        }
    }
    Ok(())
}

fn run_status(config: &BifrostConfig) -> Result<()> {
    let targets = config.build_targets();
    if targets.is_empty() {
        println!("No publish targets configured.");
        return Ok(());
    }

    println!("{} target(s) configured:", targets.len());
    for target in &targets {
        println!("  - {}", target.display_name());
    }
    Ok(())
}
