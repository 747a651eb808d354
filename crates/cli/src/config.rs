//! Top-level options and process setup.

use crate::commands::Command;
use anyhow::Context;
use clap::Parser;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "ringkv", version, about = "Ring-structured key/value store node")]
pub struct CliConfig {
    /// Log at debug level.
    #[arg(short, long, global = true, env = "RINGKV_VERBOSE")]
    pub verbose: bool,

    /// Print results as JSON.
    #[arg(long, global = true, env = "RINGKV_JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Install logging, run the command on a fresh runtime and print its
    /// result.
    pub fn run(self) -> anyhow::Result<()> {
        init_tracing(self.verbose);

        let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
        let result = runtime.block_on(self.command.execute())?;
        println!("{}", result.render(self.json)?);
        Ok(())
    }
}

/// Logs go to stderr so stdout stays clean for command output.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
