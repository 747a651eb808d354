//! CLI entry point for ringkv.

use clap::Parser;
use ringkv::CliConfig;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    config.run()
}
