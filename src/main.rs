mod application;
mod cli;
mod data;
mod domain;
mod infra;
mod stats;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "sketch_stats=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    cli.run()
}
