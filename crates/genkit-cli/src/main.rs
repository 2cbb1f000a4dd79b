//! genkit - transport and schema scaffolding for go-kit services

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::builder().parse_lossy(std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_owned()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Add { target } => {
            let cwd = std::env::current_dir().context("failed to determine the working directory")?;
            commands::add(cli, target, &cwd)
        }
        Commands::Inspect { file } => commands::inspect(file),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(version = genkit_core::VERSION, "genkit starting");

    if let Err(err) = run(&cli) {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}
