//! Medirank CLI binary.

use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use medirank::cli::args::*;
use medirank::cli::commands::*;

fn main() {
    // Parse command line arguments using clap
    let args = MedirankArgs::parse();

    // RUST_LOG wins over the verbosity flags
    let level = match args.verbosity() {
        0 => "error", // Quiet mode
        1 => "warn",  // Default
        2 => "info",  // Verbose
        _ => "debug", // Very verbose (3+)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: MedirankArgs) -> anyhow::Result<()> {
    let command = match &args.command {
        Command::Train(_) => "train",
        Command::Recommend(_) => "recommend",
        Command::Nearby(_) => "nearby",
        Command::Normalize(_) => "normalize",
    };
    execute_command(args).with_context(|| format!("{command} failed"))
}
