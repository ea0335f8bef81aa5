//! rsfx CLI - preprocessing and inspection for JSFX scripts.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rsfx")]
#[command(author, version, about = "JSFX script tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess a script and its imports into an output directory
    Preprocess(commands::preprocess::PreprocessArgs),

    /// Show a script's header metadata and sliders
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess(args) => commands::preprocess::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
