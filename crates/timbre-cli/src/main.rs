//! Timbre CLI - analyze and separate WAV files with the timbre engine.

mod commands;
mod wav;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timbre")]
#[command(author, version, about = "Timbre audio analysis and separation CLI", long_about = None)]
struct Cli {
    /// Engine config file (TOML); defaults to the user config when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full analysis report of a WAV file as JSON
    Analyze(commands::analyze::AnalyzeArgs),

    /// Split a WAV file into stems and enhance each one
    Separate(commands::separate::SeparateArgs),
}

fn main() -> anyhow::Result<()> {
    // logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::common::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args, config),
        Commands::Separate(args) => commands::separate::run(args, config),
    }
}
