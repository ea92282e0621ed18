//! `timbre analyze`: print the analysis report of a WAV file.

use std::path::PathBuf;

use clap::Args;
use timbre_config::EngineConfig;

use super::common;
use crate::wav::read_wav;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// FFT size for the analyses (power of two)
    #[arg(long)]
    fft_size: Option<usize>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Single-line JSON
    #[arg(long)]
    compact: bool,
}

pub fn run(args: AnalyzeArgs, mut config: EngineConfig) -> anyhow::Result<()> {
    if let Some(fft_size) = args.fft_size {
        config.analysis.fft_size = fft_size;
    }
    let engine = common::engine(config)?;
    let buffer = read_wav(&args.input)?;
    tracing::info!(
        input = %args.input.display(),
        channels = buffer.num_channels(),
        duration_secs = buffer.duration_secs(),
        "analyzing"
    );

    let report = engine.analyze(&buffer)?;
    let json = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };

    match &args.output {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => println!("{json}"),
    }
    Ok(())
}
