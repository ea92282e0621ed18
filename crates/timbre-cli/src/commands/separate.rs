//! `timbre separate`: split a WAV file into enhanced stem files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use timbre_config::{EngineConfig, SeparationMode};
use timbre_core::{ProgressEvent, Stage, StemKind};
use timbre_engine::SeparateRequest;
use timbre_separation::{StemInfo, VoiceHints};

use super::common;
use crate::wav::{read_wav, write_wav};

#[derive(Args)]
pub struct SeparateArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Separation mode: coarse (voice/music/ambient/noise) or fine (vocals/drums/bass/other)
    #[arg(short, long)]
    mode: Option<SeparationMode>,

    /// Output directory, created if missing
    #[arg(short, long, default_value = "stems")]
    out: PathBuf,

    /// Separation sensitivity, 0 to 0.99
    #[arg(long)]
    sensitivity: Option<f32>,

    /// Voice detector segments (JSON `{"segments": [...]}`)
    #[arg(long)]
    hints: Option<PathBuf>,

    /// Write separated stems without enhancement
    #[arg(long)]
    raw: bool,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32", value_parser = ["16", "24", "32"])]
    bit_depth: String,
}

pub fn run(args: SeparateArgs, mut config: EngineConfig) -> anyhow::Result<()> {
    if let Some(sensitivity) = args.sensitivity {
        config.separation = config.separation.with_sensitivity(sensitivity);
    }
    let bits: u16 = args.bit_depth.parse()?;
    let engine = common::engine(config)?;
    let buffer = read_wav(&args.input)?;

    let mut request = SeparateRequest {
        mode: args.mode,
        ..SeparateRequest::default()
    };
    if let Some(path) = &args.hints {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let hints: VoiceHints = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        request = request.with_hints(hints);
    }
    if args.raw {
        request = request.without_enhancement();
    }

    let mode = request.mode.unwrap_or(engine.config().separation.mode);
    println!(
        "Separating {} ({} ch, {:.2}s) in {mode} mode...",
        args.input.display(),
        buffer.num_channels(),
        buffer.duration_secs()
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let stems = std::thread::scope(|scope| {
        let bar = scope.spawn(|| follow(&rx, mode.stems()));
        let result = engine.separate_with(&buffer, &request, Some(tx));
        let _ = bar.join();
        result
    });
    let stems = match stems {
        Err(e) if e.is_cancelled() => anyhow::bail!("cancelled"),
        other => other?,
    };

    std::fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out.display()))?;
    let name = args
        .input
        .file_stem()
        .map_or_else(|| "mix".to_string(), |s| s.to_string_lossy().into_owned());
    let mut infos: Vec<StemInfo> = Vec::with_capacity(stems.len());
    for stem in &stems {
        let path = stem_path(&args.out, &name, stem.kind());
        write_wav(&path, &stem.audio, bits)?;
        println!(
            "  {:<8} confidence {:.2}  -> {}",
            stem.kind().name(),
            stem.info.confidence,
            path.display()
        );
        infos.push(stem.info);
    }

    let manifest = args.out.join(format!("{name}_stems.json"));
    std::fs::write(&manifest, serde_json::to_string_pretty(&infos)? + "\n")?;
    println!("Done, metadata in {}", manifest.display());
    Ok(())
}

fn stem_path(dir: &Path, name: &str, kind: StemKind) -> PathBuf {
    dir.join(format!("{name}_{kind}.wav"))
}

/// Drive a progress bar from engine events until the sender goes away.
///
/// Separation fills a stem's first 90 steps; its chain stages fill the rest.
fn follow(rx: &Receiver<ProgressEvent>, kinds: [StemKind; 4]) {
    let pb = ProgressBar::new(kinds.len() as u64 * 100);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
    {
        pb.set_style(style.progress_chars("##-"));
    }

    let mut done: HashMap<StemKind, u64> = HashMap::new();
    for event in rx {
        let Some(kind) = event.stem else { continue };
        let steps = match event.stage {
            Stage::Separation => (event.fraction * 90.0) as u64,
            _ => 100,
        };
        let entry = done.entry(kind).or_default();
        *entry = (*entry).max(steps);
        pb.set_position(done.values().sum());
        pb.set_message(format!("{kind}: {}", event.stage.name()));
    }
    pb.finish_and_clear();
}
