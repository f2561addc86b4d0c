//! roadcurve CLI: road curvature estimation over a directory of frames.

use clap::{Args, Parser, Subcommand};
use roadcurve::frames::{ImageDumpSink, ImageSequenceSource};
use roadcurve::search::{CurvatureConfig, RunReport};
use roadcurve::stream::{run_stream, DiagnosticsSink, FrameCadence};
use std::path::{Path, PathBuf};

#[cfg(not(feature = "tracing"))]
use log::LevelFilter;
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "roadcurve")]
#[command(about = "Estimate road curvature from a forward-facing camera")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON (with the `tracing` feature).
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every sampled frame of a directory of stills.
    Run(RunArgs),

    /// Print the indexed candidate set of a configuration.
    Candidates {
        /// Camera configuration (JSON).
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Camera configuration (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Directory of frame images. Defaults to `framesPath` from the config.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Process every N-th frame.
    #[arg(long, default_value_t = 4)]
    every: usize,

    /// Index of the first processed frame.
    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// Where to write the run report (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory for per-frame diagnostic images.
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

#[cfg(not(feature = "tracing"))]
fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_verbose: u8, json: bool) -> CliResult<()> {
    let _ = LogTracer::init();
    roadcurve::core::init_tracing(json);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8, _json: bool) -> CliResult<()> {
    roadcurve::core::init_with_level(level_for(verbose))?;
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs)?;

    match cli.command {
        Commands::Run(args) => run(&args),
        Commands::Candidates { config } => print_candidates(&config),
    }
}

// ── run ────────────────────────────────────────────────────────────────

fn run(args: &RunArgs) -> CliResult<()> {
    let config = CurvatureConfig::load_json(&args.config)?;
    let search = config.build_search()?;

    let frames_dir = args
        .frames
        .clone()
        .or_else(|| config.frames_dir())
        .ok_or("no frame directory: pass --frames or set framesPath in the config")?;
    let mut source = ImageSequenceSource::open(&frames_dir)?;
    log::info!(
        "{} frames in {}, every {} from {}",
        source.len(),
        frames_dir.display(),
        args.every,
        args.offset
    );

    let mut dump = args.dump_dir.as_ref().map(ImageDumpSink::new).transpose()?;
    let sink = dump.as_mut().map(|d| d as &mut dyn DiagnosticsSink);

    let cadence = FrameCadence::new(args.every, args.offset);
    let outcome = run_stream(&mut source, cadence, &search, sink)?;

    for frame in &outcome.frames {
        let index = frame
            .index
            .map_or_else(|| "-".to_string(), |i| i.to_string());
        println!(
            "frame {:>6}  {:>12}  index {:>3}  score {:>3}  {:.1} ms",
            frame.frame_index,
            frame.candidate.to_string(),
            index,
            frame.score,
            frame.elapsed_ms
        );
    }
    for skipped in &outcome.skipped {
        println!("frame {:>6}  skipped: {}", skipped.frame_index, skipped.reason);
    }

    let report = RunReport {
        config,
        frames: outcome.frames,
        skipped: outcome.skipped,
    };
    if let Some(mean) = report.mean_elapsed_ms() {
        log::info!("mean frame time {mean:.1} ms");
    }
    if let Some(out) = &args.out {
        report.write_json(out)?;
        log::info!("report written to {}", out.display());
    }
    Ok(())
}

// ── candidates ─────────────────────────────────────────────────────────

fn print_candidates(config: &Path) -> CliResult<()> {
    let config = CurvatureConfig::load_json(config)?;
    let search = config.build_search()?;

    println!("index\tradius");
    for (index, candidate) in search.candidates().enumerate() {
        match index {
            None => println!("-\t{candidate}"),
            Some(i) => println!("{i}\t{candidate}"),
        }
    }
    Ok(())
}
