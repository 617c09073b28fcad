//! CLI application for pupil tracking and fixation/saccade detection.
//!
//! Usage:
//!   gaze-events track <frames-dir> --landmarks landmarks.json   # Track, then classify
//!   gaze-events analyze eye_coordinates.csv                      # Classify a recorded table
//!   gaze-events analyze samples.csv --strategy density --json    # JSON summary

use clap::{Parser, Subcommand};
use gaze_events::{
    table, AnalysisConfig, CancelToken, DensityDetector, DensityEvents, DifferentialDetector,
    DifferentialEvents, EventDetector, GazeSequence, ImageDirSource, LandmarkFile, StopReason,
    Strategy, Summary, Tracker,
};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SAMPLES_FILE: &str = "eye_coordinates_with_avg.csv";
const CLUSTERED_SAMPLES_FILE: &str = "eye_coordinates_with_avg_fixations.csv";
const DENSITY_SACCADES_FILE: &str = "saccades_data_avg_eye.csv";
const FIXATIONS_FILE: &str = "fixations_data.csv";
const SACCADES_FILE: &str = "saccades_data.csv";
const MERGED_FILE: &str = "merged.csv";

#[derive(Parser, Debug)]
#[command(name = "gaze-events")]
#[command(author, version, about = "Pupil tracking and fixation/saccade detection", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory for the CSV tables
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Output the summary as JSON
    #[arg(short, long, global = true)]
    json: bool,

    /// Summary output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// JSON file with analysis parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-axis displacement (px) at or below which a transition is a fixation
    #[arg(long, global = true)]
    fixation_threshold: Option<f64>,

    /// Per-axis displacement (px) above which a transition is a saccade
    #[arg(long, global = true)]
    saccade_threshold: Option<f64>,

    /// Clustering neighborhood radius (px)
    #[arg(long, global = true)]
    eps: Option<f64>,

    /// Neighborhood size of a cluster core point
    #[arg(long, global = true)]
    min_samples: Option<usize>,

    /// Averaged-position jump (px) reported as a saccade by the density strategy
    #[arg(long, global = true)]
    saccade_distance: Option<f64>,

    /// Pupil binarization cutoff (0-255)
    #[arg(long, global = true)]
    intensity_cutoff: Option<u8>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Track pupils over a directory of frames, then classify the samples
    Track {
        /// Directory of frame images, read in file-name order
        frames: PathBuf,

        /// JSON file with precomputed facial landmarks per frame
        #[arg(long)]
        landmarks: PathBuf,
    },
    /// Classify a recorded sample table
    Analyze {
        /// CSV with `T, LX, LY, RX, RY` or `Frame, Left Eye H, ...` columns
        input: PathBuf,

        /// Strategy to apply: differential, density or both
        #[arg(long, default_value = "both")]
        strategy: Strategy,
    },
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output {
    input: String,
    strategy: &'static str,
    /// Why frame acquisition ended (tracking only)
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<StopReason>,
    summary: Summary,
    files: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    std::fs::create_dir_all(&args.output_dir)?;

    let output = match &args.command {
        Command::Track { frames, landmarks } => track(args, &config, frames, landmarks)?,
        Command::Analyze { input, strategy } => {
            let sequence = table::read_samples_file(input)?;
            let mut files = Vec::new();
            let summary = classify(&sequence, &config, *strategy, &args.output_dir, &mut files)?;
            Output {
                input: input.display().to_string(),
                strategy: strategy.as_str(),
                stop: None,
                summary,
                files,
            }
        }
    };

    let output_str = if args.json {
        serde_json::to_string_pretty(&output)?
    } else {
        format_human_readable(&output)
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        info!("Summary written to {}", path.display());
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

/// Config file (or defaults), then individual flags on top.
fn resolve_config(args: &Args) -> gaze_events::Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(v) = args.fixation_threshold {
        config.fixation_threshold = v;
    }
    if let Some(v) = args.saccade_threshold {
        config.saccade_threshold = v;
    }
    if let Some(v) = args.eps {
        config.eps = v;
    }
    if let Some(v) = args.min_samples {
        config.min_samples = v;
    }
    if let Some(v) = args.saccade_distance {
        config.saccade_distance = v;
    }
    if let Some(v) = args.intensity_cutoff {
        config.intensity_cutoff = v;
    }

    config.validate()?;
    Ok(config)
}

fn track(
    args: &Args,
    config: &AnalysisConfig,
    frames: &Path,
    landmarks: &Path,
) -> Result<Output, Box<dyn std::error::Error>> {
    let mut source = ImageDirSource::open(frames)?;
    let mut provider = LandmarkFile::load(landmarks)?;

    let cancel = CancelToken::new();
    let handler = cancel.clone();
    ctrlc::set_handler(move || handler.cancel())?;

    info!("Tracking... Press Ctrl+C to stop");
    let run = Tracker::new(config.localizer()).run(&mut source, &mut provider, &cancel)?;
    if let StopReason::SourceFailed(ref reason) = run.stop {
        warn!("Tracking ended early: {}", reason);
    }

    let mut files = Vec::new();
    let path = args.output_dir.join(SAMPLES_FILE);
    table::write_samples(File::create(&path)?, &run.sequence, None)?;
    files.push(path.display().to_string());

    let summary = classify(
        &run.sequence,
        config,
        Strategy::Both,
        &args.output_dir,
        &mut files,
    )?;

    Ok(Output {
        input: frames.display().to_string(),
        strategy: Strategy::Both.as_str(),
        stop: Some(run.stop),
        summary,
        files,
    })
}

/// Run the requested strategies and write their tables into `dir`.
fn classify(
    sequence: &GazeSequence,
    config: &AnalysisConfig,
    strategy: Strategy,
    dir: &Path,
    files: &mut Vec<String>,
) -> Result<Summary, Box<dyn std::error::Error>> {
    let differential: Option<DifferentialEvents> = strategy
        .runs_differential()
        .then(|| DifferentialDetector::new(config.differential()).detect(sequence));
    let density: Option<DensityEvents> = strategy
        .runs_density()
        .then(|| DensityDetector::new(config.density()).detect(sequence));

    if let Some(events) = &differential {
        let path = dir.join(FIXATIONS_FILE);
        table::write_fixations(File::create(&path)?, &events.fixations)?;
        files.push(path.display().to_string());

        let path = dir.join(SACCADES_FILE);
        table::write_saccades(File::create(&path)?, &events.saccades, true)?;
        files.push(path.display().to_string());

        let path = dir.join(MERGED_FILE);
        table::write_merged(File::create(&path)?, &events.fixations, &events.saccades, true)?;
        files.push(path.display().to_string());
    }

    if let Some(events) = &density {
        let path = dir.join(CLUSTERED_SAMPLES_FILE);
        table::write_samples(File::create(&path)?, sequence, Some(events))?;
        files.push(path.display().to_string());

        let path = dir.join(DENSITY_SACCADES_FILE);
        table::write_saccades(File::create(&path)?, &events.saccades, false)?;
        files.push(path.display().to_string());
    }

    info!("Wrote {} tables to {}", files.len(), dir.display());
    Ok(Summary::new(sequence, differential.as_ref(), density.as_ref()))
}

fn format_human_readable(output: &Output) -> String {
    let mut s = String::new();
    let summary = &output.summary;

    s.push_str(&format!("Input: {} (strategy: {})\n", output.input, output.strategy));
    if let Some(ref stop) = output.stop {
        let reason = match stop {
            StopReason::Exhausted => "all frames read".to_string(),
            StopReason::Cancelled => "interrupted".to_string(),
            StopReason::SourceFailed(e) => format!("frame source failed: {}", e),
        };
        s.push_str(&format!("Tracking stopped: {}\n", reason));
    }
    s.push_str(&format!(
        "Samples: {} ({} with both pupils)\n",
        summary.samples, summary.binocular_samples
    ));

    if summary.binocular_samples == 0 {
        s.push_str("\nNo binocular samples; nothing to classify.\n");
    }

    if let Some(d) = summary.differential {
        s.push_str("\nDifferential:\n");
        s.push_str(&format!("  Fixations: {}\n", d.fixations));
        s.push_str(&format!("  Saccades:  {}\n", d.saccades));
    }

    if let Some(d) = summary.density {
        s.push_str("\nDensity:\n");
        s.push_str(&format!("  Clusters:  {}\n", d.clusters));
        s.push_str(&format!("  Noise:     {}\n", d.noise));
        s.push_str(&format!("  Saccades:  {}\n", d.saccades));
    }

    if !output.files.is_empty() {
        s.push_str("\nTables:\n");
        for f in &output.files {
            s.push_str(&format!("  {}\n", f));
        }
    }

    s
}
