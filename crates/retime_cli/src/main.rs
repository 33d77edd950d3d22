use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};

use retime_core::config::ConfigManager;
use retime_core::engine::{EngineSession, FfmpegEngine};
use retime_core::logging::{self, LogLevel, RunLogger};
use retime_core::models::{DurationSourceKind, MediaHandle, Slot};
use retime_core::orchestrator::ProcessingError;
use retime_core::Workbench;

/// Speed up or slow down a video so it lasts exactly as long as an audio
/// track, then remux both into one MP4 (H.264 + AAC).
#[derive(Parser, Debug)]
#[command(name = "retime", version, about)]
struct Cli {
    /// Video file whose picture is retimed
    #[arg(long)]
    video: PathBuf,

    /// Audio file whose length is the target
    #[arg(long)]
    audio: PathBuf,

    /// Output file (default: <output_folder>/<output_file_name> from config)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Config file (default: <config dir>/retime/retime.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How input durations are discovered
    #[arg(long, value_enum)]
    duration_source: Option<SourceArg>,

    /// Distance from 1.0 under which no speed change is reported
    #[arg(long)]
    tolerance: Option<f64>,

    /// Write the run report as JSON to this file
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Also write the run log into the configured logs folder
    #[arg(long, action = ArgAction::SetTrue)]
    save_log: bool,

    /// More output (-v shows engine output, -vv traces)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    /// Scrape `Duration:` lines from ffmpeg's log
    LogScrape,
    /// Ask ffprobe for the container duration
    Structured,
}

impl From<SourceArg> for DurationSourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::LogScrape => DurationSourceKind::LogScrape,
            SourceArg::Structured => DurationSourceKind::Structured,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_level = match cli.verbose {
        0 => LogLevel::Warn,
        n => LogLevel::from_verbosity(n),
    };
    logging::init_tracing(tracing_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ProcessingError>() {
                Some(processing) => eprintln!("error [{}]: {}", processing.kind(), processing),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = ConfigManager::new(&config_path);
    config
        .load_or_create()
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let mut settings = config.settings().clone();
    if let Some(source) = cli.duration_source {
        settings.sync.duration_source = source.into();
    }
    if let Some(tolerance) = cli.tolerance {
        if !tolerance.is_finite() || tolerance < 0.0 {
            bail!("Tolerance must be a non-negative number, got {}", tolerance);
        }
        settings.sync.unchanged_tolerance = tolerance;
    }

    let video = read_input(&cli.video, "video")?;
    let audio = read_input(&cli.audio, "audio")?;

    let level = LogLevel::from_verbosity(cli.verbose);
    let mut log_config = settings.logging.to_log_config(level);
    if cli.verbose > 0 {
        log_config.compact = false;
    }
    let mut builder = RunLogger::builder(run_name(&cli.video))
        .config(log_config)
        .callback(Box::new(|msg| println!("{}", msg)));
    if cli.save_log {
        builder = builder.log_dir(config.logs_folder());
    }
    let logger = builder.build().context("Failed to create run log")?;

    let session = EngineSession::new(FfmpegEngine::from_settings(&settings.engine));
    let mut bench = Workbench::new(session, &settings);
    bench.select_input(Slot::Video, video);
    bench.select_input(Slot::Audio, audio);

    let artifact = bench.run(&logger)?;

    let output_path = cli.output.clone().unwrap_or_else(|| config.output_path());
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&output_path, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let report = &artifact.report;
    println!(
        "Speed factor {:.4} ({}): {:.2}s video -> {:.2}s audio",
        report.speed_factor,
        report.direction,
        report.video.duration_seconds,
        report.audio.duration_seconds
    );
    println!(
        "Wrote {} ({}, {} bytes)",
        output_path.display(),
        artifact.media_type,
        artifact.len()
    );

    if let Some(ref report_path) = cli.report_json {
        let json = report.to_json().context("Failed to serialize report")?;
        fs::write(report_path, json)
            .with_context(|| format!("Failed to write {}", report_path.display()))?;
        tracing::info!("Report written to {}", report_path.display());
    }

    if let Some(path) = logger.log_path() {
        tracing::info!("Run log: {}", path.display());
    }

    Ok(())
}

fn read_input(path: &Path, what: &str) -> Result<MediaHandle> {
    if !path.is_file() {
        bail!("{} file not found: {}", what, path.display());
    }
    MediaHandle::from_path(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))
}

fn run_name(video: &Path) -> String {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    format!("retime_{}", stem)
}

fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("retime").join("retime.toml"),
        None => PathBuf::from("retime.toml"),
    }
}
