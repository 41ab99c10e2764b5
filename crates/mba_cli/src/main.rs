//! Terminal front-end for the Media Bitrate Analyzer.
//!
//! Starts one batch over the files given on the command line and polls
//! the event channel on a fixed interval, mirroring each event into a
//! progress bar until the batch completes.

use std::path::PathBuf;
use std::sync::mpsc::TryRecvError;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use mba_core::batch::{AnalysisEvent, BatchCoordinator};
use mba_core::config::Settings;
use mba_core::probe;

/// How often the consumer polls the event channel.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(
    name = "mba",
    version,
    about = "Builds time-bucketed bitrate charts for media files via ffprobe"
)]
struct Args {
    /// Media files to analyze, processed in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Bucket width in seconds (overrides the config file).
    #[arg(long)]
    interval: Option<f64>,

    /// Directory charts are written into (overrides the config file).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Path to the settings file.
    #[arg(long, default_value = "mba.toml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = Settings::load_or_default(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;
    if let Some(interval) = args.interval {
        settings.analysis.interval_secs = interval;
    }
    if let Some(dir) = &args.output_dir {
        settings.chart.output_folder = dir.display().to_string();
    }
    settings.validate()?;

    // A missing ffprobe is the only fatal startup condition.
    probe::ensure_available()
        .context("ffprobe is required; install FFmpeg and make sure it is on PATH")?;

    let coordinator = BatchCoordinator::new(settings);
    let events = coordinator.start(args.files)?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut failures = 0usize;
    loop {
        match events.try_recv() {
            Ok(AnalysisEvent::BatchProgress {
                index,
                total,
                filename,
            }) => {
                bar.set_position(0);
                bar.set_prefix(format!("[{}/{}] {}", index, total, filename));
            }
            Ok(AnalysisEvent::Status { message }) => {
                bar.set_message(message);
            }
            Ok(AnalysisEvent::Progress { value }) => {
                bar.set_position(u64::from(value));
            }
            Ok(AnalysisEvent::FileComplete { path }) => {
                bar.println(format!("chart written: {}", path.display()));
            }
            Ok(AnalysisEvent::Error { message }) => {
                failures += 1;
                bar.println(format!("error: {}", message));
            }
            Ok(AnalysisEvent::BatchComplete { total }) => {
                bar.finish_and_clear();
                println!(
                    "Finished {} file(s), {} succeeded, {} failed",
                    total,
                    total - failures,
                    failures
                );
                break;
            }
            Err(TryRecvError::Empty) => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(TryRecvError::Disconnected) => {
                bar.finish_and_clear();
                bail!("analysis worker exited unexpectedly");
            }
        }
    }

    if failures > 0 {
        bail!("{} file(s) failed", failures);
    }
    Ok(())
}
