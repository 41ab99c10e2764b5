//! Batch sequencing on a background worker thread.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use thiserror::Error;

use crate::analysis::sample_bitrate;
use crate::batch::events::AnalysisEvent;
use crate::config::Settings;
use crate::probe::{read_metadata, ProbeError};
use crate::render::{ChartRenderer, PngChartRenderer, RenderError};

/// Errors from starting a batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("A batch is already running")]
    AlreadyRunning,
    #[error("No files selected for analysis")]
    EmptyBatch,
}

/// Failure of a single file within a batch.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Worker lifecycle state. Explicit rather than a bool so later
/// extensions (cancellation, pausing) have somewhere to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
}

/// The per-file stages, behind a seam so batch sequencing can be
/// exercised without ffprobe on the machine.
pub trait FileProcessor: Send + Sync {
    /// Run all stages for one file, emitting status and progress events
    /// through `emit`. Returns the path of the rendered artifact.
    fn process(
        &self,
        path: &Path,
        emit: &mut dyn FnMut(AnalysisEvent),
    ) -> Result<PathBuf, AnalysisError>;
}

/// Production processor: metadata probe, packet sampling, chart render.
pub struct Analyzer {
    settings: Settings,
    renderer: Arc<dyn ChartRenderer>,
}

impl Analyzer {
    pub fn new(settings: Settings) -> Self {
        let renderer = Arc::new(PngChartRenderer::from_settings(&settings.chart));
        Self { settings, renderer }
    }

    /// Swap in a different renderer, keeping the probe stages.
    pub fn with_renderer(settings: Settings, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { settings, renderer }
    }
}

impl FileProcessor for Analyzer {
    fn process(
        &self,
        path: &Path,
        emit: &mut dyn FnMut(AnalysisEvent),
    ) -> Result<PathBuf, AnalysisError> {
        emit(AnalysisEvent::Status {
            message: "Reading media metadata...".to_string(),
        });
        let descriptor = read_metadata(path)?;
        let details = descriptor.details_summary();

        emit(AnalysisEvent::Status {
            message: "Sampling packet data...".to_string(),
        });
        let series = sample_bitrate(
            path,
            descriptor.target_kind(),
            descriptor.duration_secs,
            self.settings.analysis.interval_secs,
            |value| emit(AnalysisEvent::Progress { value }),
        )?;

        emit(AnalysisEvent::Status {
            message: "Rendering chart...".to_string(),
        });
        let artifact = self.renderer.render(&series, &details, path)?;
        Ok(artifact)
    }
}

/// Sequences analysis of multiple files on one worker thread and relays
/// events to the consumer over an unbounded channel.
pub struct BatchCoordinator<P: FileProcessor + 'static> {
    processor: Arc<P>,
    state: Arc<Mutex<BatchState>>,
}

impl BatchCoordinator<Analyzer> {
    pub fn new(settings: Settings) -> Self {
        Self::with_processor(Analyzer::new(settings))
    }
}

impl<P: FileProcessor + 'static> BatchCoordinator<P> {
    pub fn with_processor(processor: P) -> Self {
        Self {
            processor: Arc::new(processor),
            state: Arc::new(Mutex::new(BatchState::Idle)),
        }
    }

    pub fn state(&self) -> BatchState {
        *self.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state() == BatchState::Running
    }

    /// Start processing `files` in order on a worker thread.
    ///
    /// Single-flight: while a batch is running, another `start` is
    /// rejected with `AlreadyRunning`. The returned receiver yields
    /// every event of the batch and ends after `BatchComplete`.
    pub fn start(&self, files: Vec<PathBuf>) -> Result<Receiver<AnalysisEvent>, BatchError> {
        if files.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        {
            let mut state = self.state.lock();
            if *state == BatchState::Running {
                return Err(BatchError::AlreadyRunning);
            }
            *state = BatchState::Running;
        }

        let (tx, rx) = mpsc::channel();
        let processor = Arc::clone(&self.processor);
        let state = Arc::clone(&self.state);
        thread::spawn(move || {
            run_batch(&files, processor.as_ref(), &tx);
            *state.lock() = BatchState::Idle;
        });
        Ok(rx)
    }
}

/// The sequential batch loop. A failure is terminal for its file only;
/// send errors are ignored so a departed consumer cannot wedge the
/// worker.
fn run_batch<P: FileProcessor>(files: &[PathBuf], processor: &P, tx: &Sender<AnalysisEvent>) {
    let total = files.len();
    for (i, path) in files.iter().enumerate() {
        let filename = display_name(path);
        tracing::info!("Analyzing file {}/{}: {}", i + 1, total, filename);
        let _ = tx.send(AnalysisEvent::BatchProgress {
            index: i + 1,
            total,
            filename: filename.clone(),
        });

        let mut emit = |event| {
            let _ = tx.send(event);
        };
        match processor.process(path, &mut emit) {
            Ok(artifact) => {
                tracing::info!("Chart written: {}", artifact.display());
                let _ = tx.send(AnalysisEvent::FileComplete { path: artifact });
            }
            Err(e) => {
                let message = format!("Failed to process '{}': {}", filename, e);
                tracing::warn!("{}", message);
                let _ = tx.send(AnalysisEvent::Error { message });
            }
        }
    }
    let _ = tx.send(AnalysisEvent::BatchComplete { total });
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
