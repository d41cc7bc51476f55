use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::detection::domain::target_class::{InvalidTargetClass, TargetClass};
use crate::detection::infrastructure::interruptible_oracle::InterruptibleOracle;
use crate::detection::infrastructure::shared_oracle::SharedOracle;
use crate::pipeline::search_report::SearchReport;
use crate::search::boundary_search_engine::BoundarySearchEngine;
use crate::search::domain::occurrence::{OccurrenceInterval, ProbeStats};
use crate::search::domain::prober::SearchError;
use crate::search::domain::search_logger::LogSearchLogger;
use crate::search::domain::search_strategy::StrategyKind;
use crate::search::infrastructure::strategy_factory::create_strategy;
use crate::video::domain::frame_source::FrameSourceOpener;
use crate::BoxError;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTargetClass),
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed to store uploaded video: {0}")]
    Upload(#[from] std::io::Error),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("search for '{0}' panicked")]
    Worker(String),
}

/// One finished search: the report handed to callers plus what it cost.
#[derive(Clone, Debug)]
pub struct LocateResult {
    pub target: TargetClass,
    pub interval: Option<OccurrenceInterval>,
    pub report: SearchReport,
    pub stats: ProbeStats,
    pub fps: Option<f64>,
}

impl LocateResult {
    /// Presentation times of the first and last frame, when the source has
    /// a frame rate.
    pub fn timestamps_secs(&self) -> Option<(f64, f64)> {
        let interval = self.interval?;
        let fps = self.fps.filter(|fps| *fps > 0.0)?;
        Some((interval.first() as f64 / fps, interval.last() as f64 / fps))
    }
}

/// Searches videos for a target class: opens the source, runs the boundary
/// search against the shared oracle, and reports the interval.
///
/// Every search opens its own frame source. The oracle is shared, and each
/// search wraps it so that a raised cancel flag or an expired timeout stops
/// the search before its next oracle call.
pub struct LocateTargetUseCase {
    opener: Box<dyn FrameSourceOpener>,
    oracle: SharedOracle,
    engine: BoundarySearchEngine,
    cancelled: Arc<AtomicBool>,
    timeout: Option<Duration>,
}

impl LocateTargetUseCase {
    pub fn new(opener: Box<dyn FrameSourceOpener>, oracle: SharedOracle, strategy: StrategyKind) -> Self {
        Self {
            opener,
            oracle,
            engine: BoundarySearchEngine::new(create_strategy(strategy)),
            cancelled: Arc::new(AtomicBool::new(false)),
            timeout: None,
        }
    }

    /// Per-search time limit, counted from the start of each search.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Flag that aborts running and future searches when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn execute(&self, path: &Path, target: &str) -> Result<LocateResult, LocateError> {
        let target = TargetClass::new(target)?;
        self.locate(path, target)
    }

    /// Searches an uploaded video held in memory.
    ///
    /// The payload goes to a temporary file that keeps the upload's
    /// extension and is removed when this returns, whether or not the
    /// search succeeded.
    pub fn execute_upload(
        &self,
        bytes: &[u8],
        filename: &str,
        target: &str,
    ) -> Result<LocateResult, LocateError> {
        let target = TargetClass::new(target)?;

        let suffix = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let mut upload = tempfile::Builder::new()
            .prefix("framescout-upload-")
            .suffix(&suffix)
            .tempfile()?;
        upload.write_all(bytes)?;
        upload.flush()?;
        log::debug!(
            "Stored upload '{filename}' ({} bytes) at {}",
            bytes.len(),
            upload.path().display()
        );

        self.locate(upload.path(), target)
    }

    /// Searches one video for several target classes at once.
    ///
    /// Each class gets its own worker thread and frame source; results come
    /// back in the order of `targets`.
    pub fn execute_many<S: AsRef<str> + Sync>(
        &self,
        path: &Path,
        targets: &[S],
    ) -> Vec<Result<LocateResult, LocateError>> {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        thread::scope(|scope| {
            let handles: Vec<_> = targets
                .iter()
                .enumerate()
                .map(|(slot, target)| {
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        let result = self.execute(path, target.as_ref());
                        let _ = result_tx.send((slot, result));
                    })
                })
                .collect();

            for (slot, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    log::error!("Search worker for '{}' panicked", targets[slot].as_ref());
                }
            }
        });
        drop(result_tx);

        let mut results: Vec<Option<Result<LocateResult, LocateError>>> =
            targets.iter().map(|_| None).collect();
        for (slot, result) in result_rx.try_iter() {
            results[slot] = Some(result);
        }

        results
            .into_iter()
            .zip(targets)
            .map(|(result, target)| {
                result.unwrap_or_else(|| Err(LocateError::Worker(target.as_ref().to_string())))
            })
            .collect()
    }

    fn locate(&self, path: &Path, target: TargetClass) -> Result<LocateResult, LocateError> {
        let mut source = self.opener.open(path).map_err(|source| LocateError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Searching {} for '{target}' ({} frames, {} search)",
            path.display(),
            source.frame_count(),
            self.engine.strategy_name()
        );

        let mut oracle =
            InterruptibleOracle::new(self.oracle.clone(), self.cancelled.clone(), self.timeout);
        let mut logger = LogSearchLogger::new(target.as_str());
        let outcome =
            self.engine
                .locate_with_logger(source.as_mut(), &mut oracle, &target, &mut logger)?;

        if outcome.stats.has_read_failures() {
            log::warn!(
                "'{target}': {} probed frame(s) could not be read and were treated as absent",
                outcome.stats.read_failures.len()
            );
        }

        Ok(LocateResult {
            report: SearchReport::new(&target, outcome.interval),
            interval: outcome.interval,
            stats: outcome.stats,
            fps: source.fps(),
            target,
        })
    }
}
