use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::search::{BrentOutcome, GridOutcome};

/// Autofocus run stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusStage {
    Preparing,
    Searching,
    Restoring,
    MovingToBest,
}

impl std::fmt::Display for FocusStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preparing => write!(f, "Preparing camera and channel"),
            Self::Searching => write!(f, "Searching focus"),
            Self::Restoring => write!(f, "Restoring settings"),
            Self::MovingToBest => write!(f, "Moving to best focus"),
        }
    }
}

/// Progress reporting for an autofocus run.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the expected number of
    /// evaluations in this stage, if known.
    fn begin_stage(&self, _stage: FocusStage, _total_items: Option<usize>) {}

    /// One evaluation within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// An evaluation was recorded.
    fn evaluated(&self, _evaluation: &Evaluation) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when none is supplied.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Shared cancellation flag, checked before every evaluation.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One stage move + capture + score.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// 1-based position in the run.
    pub sequence: usize,
    pub z: f64,
    pub score: f64,
    /// Move plus settle.
    pub move_time: Duration,
    /// Camera ready wait plus capture.
    pub capture_time: Duration,
    pub score_time: Duration,
}

/// Strategy-specific diagnostics of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub enum StrategyReport {
    Grid(GridOutcome),
    Brent(BrentOutcome),
}

impl StrategyReport {
    /// Whether the strategy itself considers its answer reliable.
    pub fn confident(&self) -> bool {
        match self {
            Self::Grid(g) => g.found,
            Self::Brent(b) => b.converged,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FocusOutcome {
    pub best_z: f64,
    pub best_score: f64,
    pub start_z: f64,
    pub evaluations: Vec<Evaluation>,
    pub report: StrategyReport,
    /// False when the search found nothing better than its reference score
    /// (grid) or ran out of evaluations (Brent). The stage is still moved to
    /// `best_z`.
    pub confident: bool,
    pub elapsed: Duration,
}

impl FocusOutcome {
    /// Number of frames captured during the search.
    pub fn image_count(&self) -> usize {
        self.evaluations.len()
    }

    /// Mean and relative standard deviation of all scores in the run.
    pub fn score_spread(&self) -> (f64, f64) {
        let n = self.evaluations.len();
        if n == 0 {
            return (0.0, 0.0);
        }
        let mean = self.evaluations.iter().map(|e| e.score).sum::<f64>() / n as f64;
        let var = self
            .evaluations
            .iter()
            .map(|e| (e.score - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        let rel = if mean != 0.0 { var.sqrt() / mean.abs() } else { 0.0 };
        (mean, rel)
    }
}
