//! Coarse-to-fine grid scan with early exit.
//!
//! The rough scan covers `z0 - S1*N1 ..= z0 + S1*N1` in steps of `S1`, the
//! fine scan covers `best - S2*N2 ..= best + S2*N2` in steps of `S2`. Each
//! scan stops early once a score falls more than `threshold * best` below
//! the best score of that scan. A final capture at the chosen z confirms it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    DEFAULT_COARSE_STEP, DEFAULT_COARSE_STEPS, DEFAULT_FINE_STEP, DEFAULT_FINE_STEPS,
    DEFAULT_GRID_THRESHOLD, GRID_SENTINEL_SCORE,
};
use crate::error::{FocusError, Result};
use crate::frame::FocusCandidate;

fn default_coarse_step() -> f64 {
    DEFAULT_COARSE_STEP
}

fn default_coarse_steps() -> usize {
    DEFAULT_COARSE_STEPS
}

fn default_fine_step() -> f64 {
    DEFAULT_FINE_STEP
}

fn default_fine_steps() -> usize {
    DEFAULT_FINE_STEPS
}

fn default_threshold() -> f64 {
    DEFAULT_GRID_THRESHOLD
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSearchParams {
    /// Rough scan step (um).
    #[serde(default = "default_coarse_step")]
    pub coarse_step: f64,
    /// Rough scan half-count: `2 * coarse_steps + 1` positions.
    #[serde(default = "default_coarse_steps")]
    pub coarse_steps: usize,
    /// Fine scan step (um).
    #[serde(default = "default_fine_step")]
    pub fine_step: f64,
    #[serde(default = "default_fine_steps")]
    pub fine_steps: usize,
    /// Relative drop below the best score that ends a scan early.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for GridSearchParams {
    fn default() -> Self {
        Self {
            coarse_step: DEFAULT_COARSE_STEP,
            coarse_steps: DEFAULT_COARSE_STEPS,
            fine_step: DEFAULT_FINE_STEP,
            fine_steps: DEFAULT_FINE_STEPS,
            threshold: DEFAULT_GRID_THRESHOLD,
        }
    }
}

impl GridSearchParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.coarse_step.is_finite() && self.coarse_step > 0.0) {
            return Err(FocusError::InvalidConfig(format!(
                "coarse_step must be > 0, got {}",
                self.coarse_step
            )));
        }
        if !(self.fine_step.is_finite() && self.fine_step > 0.0) {
            return Err(FocusError::InvalidConfig(format!(
                "fine_step must be > 0, got {}",
                self.fine_step
            )));
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(FocusError::InvalidConfig(format!(
                "threshold must be >= 0, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridPhase {
    Init,
    RoughScan,
    FineScan,
    Done,
}

impl std::fmt::Display for GridPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::RoughScan => write!(f, "rough scan"),
            Self::FineScan => write!(f, "fine scan"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Mutable state of one grid search invocation.
#[derive(Clone, Debug)]
pub struct SearchState {
    pub phase: GridPhase,
    pub best_score: f64,
    pub best_z: f64,
    pub base_z: f64,
    pub step: f64,
    pub half_count: usize,
    pub index: usize,
    /// Whether any candidate in the current scan beat the sentinel.
    pub found: bool,
    /// Index of the current scan's best candidate.
    pub best_index: Option<usize>,
}

impl SearchState {
    fn new(start_z: f64) -> Self {
        Self {
            phase: GridPhase::Init,
            best_score: GRID_SENTINEL_SCORE,
            best_z: start_z,
            base_z: start_z,
            step: 0.0,
            half_count: 0,
            index: 0,
            found: false,
            best_index: None,
        }
    }

    /// Begin a scan centered on the current best z.
    fn begin_scan(&mut self, phase: GridPhase, step: f64, half_count: usize) {
        self.phase = phase;
        self.step = step;
        self.half_count = half_count;
        self.base_z = self.best_z - step * half_count as f64;
        self.index = 0;
        self.best_score = GRID_SENTINEL_SCORE;
        self.found = false;
        self.best_index = None;
    }

    fn last_index(&self) -> usize {
        2 * self.half_count
    }

    fn current_z(&self) -> f64 {
        self.base_z + self.index as f64 * self.step
    }

    fn best_on_boundary(&self) -> bool {
        matches!(self.best_index, Some(i) if i == 0 || i == self.last_index())
    }
}

/// Result of a completed grid search.
#[derive(Clone, Debug, PartialEq)]
pub struct GridOutcome {
    pub best: FocusCandidate,
    /// Score of the confirmation capture at `best.z`.
    pub confirmed_score: f64,
    pub evaluations: usize,
    pub rough_early_exit: bool,
    pub fine_early_exit: bool,
    /// False when either scan never beat the sentinel score.
    pub found: bool,
    /// The chosen z sits on the edge of the scan that produced it, so the
    /// true optimum may lie outside the scanned range.
    pub at_boundary: bool,
}

/// Run a rough and a fine scan around `start_z`.
///
/// `evaluate(z)` moves to `z`, captures and returns the score. Errors from
/// it abort the search unchanged.
pub fn grid_search<F>(start_z: f64, params: &GridSearchParams, mut evaluate: F) -> Result<GridOutcome>
where
    F: FnMut(f64) -> Result<f64>,
{
    params.validate()?;

    let mut state = SearchState::new(start_z);
    let mut evaluations = 0usize;

    state.begin_scan(GridPhase::RoughScan, params.coarse_step, params.coarse_steps);
    let rough_early_exit = run_scan(&mut state, params.threshold, &mut evaluate, &mut evaluations)?;
    let rough_found = state.found;
    let rough_at_boundary = state.best_on_boundary();

    state.begin_scan(GridPhase::FineScan, params.fine_step, params.fine_steps);
    let fine_early_exit = run_scan(&mut state, params.threshold, &mut evaluate, &mut evaluations)?;
    let fine_found = state.found;
    let at_boundary = if fine_found {
        state.best_on_boundary()
    } else {
        rough_at_boundary
    };

    state.phase = GridPhase::Done;
    let confirmed_score = evaluate(state.best_z)?;
    evaluations += 1;
    debug!(z = state.best_z, score = confirmed_score, "Grid search confirmation capture");

    Ok(GridOutcome {
        best: FocusCandidate::new(state.best_z, confirmed_score),
        confirmed_score,
        evaluations,
        rough_early_exit,
        fine_early_exit,
        found: rough_found && fine_found,
        at_boundary,
    })
}

/// Scan `state` from index 0 to `2 * half_count`. Returns true on early exit.
fn run_scan<F>(state: &mut SearchState, threshold: f64, evaluate: &mut F, evaluations: &mut usize) -> Result<bool>
where
    F: FnMut(f64) -> Result<f64>,
{
    loop {
        let z = state.current_z();
        let score = evaluate(z)?;
        *evaluations += 1;

        if score > state.best_score {
            state.best_score = score;
            state.best_z = z;
            state.best_index = Some(state.index);
            state.found = true;
        } else if state.found && state.best_score - score > threshold * state.best_score {
            debug!(phase = %state.phase, z, score, best = state.best_score, "Grid scan stopped early");
            return Ok(true);
        }

        if state.index >= state.last_index() {
            return Ok(false);
        }
        state.index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_positions() {
        let params = GridSearchParams {
            coarse_step: 2.0,
            coarse_steps: 1,
            fine_step: 0.5,
            fine_steps: 1,
            threshold: 1.0,
        };
        let mut visited = Vec::new();
        grid_search(0.0, &params, |z| {
            visited.push(z);
            Ok(1.0 + z)
        })
        .unwrap();
        assert_eq!(visited, vec![-2.0, 0.0, 2.0, 1.5, 2.0, 2.5, 2.5]);
    }

    #[test]
    fn test_rejects_zero_step() {
        let params = GridSearchParams {
            coarse_step: 0.0,
            ..Default::default()
        };
        assert!(grid_search(0.0, &params, |_| Ok(1.0)).is_err());
    }
}
