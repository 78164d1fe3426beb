pub mod brent;
pub mod grid;

pub use brent::{BrentOptimizer, BrentOutcome, BrentParams, OptimizerState};
pub use grid::{grid_search, GridOutcome, GridPhase, GridSearchParams, SearchState};
