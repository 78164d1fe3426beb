//! Brent's bounded univariate optimizer (golden section with parabolic
//! interpolation), maximizing a score over a z interval.
//!
//! Stopping rule and step logic follow R. P. Brent, "Algorithms for
//! Minimization without Derivatives" (1973), chapter 5. The function is
//! negated internally and minimized.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{
    BRENT_RELATIVE_TOLERANCE, DEFAULT_BRENT_MAX_EVALUATIONS, DEFAULT_SEARCH_RANGE,
    DEFAULT_TOLERANCE, GOLDEN_SECTION,
};
use crate::error::{FocusError, Result};
use crate::frame::FocusCandidate;

fn default_search_range() -> f64 {
    DEFAULT_SEARCH_RANGE
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_max_evaluations() -> usize {
    DEFAULT_BRENT_MAX_EVALUATIONS
}

/// Brent search settings as stored in the autofocus configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrentParams {
    /// Full width of the search interval (um), centered on the start z.
    #[serde(default = "default_search_range")]
    pub search_range: f64,
    /// Absolute z tolerance (um).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_evaluations")]
    pub max_evaluations: usize,
}

impl Default for BrentParams {
    fn default() -> Self {
        Self {
            search_range: DEFAULT_SEARCH_RANGE,
            tolerance: DEFAULT_TOLERANCE,
            max_evaluations: DEFAULT_BRENT_MAX_EVALUATIONS,
        }
    }
}

impl BrentParams {
    /// Search interval `[z0 - range/2, z0 + range/2]`.
    pub fn interval(&self, start_z: f64) -> (f64, f64) {
        let half = self.search_range / 2.0;
        (start_z - half, start_z + half)
    }

    pub fn optimizer(&self) -> BrentOptimizer {
        BrentOptimizer::new(self.tolerance, self.max_evaluations)
    }
}

/// Working state of one optimization run (minimization form).
#[derive(Clone, Debug)]
pub struct OptimizerState {
    /// Current bracket.
    pub a: f64,
    pub b: f64,
    /// Best point so far, second best, previous second best.
    pub x: f64,
    pub w: f64,
    pub v: f64,
    pub fx: f64,
    pub fw: f64,
    pub fv: f64,
    /// Last step and the step before it.
    pub d: f64,
    pub e: f64,
    pub iterations: usize,
}

/// Result of [`BrentOptimizer::maximize`].
#[derive(Clone, Debug, PartialEq)]
pub struct BrentOutcome {
    /// Best evaluated point (highest score).
    pub best: FocusCandidate,
    pub evaluations: usize,
    pub iterations: usize,
    /// False when the evaluation budget ran out before the bracket shrank
    /// to the tolerance.
    pub converged: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct BrentOptimizer {
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub max_evaluations: usize,
}

impl Default for BrentOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE, DEFAULT_BRENT_MAX_EVALUATIONS)
    }
}

impl BrentOptimizer {
    pub fn new(absolute_tolerance: f64, max_evaluations: usize) -> Self {
        Self {
            relative_tolerance: BRENT_RELATIVE_TOLERANCE,
            absolute_tolerance,
            max_evaluations,
        }
    }

    fn validate(&self, lo: f64, hi: f64) -> Result<()> {
        if !(self.absolute_tolerance.is_finite() && self.absolute_tolerance > 0.0) {
            return Err(FocusError::InvalidConfig(format!(
                "Brent tolerance must be > 0, got {}",
                self.absolute_tolerance
            )));
        }
        if self.relative_tolerance.is_nan() || self.relative_tolerance < 2.0 * f64::EPSILON {
            return Err(FocusError::InvalidConfig(format!(
                "Brent relative tolerance too small: {}",
                self.relative_tolerance
            )));
        }
        if self.max_evaluations == 0 {
            return Err(FocusError::InvalidConfig(
                "Brent evaluation budget must be at least 1".into(),
            ));
        }
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(FocusError::InvalidConfig(format!(
                "Brent search interval is empty: [{lo}, {hi}]"
            )));
        }
        Ok(())
    }

    /// Maximize `f` on `[lo, hi]`, starting from the interval midpoint.
    ///
    /// Errors from `f` abort the search unchanged. Running out of
    /// evaluations is not an error: the best point seen so far is returned
    /// with `converged == false`.
    pub fn maximize<F>(&self, lo: f64, hi: f64, mut f: F) -> Result<BrentOutcome>
    where
        F: FnMut(f64) -> Result<f64>,
    {
        self.validate(lo, hi)?;

        let mid = 0.5 * (lo + hi);
        let fmid = -f(mid)?;
        let mut evaluations = 1usize;
        let mut best = (mid, fmid);

        let mut s = OptimizerState {
            a: lo,
            b: hi,
            x: mid,
            w: mid,
            v: mid,
            fx: fmid,
            fw: fmid,
            fv: fmid,
            d: 0.0,
            e: 0.0,
            iterations: 0,
        };

        // The loop ends once the bracket is at most 4 * tol1 wide, so a
        // quarter of the absolute tolerance bounds the final width by it.
        let abs_tol = 0.25 * self.absolute_tolerance;

        let converged = loop {
            let m = 0.5 * (s.a + s.b);
            let tol1 = self.relative_tolerance * s.x.abs() + abs_tol;
            let tol2 = 2.0 * tol1;

            if (s.x - m).abs() <= tol2 - 0.5 * (s.b - s.a) {
                break true;
            }
            if evaluations >= self.max_evaluations {
                break false;
            }

            let mut use_golden = true;
            if s.e.abs() > tol1 {
                // Fit a parabola through x, w, v.
                let mut r = (s.x - s.w) * (s.fx - s.fv);
                let mut q = (s.x - s.v) * (s.fx - s.fw);
                let mut p = (s.x - s.v) * q - (s.x - s.w) * r;
                q = 2.0 * (q - r);
                if q > 0.0 {
                    p = -p;
                } else {
                    q = -q;
                }
                r = s.e;
                s.e = s.d;

                if p > q * (s.a - s.x) && p < q * (s.b - s.x) && p.abs() < (0.5 * q * r).abs() {
                    s.d = p / q;
                    let u = s.x + s.d;
                    // f must not be evaluated too close to the bracket ends.
                    if u - s.a < tol2 || s.b - u < tol2 {
                        s.d = if s.x <= m { tol1 } else { -tol1 };
                    }
                    use_golden = false;
                }
            }
            if use_golden {
                s.e = if s.x < m { s.b - s.x } else { s.a - s.x };
                s.d = GOLDEN_SECTION * s.e;
            }

            // Step at least tol1.
            let u = if s.d.abs() < tol1 {
                if s.d >= 0.0 {
                    s.x + tol1
                } else {
                    s.x - tol1
                }
            } else {
                s.x + s.d
            };

            let fu = -f(u)?;
            evaluations += 1;
            if fu < best.1 {
                best = (u, fu);
            }

            if fu <= s.fx {
                if u < s.x {
                    s.b = s.x;
                } else {
                    s.a = s.x;
                }
                s.v = s.w;
                s.fv = s.fw;
                s.w = s.x;
                s.fw = s.fx;
                s.x = u;
                s.fx = fu;
            } else {
                if u < s.x {
                    s.a = u;
                } else {
                    s.b = u;
                }
                if fu <= s.fw || s.w == s.x {
                    s.v = s.w;
                    s.fv = s.fw;
                    s.w = u;
                    s.fw = fu;
                } else if fu <= s.fv || s.v == s.x || s.v == s.w {
                    s.v = u;
                    s.fv = fu;
                }
            }
            s.iterations += 1;
            debug!(iteration = s.iterations, a = s.a, b = s.b, x = s.x, "Brent step");
        };

        if !converged {
            warn!(
                evaluations,
                bracket_width = s.b - s.a,
                "Brent search hit its evaluation budget before converging"
            );
        }

        Ok(BrentOutcome {
            best: FocusCandidate::new(best.0, -best.1),
            evaluations,
            iterations: s.iterations,
            converged,
        })
    }
}
